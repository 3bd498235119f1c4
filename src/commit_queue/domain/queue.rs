//! The ordered queue document.

use super::{CommitQueueDomainError, CommitQueueItem};
use crate::task::domain::{ProjectId, VersionId};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A project's ordered merge queue.
///
/// Items with a version assigned ("processing") always form a contiguous
/// prefix of the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitQueue {
    project_id: ProjectId,
    queue: Vec<CommitQueueItem>,
}

impl CommitQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            queue: Vec::new(),
        }
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Returns the queued items in merge order.
    #[must_use]
    pub fn items(&self) -> &[CommitQueueItem] {
        &self.queue
    }

    /// Returns the number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Appends an item to the tail.
    ///
    /// # Errors
    ///
    /// Returns [`CommitQueueDomainError::DuplicateItem`] with the existing
    /// position when the issue is already queued.
    ///
    /// # Examples
    ///
    /// ```
    /// use buildgraph::commit_queue::domain::{CommitQueue, CommitQueueItem, ItemSource};
    /// use buildgraph::task::domain::ProjectId;
    /// use mockable::DefaultClock;
    ///
    /// let mut queue = CommitQueue::new(ProjectId::new("proj"));
    /// let item = CommitQueueItem::new("123", ItemSource::PullRequest);
    /// assert_eq!(queue.enqueue(item.clone(), &DefaultClock), Ok(0));
    ///
    /// let err = queue.enqueue(item, &DefaultClock).unwrap_err();
    /// assert_eq!(err.existing_position(), Some(0));
    /// assert_eq!(err.to_string(), "item already in queue");
    /// ```
    pub fn enqueue(
        &mut self,
        mut item: CommitQueueItem,
        clock: &impl Clock,
    ) -> Result<usize, CommitQueueDomainError> {
        self.reject_duplicate(&item)?;
        item.stamp_enqueued(clock.utc());
        self.queue.push(item);
        Ok(self.queue.len().saturating_sub(1))
    }

    /// Inserts an item directly after the processing prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CommitQueueDomainError::DuplicateItem`] when the issue is
    /// already queued.
    pub fn enqueue_at_front(
        &mut self,
        mut item: CommitQueueItem,
        clock: &impl Clock,
    ) -> Result<usize, CommitQueueDomainError> {
        self.reject_duplicate(&item)?;
        let position = self.processing_len();
        item.stamp_enqueued(clock.utc());
        self.queue.insert(position, item);
        Ok(position)
    }

    /// Returns the position of the item named by issue, version or patch id.
    #[must_use]
    pub fn find_item(&self, id: &str) -> Option<usize> {
        self.queue.iter().position(|item| item.matches(id))
    }

    /// Returns the item named by issue, version or patch id.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&CommitQueueItem> {
        self.queue.iter().find(|item| item.matches(id))
    }

    /// Returns the head of the queue.
    #[must_use]
    pub fn next(&self) -> Option<&CommitQueueItem> {
        self.queue.first()
    }

    /// Returns the unprocessed items among the first `n`.
    #[must_use]
    pub fn next_unprocessed(&self, n: usize) -> Vec<&CommitQueueItem> {
        self.queue
            .iter()
            .take(n)
            .filter(|item| !item.is_processing())
            .collect()
    }

    /// Returns `true` when any item is processing.
    #[must_use]
    pub fn processing(&self) -> bool {
        self.queue.iter().any(CommitQueueItem::is_processing)
    }

    /// Returns the processing prefix.
    #[must_use]
    pub fn processing_items(&self) -> &[CommitQueueItem] {
        self.queue.get(..self.processing_len()).unwrap_or_default()
    }

    /// Removes the item named by issue, version or patch id.
    ///
    /// Returns `None` when nothing matched.
    pub fn remove(&mut self, id: &str) -> Option<CommitQueueItem> {
        let position = self.find_item(id)?;
        Some(self.queue.remove(position))
    }

    /// Moves an item into processing by assigning its merge-test version.
    ///
    /// # Errors
    ///
    /// Returns [`CommitQueueDomainError::ItemNotFound`] when nothing matches
    /// `issue`, or [`CommitQueueDomainError::OutOfOrderProcessing`] when an
    /// earlier item is still unprocessed.
    pub fn update_version(
        &mut self,
        issue: &str,
        version: VersionId,
        clock: &impl Clock,
    ) -> Result<(), CommitQueueDomainError> {
        let position = self
            .find_item(issue)
            .ok_or_else(|| CommitQueueDomainError::ItemNotFound(issue.to_owned()))?;
        if let Some(blocking) = self
            .queue
            .iter()
            .take(position)
            .find(|item| !item.is_processing())
        {
            return Err(CommitQueueDomainError::OutOfOrderProcessing {
                issue: issue.to_owned(),
                blocking: blocking.issue().to_owned(),
            });
        }
        let now = clock.utc();
        if let Some(item) = self.queue.get_mut(position) {
            item.start_processing(version, now);
        }
        Ok(())
    }

    fn processing_len(&self) -> usize {
        self.queue
            .iter()
            .take_while(|item| item.is_processing())
            .count()
    }

    fn reject_duplicate(&self, item: &CommitQueueItem) -> Result<(), CommitQueueDomainError> {
        match self.find_item(item.issue()) {
            Some(position) => Err(CommitQueueDomainError::DuplicateItem {
                issue: item.issue().to_owned(),
                position,
            }),
            None => Ok(()),
        }
    }
}
