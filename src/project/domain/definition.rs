//! The resolved task graph of a new version.
//!
//! Definitions arrive cycle-free from the project loader. Each task is named
//! by its TV-pair (task name, build variant name); dependency edges name
//! their target the same way.

use super::ProjectDefinitionError;
use crate::task::domain::{ProjectId, RequiredStatus, Requester, TaskId, VersionId};
use std::collections::HashSet;

/// A dependency edge onto another TV-pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDefinition {
    /// Target task name.
    pub task: String,
    /// Target build variant, or `None` for the dependent's own variant.
    pub variant: Option<String>,
    /// Status the target must finish with.
    pub status: RequiredStatus,
}

impl EdgeDefinition {
    /// Creates an edge requiring success of `task` in the same variant.
    #[must_use]
    pub fn on(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            variant: None,
            status: RequiredStatus::Succeeded,
        }
    }

    /// Targets another build variant.
    #[must_use]
    pub fn in_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Sets the required status.
    #[must_use]
    pub const fn with_status(mut self, status: RequiredStatus) -> Self {
        self.status = status;
        self
    }
}

/// One task within a build variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUnitDefinition {
    /// Task display name.
    pub name: String,
    /// Resolved dependency edges.
    pub depends_on: Vec<EdgeDefinition>,
    /// Scheduling priority.
    pub priority: i64,
    /// Success requires recorded test results.
    pub must_have_results: bool,
    /// Part of the GitHub check subset.
    pub github_check: bool,
    /// The commit-queue merge task.
    pub commit_queue_merge: bool,
    /// Generates further tasks when it runs.
    pub generate_task: bool,
}

impl TaskUnitDefinition {
    /// Creates a task with no edges.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            priority: 0,
            must_have_results: false,
            github_check: false,
            commit_queue_merge: false,
            generate_task: false,
        }
    }

    /// Adds a dependency edge.
    #[must_use]
    pub fn depending_on(mut self, edge: EdgeDefinition) -> Self {
        self.depends_on.push(edge);
        self
    }

    /// Sets the scheduling priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Requires recorded test results.
    #[must_use]
    pub const fn requiring_results(mut self) -> Self {
        self.must_have_results = true;
        self
    }

    /// Includes the task in the GitHub check subset.
    #[must_use]
    pub const fn in_github_check(mut self) -> Self {
        self.github_check = true;
        self
    }

    /// Marks the task as the commit-queue merge task.
    #[must_use]
    pub const fn as_commit_queue_merge(mut self) -> Self {
        self.commit_queue_merge = true;
        self
    }

    /// Marks the task as a generator.
    #[must_use]
    pub const fn generating_tasks(mut self) -> Self {
        self.generate_task = true;
        self
    }
}

/// A display task grouping execution tasks of the same variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTaskDefinition {
    /// Display task name.
    pub name: String,
    /// Names of the execution tasks.
    pub execution_tasks: Vec<String>,
}

/// A task group within a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGroupDefinition {
    /// Group name.
    pub name: String,
    /// Number of hosts the group may use. `1` pins it to one host.
    pub max_hosts: u32,
    /// Member task names in group order.
    pub tasks: Vec<String>,
}

/// One build variant of a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDefinition {
    /// Build variant name.
    pub name: String,
    /// Part of the GitHub check subset.
    pub github_check: bool,
    /// Tasks in the variant.
    pub tasks: Vec<TaskUnitDefinition>,
    /// Display tasks over the variant's tasks.
    pub display_tasks: Vec<DisplayTaskDefinition>,
    /// Task groups over the variant's tasks.
    pub task_groups: Vec<TaskGroupDefinition>,
}

impl VariantDefinition {
    /// Creates an empty variant.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            github_check: false,
            tasks: Vec::new(),
            display_tasks: Vec::new(),
            task_groups: Vec::new(),
        }
    }

    /// Includes the variant in the GitHub check subset.
    #[must_use]
    pub const fn in_github_check(mut self) -> Self {
        self.github_check = true;
        self
    }

    /// Adds a task.
    #[must_use]
    pub fn with_task(mut self, task: TaskUnitDefinition) -> Self {
        self.tasks.push(task);
        self
    }

    /// Adds a display task.
    #[must_use]
    pub fn with_display_task(
        mut self,
        name: impl Into<String>,
        execution_tasks: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.display_tasks.push(DisplayTaskDefinition {
            name: name.into(),
            execution_tasks: execution_tasks.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Adds a task group.
    #[must_use]
    pub fn with_task_group(
        mut self,
        name: impl Into<String>,
        max_hosts: u32,
        tasks: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.task_groups.push(TaskGroupDefinition {
            name: name.into(),
            max_hosts,
            tasks: tasks.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Returns the display task that owns `task`, if any.
    #[must_use]
    pub fn display_task_of(&self, task: &str) -> Option<&DisplayTaskDefinition> {
        self.display_tasks
            .iter()
            .find(|display| display.execution_tasks.iter().any(|name| name == task))
    }

    /// Returns the task group containing `task` and its one-based order.
    #[must_use]
    pub fn task_group_of(&self, task: &str) -> Option<(&TaskGroupDefinition, u32)> {
        self.task_groups.iter().find_map(|group| {
            group
                .tasks
                .iter()
                .position(|name| name == task)
                .and_then(|index| u32::try_from(index).ok())
                .map(|index| (group, index.saturating_add(1)))
        })
    }
}

/// A new version and its resolved task graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDefinition {
    /// Version identifier.
    pub version_id: VersionId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Requester class.
    pub requester: Requester,
    /// Project-wide revision order number.
    pub revision_order_number: u64,
    /// Whether tasks start activated.
    pub activate: bool,
    /// Whether the patch merges a pull request through the commit queue.
    pub pr_merge: bool,
    /// Build variants.
    pub variants: Vec<VariantDefinition>,
}

impl VersionDefinition {
    /// Creates an empty definition.
    #[must_use]
    pub const fn new(
        version_id: VersionId,
        project_id: ProjectId,
        requester: Requester,
        revision_order_number: u64,
    ) -> Self {
        Self {
            version_id,
            project_id,
            requester,
            revision_order_number,
            activate: false,
            pr_merge: false,
            variants: Vec::new(),
        }
    }

    /// Creates tasks already activated.
    #[must_use]
    pub const fn activated(mut self) -> Self {
        self.activate = true;
        self
    }

    /// Marks the patch as a pull request merge.
    #[must_use]
    pub const fn as_pr_merge(mut self) -> Self {
        self.pr_merge = true;
        self
    }

    /// Adds a build variant.
    #[must_use]
    pub fn with_variant(mut self, variant: VariantDefinition) -> Self {
        self.variants.push(variant);
        self
    }

    /// Returns the identifier of the task for a TV-pair in this version.
    #[must_use]
    pub fn task_id(&self, variant: &str, task: &str) -> TaskId {
        TaskId::new(format!("{}_{variant}_{task}", self.version_id))
    }

    /// Checks that every edge, display task and group names a task of the
    /// version.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDefinitionError`] for the first dangling reference or
    /// duplicated task.
    pub fn validate(&self) -> Result<(), ProjectDefinitionError> {
        let mut known = HashSet::new();
        for variant in &self.variants {
            for task in &variant.tasks {
                if !known.insert((variant.name.as_str(), task.name.as_str())) {
                    return Err(ProjectDefinitionError::DuplicateTask {
                        variant: variant.name.clone(),
                        task: task.name.clone(),
                    });
                }
            }
        }

        for variant in &self.variants {
            for task in &variant.tasks {
                for edge in &task.depends_on {
                    let target_variant = edge.variant.as_deref().unwrap_or(&variant.name);
                    if !known.contains(&(target_variant, edge.task.as_str())) {
                        return Err(ProjectDefinitionError::UnknownDependency {
                            variant: variant.name.clone(),
                            task: task.name.clone(),
                            target_variant: target_variant.to_owned(),
                            target: edge.task.clone(),
                        });
                    }
                }
            }
            let members = variant
                .display_tasks
                .iter()
                .flat_map(|display| {
                    display
                        .execution_tasks
                        .iter()
                        .map(move |name| (display.name.as_str(), name))
                })
                .chain(variant.task_groups.iter().flat_map(|group| {
                    group.tasks.iter().map(move |name| (group.name.as_str(), name))
                }));
            for (owner, name) in members {
                if !known.contains(&(variant.name.as_str(), name.as_str())) {
                    return Err(ProjectDefinitionError::UnknownMember {
                        variant: variant.name.clone(),
                        owner: owner.to_owned(),
                        task: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
