//! Task document and its lifecycle transitions.
//!
//! A [`Task`] only changes its own fields. Anything that spans documents,
//! such as blocking dependents or rolling status up into a build, is driven
//! by the engine services, which re-fetch and persist each document
//! separately.

use super::{
    AbortInfo, Activator, BuildId, Dependency, HostAssignment, ProjectId, Requester,
    TaskDomainError, TaskEndDetail, TaskId, TaskStatus, VersionId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Membership of a task in a task group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskGroupMembership {
    /// Group name, unique within a build.
    pub name: String,
    /// One-based position of the task within the group.
    pub order: u32,
    /// Number of hosts the group may spread over. `1` pins it to one host.
    pub max_hosts: u32,
}

/// Identity shared by every run of the same task across revisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskRunKey {
    /// Owning project.
    pub project_id: ProjectId,
    /// Build variant name.
    pub build_variant: String,
    /// Task display name.
    pub display_name: String,
    /// Requester to match, or `None` for any requester.
    pub requester: Option<Requester>,
}

/// Parameter object for creating a task from a resolved project definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    id: TaskId,
    display_name: String,
    build_variant: String,
    build_id: BuildId,
    version_id: VersionId,
    project_id: ProjectId,
    requester: Requester,
    revision_order_number: u64,
    priority: i64,
    depends_on: Vec<Dependency>,
    override_dependencies: bool,
    activated_by: Option<Activator>,
    execution_tasks: Vec<TaskId>,
    display_only: bool,
    display_task_id: Option<TaskId>,
    task_group: Option<TaskGroupMembership>,
    generated_by: Option<TaskId>,
    generate_task: bool,
    must_have_results: bool,
    is_github_check: bool,
    commit_queue_merge: bool,
}

impl TaskDefinition {
    /// Creates a definition with the placement every task needs.
    #[must_use]
    pub fn new(
        id: TaskId,
        display_name: impl Into<String>,
        build_variant: impl Into<String>,
        version_id: VersionId,
        project_id: ProjectId,
    ) -> Self {
        let variant: String = build_variant.into();
        Self {
            build_id: BuildId::for_variant(&version_id, &variant),
            id,
            display_name: display_name.into(),
            build_variant: variant,
            version_id,
            project_id,
            requester: Requester::Mainline,
            revision_order_number: 0,
            priority: 0,
            depends_on: Vec::new(),
            override_dependencies: false,
            activated_by: None,
            execution_tasks: Vec::new(),
            display_only: false,
            display_task_id: None,
            task_group: None,
            generated_by: None,
            generate_task: false,
            must_have_results: false,
            is_github_check: false,
            commit_queue_merge: false,
        }
    }

    /// Places the task in an explicit build instead of the derived one.
    #[must_use]
    pub fn in_build(mut self, build_id: BuildId) -> Self {
        self.build_id = build_id;
        self
    }

    /// Sets the requester class.
    #[must_use]
    pub const fn with_requester(mut self, requester: Requester) -> Self {
        self.requester = requester;
        self
    }

    /// Sets the project-wide revision order number.
    #[must_use]
    pub const fn with_revision_order_number(mut self, order: u64) -> Self {
        self.revision_order_number = order;
        self
    }

    /// Sets the scheduling priority. Negative priorities disable the task.
    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a dependency edge.
    #[must_use]
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.depends_on.push(dependency);
        self
    }

    /// Makes the task ignore its dependencies when deciding whether it can run.
    #[must_use]
    pub const fn overriding_dependencies(mut self) -> Self {
        self.override_dependencies = true;
        self
    }

    /// Creates the task already activated.
    #[must_use]
    pub fn activated_by(mut self, activator: Activator) -> Self {
        self.activated_by = Some(activator);
        self
    }

    /// Makes the task a display task over the given execution tasks.
    #[must_use]
    pub fn as_display_task(mut self, execution_tasks: impl IntoIterator<Item = TaskId>) -> Self {
        self.display_only = true;
        self.execution_tasks = execution_tasks.into_iter().collect();
        self
    }

    /// Makes the task an execution task of the given display task.
    #[must_use]
    pub fn in_display_task(mut self, display_task_id: TaskId) -> Self {
        self.display_task_id = Some(display_task_id);
        self
    }

    /// Places the task in a task group.
    #[must_use]
    pub fn in_task_group(mut self, name: impl Into<String>, order: u32, max_hosts: u32) -> Self {
        self.task_group = Some(TaskGroupMembership {
            name: name.into(),
            order,
            max_hosts,
        });
        self
    }

    /// Records the generator task that created this task.
    #[must_use]
    pub fn generated_by(mut self, generator: TaskId) -> Self {
        self.generated_by = Some(generator);
        self
    }

    /// Marks the task as a generator of other tasks.
    #[must_use]
    pub const fn generating_tasks(mut self) -> Self {
        self.generate_task = true;
        self
    }

    /// Requires the task to report test results in order to succeed.
    #[must_use]
    pub const fn requiring_results(mut self) -> Self {
        self.must_have_results = true;
        self
    }

    /// Includes the task in the GitHub check status subset.
    #[must_use]
    pub const fn in_github_check(mut self) -> Self {
        self.is_github_check = true;
        self
    }

    /// Marks the task as the commit-queue merge task of its version.
    #[must_use]
    pub const fn as_commit_queue_merge(mut self) -> Self {
        self.commit_queue_merge = true;
        self
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }
}

/// Fields a display task borrows from its execution tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRollup {
    /// Status of the execution task that speaks for the group.
    pub status: TaskStatus,
    /// End details of that execution task.
    pub details: Option<TaskEndDetail>,
    /// Whether any execution task is activated.
    pub activated: bool,
    /// Activation time to record when first activated.
    pub activated_time: Option<DateTime<Utc>>,
    /// Sum of execution time across execution tasks.
    pub time_taken: Duration,
    /// Earliest execution start.
    pub start_time: Option<DateTime<Utc>>,
    /// Latest execution finish, once nothing is left to run.
    pub finish_time: Option<DateTime<Utc>>,
}

/// A unit of work within a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    execution: u32,
    status: TaskStatus,
    details: Option<TaskEndDetail>,
    activated: bool,
    activated_by: Option<Activator>,
    activated_time: Option<DateTime<Utc>>,
    aborted: bool,
    abort_info: Option<AbortInfo>,
    reset_when_finished: bool,
    build_id: BuildId,
    version_id: VersionId,
    project_id: ProjectId,
    build_variant: String,
    display_name: String,
    revision_order_number: u64,
    requester: Requester,
    priority: i64,
    depends_on: Vec<Dependency>,
    override_dependencies: bool,
    display_only: bool,
    execution_tasks: Vec<TaskId>,
    display_task_id: Option<TaskId>,
    task_group: Option<TaskGroupMembership>,
    generated_by: Option<TaskId>,
    generate_task: bool,
    generated_tasks_to_activate: BTreeMap<String, Vec<String>>,
    must_have_results: bool,
    has_test_results: bool,
    has_failed_tests: bool,
    is_github_check: bool,
    commit_queue_merge: bool,
    host: Option<HostAssignment>,
    create_time: DateTime<Utc>,
    dispatch_time: Option<DateTime<Utc>>,
    start_time: Option<DateTime<Utc>>,
    finish_time: Option<DateTime<Utc>>,
    time_taken: Duration,
}

impl Task {
    /// Creates a new, undispatched task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the display name or build variant is
    /// empty, or when the task depends on itself.
    pub fn new(definition: TaskDefinition, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        if definition.display_name.trim().is_empty() {
            return Err(TaskDomainError::EmptyDisplayName);
        }
        if definition.build_variant.trim().is_empty() {
            return Err(TaskDomainError::EmptyBuildVariant);
        }
        if definition
            .depends_on
            .iter()
            .any(|dep| dep.task_id == definition.id)
        {
            return Err(TaskDomainError::SelfDependency(definition.id));
        }

        let now = clock.utc();
        let activated = definition.activated_by.is_some();
        Ok(Self {
            id: definition.id,
            execution: 0,
            status: TaskStatus::Undispatched,
            details: None,
            activated,
            activated_by: definition.activated_by,
            activated_time: activated.then_some(now),
            aborted: false,
            abort_info: None,
            reset_when_finished: false,
            build_id: definition.build_id,
            version_id: definition.version_id,
            project_id: definition.project_id,
            build_variant: definition.build_variant,
            display_name: definition.display_name,
            revision_order_number: definition.revision_order_number,
            requester: definition.requester,
            priority: definition.priority,
            depends_on: definition.depends_on,
            override_dependencies: definition.override_dependencies,
            display_only: definition.display_only,
            execution_tasks: definition.execution_tasks,
            display_task_id: definition.display_task_id,
            task_group: definition.task_group,
            generated_by: definition.generated_by,
            generate_task: definition.generate_task,
            generated_tasks_to_activate: BTreeMap::new(),
            must_have_results: definition.must_have_results,
            has_test_results: false,
            has_failed_tests: false,
            is_github_check: definition.is_github_check,
            commit_queue_merge: definition.commit_queue_merge,
            host: None,
            create_time: now,
            dispatch_time: None,
            start_time: None,
            finish_time: None,
            time_taken: Duration::ZERO,
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the execution number, starting at zero.
    #[must_use]
    pub const fn execution(&self) -> u32 {
        self.execution
    }

    /// Returns the stored status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the end details of the current execution.
    #[must_use]
    pub const fn details(&self) -> Option<&TaskEndDetail> {
        self.details.as_ref()
    }

    /// Returns `true` when the task is scheduled to run.
    #[must_use]
    pub const fn activated(&self) -> bool {
        self.activated
    }

    /// Returns who last changed the activation.
    #[must_use]
    pub const fn activated_by(&self) -> Option<&Activator> {
        self.activated_by.as_ref()
    }

    /// Returns when the task was last activated.
    #[must_use]
    pub const fn activated_time(&self) -> Option<DateTime<Utc>> {
        self.activated_time
    }

    /// Returns `true` once an abort was requested.
    #[must_use]
    pub const fn aborted(&self) -> bool {
        self.aborted
    }

    /// Returns the abort request, if any.
    #[must_use]
    pub const fn abort_info(&self) -> Option<&AbortInfo> {
        self.abort_info.as_ref()
    }

    /// Returns `true` when a reset is deferred until the task finishes.
    #[must_use]
    pub const fn reset_when_finished(&self) -> bool {
        self.reset_when_finished
    }

    /// Returns the owning build.
    #[must_use]
    pub const fn build_id(&self) -> &BuildId {
        &self.build_id
    }

    /// Returns the owning version.
    #[must_use]
    pub const fn version_id(&self) -> &VersionId {
        &self.version_id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Returns the build variant name.
    #[must_use]
    pub fn build_variant(&self) -> &str {
        &self.build_variant
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the project-wide revision order number.
    #[must_use]
    pub const fn revision_order_number(&self) -> u64 {
        self.revision_order_number
    }

    /// Returns the requester class.
    #[must_use]
    pub const fn requester(&self) -> Requester {
        self.requester
    }

    /// Returns the scheduling priority.
    #[must_use]
    pub const fn priority(&self) -> i64 {
        self.priority
    }

    /// Returns the dependency edges.
    #[must_use]
    pub fn depends_on(&self) -> &[Dependency] {
        &self.depends_on
    }

    /// Returns the edge onto `task_id`, if any.
    #[must_use]
    pub fn dependency_on(&self, task_id: &TaskId) -> Option<&Dependency> {
        self.depends_on.iter().find(|dep| &dep.task_id == task_id)
    }

    /// Returns `true` when the task runs regardless of its dependencies.
    #[must_use]
    pub const fn override_dependencies(&self) -> bool {
        self.override_dependencies
    }

    /// Returns `true` for display tasks.
    #[must_use]
    pub const fn display_only(&self) -> bool {
        self.display_only
    }

    /// Returns the execution tasks of a display task.
    #[must_use]
    pub fn execution_tasks(&self) -> &[TaskId] {
        &self.execution_tasks
    }

    /// Returns the display task this execution task rolls into.
    #[must_use]
    pub const fn display_task_id(&self) -> Option<&TaskId> {
        self.display_task_id.as_ref()
    }

    /// Returns the task group membership.
    #[must_use]
    pub const fn task_group(&self) -> Option<&TaskGroupMembership> {
        self.task_group.as_ref()
    }

    /// Returns the generator that created this task.
    #[must_use]
    pub const fn generated_by(&self) -> Option<&TaskId> {
        self.generated_by.as_ref()
    }

    /// Returns `true` for generator tasks.
    #[must_use]
    pub const fn generate_task(&self) -> bool {
        self.generate_task
    }

    /// Returns generated tasks stepback asked this generator to activate,
    /// keyed by build variant.
    #[must_use]
    pub const fn generated_tasks_to_activate(&self) -> &BTreeMap<String, Vec<String>> {
        &self.generated_tasks_to_activate
    }

    /// Returns `true` when success requires recorded test results.
    #[must_use]
    pub const fn must_have_results(&self) -> bool {
        self.must_have_results
    }

    /// Returns `true` once test results were recorded for this execution.
    #[must_use]
    pub const fn has_test_results(&self) -> bool {
        self.has_test_results
    }

    /// Returns `true` when recorded test results include failures.
    #[must_use]
    pub const fn has_failed_tests(&self) -> bool {
        self.has_failed_tests
    }

    /// Returns `true` when the task takes part in the GitHub check status.
    #[must_use]
    pub const fn is_github_check(&self) -> bool {
        self.is_github_check
    }

    /// Returns `true` for the commit-queue merge task of a version.
    #[must_use]
    pub const fn is_commit_queue_merge(&self) -> bool {
        self.commit_queue_merge
    }

    /// Returns the assigned host.
    #[must_use]
    pub const fn host(&self) -> Option<&HostAssignment> {
        self.host.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    /// Returns when the task was dispatched.
    #[must_use]
    pub const fn dispatch_time(&self) -> Option<DateTime<Utc>> {
        self.dispatch_time
    }

    /// Returns when the task started.
    #[must_use]
    pub const fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Returns when the task finished.
    #[must_use]
    pub const fn finish_time(&self) -> Option<DateTime<Utc>> {
        self.finish_time
    }

    /// Returns the execution time of the current execution.
    #[must_use]
    pub const fn time_taken(&self) -> Duration {
        self.time_taken
    }

    /// Returns `true` once the current execution finished.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Returns `true` while an abort can still take effect.
    #[must_use]
    pub const fn is_abortable(&self) -> bool {
        self.status.is_in_progress()
    }

    /// Returns `true` when a dispatcher may hand the task to a host.
    #[must_use]
    pub fn is_dispatchable(&self) -> bool {
        self.status == TaskStatus::Undispatched && self.activated && !self.blocked()
    }

    /// Returns `true` when an unattainable edge keeps the task from running.
    #[must_use]
    pub fn blocked(&self) -> bool {
        !self.override_dependencies && self.depends_on.iter().any(|dep| dep.unattainable)
    }

    /// Returns `true` for execution tasks of a display task.
    #[must_use]
    pub const fn is_part_of_display(&self) -> bool {
        self.display_task_id.is_some()
    }

    /// Returns `true` for members of a group pinned to one host.
    #[must_use]
    pub fn is_part_of_single_host_task_group(&self) -> bool {
        self.task_group
            .as_ref()
            .is_some_and(|group| group.max_hosts == 1)
    }

    /// Returns the task group name, if any.
    #[must_use]
    pub fn task_group_name(&self) -> Option<&str> {
        self.task_group.as_ref().map(|group| group.name.as_str())
    }

    /// Returns the key shared with other runs of this task.
    #[must_use]
    pub fn run_key(&self) -> TaskRunKey {
        TaskRunKey {
            project_id: self.project_id.clone(),
            build_variant: self.build_variant.clone(),
            display_name: self.display_name.clone(),
            requester: Some(self.requester),
        }
    }

    /// Records dispatch to a host.
    pub fn mark_dispatched(&mut self, host: HostAssignment, clock: &impl Clock) {
        self.status = TaskStatus::Dispatched;
        self.host = Some(host);
        self.dispatch_time = Some(clock.utc());
    }

    /// Returns a dispatched task to the queue.
    pub fn mark_undispatched(&mut self) {
        self.status = TaskStatus::Undispatched;
        self.host = None;
        self.dispatch_time = None;
    }

    /// Records the start of execution.
    pub const fn mark_start(&mut self, start_time: DateTime<Utc>) {
        self.status = TaskStatus::Started;
        self.start_time = Some(start_time);
    }

    /// Records the end of execution.
    pub fn mark_end(&mut self, finish_time: DateTime<Utc>, detail: TaskEndDetail) {
        self.status = detail.status();
        self.details = Some(detail);
        self.finish_time = Some(finish_time);
        self.time_taken = self
            .start_time
            .and_then(|start| (finish_time - start).to_std().ok())
            .unwrap_or_default();
    }

    /// Schedules the task.
    pub fn activate(&mut self, by: Activator, clock: &impl Clock) {
        if !self.activated {
            self.activated_time = Some(clock.utc());
        }
        self.activated = true;
        self.activated_by = Some(by);
    }

    /// Unschedules the task.
    pub fn deactivate(&mut self, by: Activator) {
        self.activated = false;
        self.activated_by = Some(by);
    }

    /// Records an abort request.
    pub fn set_aborted(&mut self, info: AbortInfo) {
        self.aborted = true;
        self.abort_info = Some(info);
    }

    /// Defers a reset until the task, or its group, finishes.
    pub const fn set_reset_when_finished(&mut self) {
        self.reset_when_finished = true;
    }

    /// Disables the task so no scheduler picks it up again.
    pub fn set_disabled_priority(&mut self, by: Activator) {
        self.priority = -1;
        self.deactivate(by);
    }

    /// Records a summary of uploaded test results.
    pub const fn record_test_results(&mut self, any_failed: bool) {
        self.has_test_results = true;
        self.has_failed_tests = any_failed;
    }

    /// Asks a generator to activate one of its generated tasks when it runs.
    pub fn set_generated_task_to_activate(
        &mut self,
        build_variant: impl Into<String>,
        display_name: impl Into<String>,
    ) {
        let names = self
            .generated_tasks_to_activate
            .entry(build_variant.into())
            .or_default();
        let name: String = display_name.into();
        if !names.contains(&name) {
            names.push(name);
        }
    }

    /// Starts a fresh execution.
    ///
    /// The execution number is incremented and every per-execution field is
    /// cleared. Dependency edges are left to the engine, which re-opens them
    /// across documents.
    pub fn reset(&mut self, clock: &impl Clock) {
        self.execution = self.execution.saturating_add(1);
        self.status = TaskStatus::Undispatched;
        self.details = None;
        self.aborted = false;
        self.abort_info = None;
        self.reset_when_finished = false;
        self.has_test_results = false;
        self.has_failed_tests = false;
        self.host = None;
        self.dispatch_time = None;
        self.start_time = None;
        self.finish_time = None;
        self.time_taken = Duration::ZERO;
        self.activated = true;
        self.activated_time = Some(clock.utc());
    }

    /// Sets the unattainable flag on the edge onto `dependency_id`.
    ///
    /// Returns `true` when the flag changed.
    pub fn mark_dependency_unattainable(&mut self, dependency_id: &TaskId, unattainable: bool) -> bool {
        let mut changed = false;
        for dep in self
            .depends_on
            .iter_mut()
            .filter(|dep| &dep.task_id == dependency_id)
        {
            changed |= dep.unattainable != unattainable;
            dep.unattainable = unattainable;
        }
        changed
    }

    /// Sets the cached finished flag on the edge onto `dependency_id`.
    ///
    /// Returns `true` when the flag changed.
    pub fn mark_dependency_finished(&mut self, dependency_id: &TaskId, finished: bool) -> bool {
        let mut changed = false;
        for dep in self
            .depends_on
            .iter_mut()
            .filter(|dep| &dep.task_id == dependency_id)
        {
            changed |= dep.finished != finished;
            dep.finished = finished;
        }
        changed
    }

    /// Adds a dependency edge unless one onto the same task exists.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::SelfDependency`] when the edge points at
    /// the task itself.
    pub fn add_dependency(&mut self, dependency: Dependency) -> Result<(), TaskDomainError> {
        if dependency.task_id == self.id {
            return Err(TaskDomainError::SelfDependency(self.id.clone()));
        }
        if self.dependency_on(&dependency.task_id).is_none() {
            self.depends_on.push(dependency);
        }
        Ok(())
    }

    /// Removes the dependency edge onto `dependency_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::MissingDependency`] when no such edge
    /// exists.
    pub fn remove_dependency(&mut self, dependency_id: &TaskId) -> Result<(), TaskDomainError> {
        let before = self.depends_on.len();
        self.depends_on.retain(|dep| &dep.task_id != dependency_id);
        if self.depends_on.len() == before {
            return Err(TaskDomainError::MissingDependency {
                task_id: self.id.clone(),
                dependency_id: dependency_id.clone(),
            });
        }
        Ok(())
    }

    /// Applies the aggregate borrowed from execution tasks to a display task.
    pub(crate) fn apply_display_rollup(&mut self, rollup: DisplayRollup) {
        self.status = rollup.status;
        self.details = rollup.details;
        self.activated = rollup.activated;
        if self.activated_time.is_none() {
            self.activated_time = rollup.activated_time;
        }
        self.time_taken = rollup.time_taken;
        if rollup.start_time.is_some() {
            self.start_time = rollup.start_time;
        }
        if rollup.finish_time.is_some() {
            self.finish_time = rollup.finish_time;
        }
    }
}
