//! Materialising a version from its resolved definition.

use crate::engine::{EngineResult, TaskGraphEngine};
use crate::project::domain::{VariantDefinition, VersionDefinition};
use crate::rollup::domain::{Build, Patch, Version};
use crate::task::domain::{Activator, Dependency, Task, TaskDefinition};
use mockable::Clock;
use tracing::info;

impl<C> TaskGraphEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Stores the version, its patch, its builds and its tasks.
    ///
    /// A patch document is created for patch requesters only. Tasks are
    /// created activated by the system when the definition asks for it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::engine::EngineError::Definition`] when the definition
    /// references unknown tasks, or a store error.
    pub async fn create_version(&self, definition: &VersionDefinition) -> EngineResult<Version> {
        definition.validate()?;

        let mut version = Version::new(
            definition.version_id.clone(),
            definition.project_id.clone(),
            definition.requester,
            definition.revision_order_number,
            &*self.clock,
        );
        version.set_activated(definition.activate);
        self.stores.versions.store(&version).await?;

        if definition.requester.is_patch() {
            let mut patch = Patch::new(
                definition.version_id.clone(),
                definition.project_id.clone(),
            );
            if definition.pr_merge {
                patch = patch.as_pr_merge();
            }
            patch.set_activated(definition.activate);
            self.stores.patches.store(&patch).await?;
        }

        let mut task_count = 0_usize;
        for variant in &definition.variants {
            let mut build = Build::new(
                definition.version_id.clone(),
                variant.name.as_str(),
                definition.activate,
                &*self.clock,
            );
            if variant.github_check {
                build = build.with_github_check();
            }
            self.stores.builds.store(&build).await?;

            for task in self.variant_tasks(definition, variant)? {
                self.stores.tasks.store(&task).await?;
                task_count = task_count.saturating_add(1);
            }
        }

        info!(
            version_id = %version.id(),
            project_id = %version.project_id(),
            requester = %version.requester(),
            builds = definition.variants.len(),
            tasks = task_count,
            "created version"
        );
        Ok(version)
    }

    fn variant_tasks(
        &self,
        definition: &VersionDefinition,
        variant: &VariantDefinition,
    ) -> EngineResult<Vec<Task>> {
        let mut tasks = Vec::with_capacity(
            variant
                .tasks
                .len()
                .saturating_add(variant.display_tasks.len()),
        );

        for unit in &variant.tasks {
            let mut task_definition = TaskDefinition::new(
                definition.task_id(&variant.name, &unit.name),
                unit.name.as_str(),
                variant.name.as_str(),
                definition.version_id.clone(),
                definition.project_id.clone(),
            )
            .with_requester(definition.requester)
            .with_revision_order_number(definition.revision_order_number)
            .with_priority(unit.priority);

            for edge in &unit.depends_on {
                let target_variant = edge.variant.as_deref().unwrap_or(&variant.name);
                task_definition = task_definition.with_dependency(Dependency::new(
                    definition.task_id(target_variant, &edge.task),
                    edge.status,
                ));
            }
            if let Some(display) = variant.display_task_of(&unit.name) {
                task_definition = task_definition
                    .in_display_task(definition.task_id(&variant.name, &display.name));
            }
            if let Some((group, order)) = variant.task_group_of(&unit.name) {
                task_definition =
                    task_definition.in_task_group(group.name.as_str(), order, group.max_hosts);
            }
            if unit.must_have_results {
                task_definition = task_definition.requiring_results();
            }
            if unit.github_check || variant.github_check {
                task_definition = task_definition.in_github_check();
            }
            if unit.commit_queue_merge {
                task_definition = task_definition.as_commit_queue_merge();
            }
            if unit.generate_task {
                task_definition = task_definition.generating_tasks();
            }
            if definition.activate {
                task_definition = task_definition.activated_by(Activator::System);
            }
            tasks.push(Task::new(task_definition, &*self.clock)?);
        }

        for display in &variant.display_tasks {
            let mut display_definition = TaskDefinition::new(
                definition.task_id(&variant.name, &display.name),
                display.name.as_str(),
                variant.name.as_str(),
                definition.version_id.clone(),
                definition.project_id.clone(),
            )
            .with_requester(definition.requester)
            .with_revision_order_number(definition.revision_order_number)
            .as_display_task(
                display
                    .execution_tasks
                    .iter()
                    .map(|name| definition.task_id(&variant.name, name)),
            );
            if definition.activate {
                display_definition = display_definition.activated_by(Activator::System);
            }
            tasks.push(Task::new(display_definition, &*self.clock)?);
        }
        Ok(tasks)
    }
}
