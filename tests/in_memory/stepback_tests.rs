//! Integration tests for stepback across revisions.

use super::helpers::{Scenario, mainline, task_id};
use buildgraph::project::domain::{ProjectPolicy, TaskUnitDefinition};
use buildgraph::task::domain::{Activator, TaskEndDetail};
use rstest::{fixture, rstest};

#[fixture]
fn stepping_back() -> Scenario {
    Scenario::with_policy(ProjectPolicy::with_stepback(true))
}

fn unit_tests() -> Vec<TaskUnitDefinition> {
    vec![TaskUnitDefinition::new("unit")]
}

/// Revisions 1 to 4: 1 passed, 2 never ran and 4 is about to fail.
async fn revisions(scenario: &Scenario, third_ran: bool) -> eyre::Result<()> {
    scenario.create(&mainline("rev1", 1, unit_tests()).activated()).await?;
    scenario
        .run(&task_id("rev1", "unit"), TaskEndDetail::succeeded())
        .await?;
    scenario.create(&mainline("rev2", 2, unit_tests())).await?;
    if third_ran {
        scenario.create(&mainline("rev3", 3, unit_tests()).activated()).await?;
        scenario
            .run(&task_id("rev3", "unit"), TaskEndDetail::succeeded())
            .await?;
    } else {
        scenario.create(&mainline("rev3", 3, unit_tests())).await?;
    }
    scenario.create(&mainline("rev4", 4, unit_tests()).activated()).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failure_steps_back_to_the_adjacent_revision(stepping_back: Scenario) -> eyre::Result<()> {
    revisions(&stepping_back, false).await?;

    stepping_back
        .run(&task_id("rev4", "unit"), TaskEndDetail::failed())
        .await?;

    let third = stepping_back.task(&task_id("rev3", "unit")).await?;
    assert!(third.activated());
    assert_eq!(third.activated_by(), Some(&Activator::Stepback));
    assert!(!stepping_back.task(&task_id("rev2", "unit")).await?.activated());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stepback_never_skips_past_the_adjacent_revision(
    stepping_back: Scenario,
) -> eyre::Result<()> {
    revisions(&stepping_back, true).await?;

    stepping_back
        .run(&task_id("rev4", "unit"), TaskEndDetail::failed())
        .await?;

    assert!(!stepping_back.task(&task_id("rev2", "unit")).await?.activated());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stepped_back_failures_keep_bisecting(stepping_back: Scenario) -> eyre::Result<()> {
    revisions(&stepping_back, false).await?;
    stepping_back
        .run(&task_id("rev4", "unit"), TaskEndDetail::failed())
        .await?;

    stepping_back
        .run(&task_id("rev3", "unit"), TaskEndDetail::failed())
        .await?;

    let second = stepping_back.task(&task_id("rev2", "unit")).await?;
    assert!(second.activated());
    assert_eq!(second.activated_by(), Some(&Activator::Stepback));
    Ok(())
}
