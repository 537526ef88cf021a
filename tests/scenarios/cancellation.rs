//! Test: Cancellation - the interrupt flag stops a run between steps

use crate::helpers::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stepwright::core::{ExecutionStatus, Phase, StepStatus, VariableContext};
use stepwright::execution::ExecutionEvent;

const NAV_SUITE: &str = r#"
name: "nav"
cases:
  - name: "walk"
    steps:
      - goto: "https://example.com/one"
      - goto: "https://example.com/two"
      - goto: "https://example.com/three"
  - name: "second walk"
    steps:
      - goto: "https://example.com/four"
"#;

#[tokio::test(start_paused = true)]
async fn test_interrupt_before_start() {
    let harness = Harness::new();
    let (suite, defaults) = load_suite(NAV_SUITE);
    let flag = Arc::new(AtomicBool::new(true));
    let runner = harness.runner(defaults).with_interrupt_flag(flag);

    let result = runner
        .run(&suite.scenario("walk").unwrap(), VariableContext::new())
        .await;

    assert_eq!(result.status, ExecutionStatus::Cancelled);
    assert!(result.failure.is_none());
    assert_eq!(statuses(&result, Phase::Main), vec![StepStatus::NotRun; 3]);
    assert!(harness.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_between_steps() {
    let harness = Harness::new();
    let (suite, defaults) = load_suite(NAV_SUITE);
    let runner = harness.runner(defaults);

    // Interrupt as soon as the first step passes
    let flag = runner.interrupt_flag();
    runner
        .add_event_handler(move |event| {
            if let ExecutionEvent::StepPassed { index: 0, .. } = event {
                flag.store(true, Ordering::SeqCst);
            }
        })
        .await;

    let result = runner.run_suite(&suite, VariableContext::new()).await;

    let walk = &result.scenarios[0];
    assert_eq!(walk.status, ExecutionStatus::Cancelled);
    assert!(walk.failure.is_none());
    assert_eq!(
        statuses(walk, Phase::Main),
        vec![StepStatus::Passed, StepStatus::NotRun, StepStatus::NotRun]
    );

    // Later cases never start either
    assert_eq!(result.scenarios[1].status, ExecutionStatus::Cancelled);
    assert_eq!(harness.calls(), vec!["goto https://example.com/one"]);
}
