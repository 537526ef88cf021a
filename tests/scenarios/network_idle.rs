//! Test: Network Idle - post-step waits degrade to warnings

use crate::helpers::*;
use std::time::Duration;
use stepwright::core::{Phase, StepStatus, StepWarning, VariableContext};
use stepwright::execution::ExecutionEvent;

const SEARCH_SUITE: &str = r#"
name: "idle"
cases:
  - name: "search"
    steps:
      - set_value:
          target: { role: textbox, name: "Search" }
          value: "pricing"
        wait_network_idle_after_step: true
      - click:
          target: { role: button, name: "Go" }
"#;

fn search_harness() -> Harness {
    let harness = Harness::new();
    harness.page.add(MockElement::new("search").role("textbox", "Search"));
    harness.page.add(MockElement::new("go").role("button", "Go"));
    harness
}

#[tokio::test(start_paused = true)]
async fn test_busy_network_warns_and_continues() {
    let harness = search_harness();
    harness.page.never_idle();

    let (suite, defaults) = load_suite(SEARCH_SUITE);
    let runner = harness.runner(defaults);
    let events = capture_events(&runner).await;

    let result = runner
        .run(&suite.scenario("search").unwrap(), VariableContext::new())
        .await;

    assert_completed(&result);
    assert_eq!(
        statuses(&result, Phase::Main),
        vec![StepStatus::Passed, StepStatus::Passed]
    );
    assert_eq!(
        result.steps[0].warnings,
        vec![StepWarning::NetworkIdleTimeout { waited_ms: 5000 }]
    );
    assert!(result.steps[1].warnings.is_empty());

    // The click only happens once the idle ceiling has passed
    assert_eq!(harness.time_of("click go"), Some(Duration::from_secs(5)));

    let warned = events
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, ExecutionEvent::StepWarning { index: 0, .. }));
    assert!(warned);
}

#[tokio::test(start_paused = true)]
async fn test_settling_network_is_awaited() {
    let harness = search_harness();
    harness.page.busy_for(Duration::from_secs(1));

    let (suite, defaults) = load_suite(SEARCH_SUITE);
    let runner = harness.runner(defaults);
    let result = runner
        .run(&suite.scenario("search").unwrap(), VariableContext::new())
        .await;

    assert_completed(&result);
    assert!(result.warnings().is_empty());
    assert_eq!(
        harness.calls(),
        vec!["set_value search pricing", "network idle", "click go"]
    );
    // 1s of traffic plus the default 500ms quiet window
    assert_eq!(harness.time_of("click go"), Some(Duration::from_millis(1500)));
}

#[tokio::test(start_paused = true)]
async fn test_explicit_idle_step_ceiling() {
    let yaml = r#"
name: "idle"
defaults:
  network_idle_timeout_ms: 1000
cases:
  - name: "load"
    steps:
      - goto: "https://example.com/"
      - wait_for_network_idle: {}
      - wait_for_network_idle: { timeout_ms: 2000 }
      - goto: "https://example.com/done"
"#;
    let harness = Harness::new();
    harness.page.never_idle();

    let (suite, defaults) = load_suite(yaml);
    let runner = harness.runner(defaults);
    let result = runner
        .run(&suite.scenario("load").unwrap(), VariableContext::new())
        .await;

    assert_completed(&result);
    assert_eq!(
        result.steps[1].warnings,
        vec![StepWarning::NetworkIdleTimeout { waited_ms: 1000 }]
    );
    assert_eq!(
        result.steps[2].warnings,
        vec![StepWarning::NetworkIdleTimeout { waited_ms: 2000 }]
    );
    assert_eq!(
        harness.time_of("goto https://example.com/done"),
        Some(Duration::from_secs(3))
    );
}
