//! Test: Timeouts - per-step overrides and the default budget

use crate::helpers::*;
use std::time::Duration;
use stepwright::core::{ErrorKind, Phase, StepStatus, VariableContext};
use tokio::time::Instant;

/// A never-appearing target with a 500000ms budget times out only after
/// the full budget
#[tokio::test(start_paused = true)]
async fn test_wait_for_visible_long_timeout() {
    let yaml = r#"
name: "slow"
cases:
  - name: "quick call"
    steps:
      - wait_for_visible: { target: { describe: "Quick call panel" } }
        timeout_ms: 500000
      - click: { target: { describe: "Quick call panel" } }
"#;
    let harness = Harness::new();
    let (suite, defaults) = load_suite(yaml);
    let runner = harness.runner(defaults);

    let started = Instant::now();
    let result = runner
        .run(&suite.scenario("quick call").unwrap(), VariableContext::new())
        .await;
    let elapsed = started.elapsed();

    assert_failed_at(&result, Phase::Main, 0, ErrorKind::Timeout);
    assert_eq!(
        statuses(&result, Phase::Main),
        vec![StepStatus::TimedOut, StepStatus::NotRun]
    );
    assert!(elapsed >= Duration::from_millis(500_000), "timed out after {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(501_000), "timed out after {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_hidden_element_times_out() {
    let yaml = r#"
name: "hidden"
cases:
  - name: "banner"
    steps:
      - wait_for_visible: { target: { test_id: "banner" } }
        timeout_ms: 3000
"#;
    let harness = Harness::new();
    harness
        .page
        .add(MockElement::new("banner").test_id("banner").hidden());

    let (suite, defaults) = load_suite(yaml);
    let runner = harness.runner(defaults);

    let started = Instant::now();
    let result = runner
        .run(&suite.scenario("banner").unwrap(), VariableContext::new())
        .await;

    assert_failed_at(&result, Phase::Main, 0, ErrorKind::Timeout);
    assert!(started.elapsed() >= Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_step_timeout_overrides_default() {
    let yaml = r##"
name: "override"
defaults:
  timeout_ms: 60000
cases:
  - name: "click"
    steps:
      - click: { target: { css: "#missing" } }
        timeout_ms: 2000
"##;
    let harness = Harness::new();
    harness.page.add(MockElement::new("present").css("#present"));
    let (suite, defaults) = load_suite(yaml);
    let runner = harness.runner(defaults);

    let started = Instant::now();
    let result = runner
        .run(&suite.scenario("click").unwrap(), VariableContext::new())
        .await;

    assert_failed_at(&result, Phase::Main, 0, ErrorKind::ElementNotFound);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_condition() {
    let yaml = r#"
name: "conditions"
cases:
  - name: "reply"
    steps:
      - wait_for: "The assistant has replied"
      - wait_for: "A chart is rendered"
        timeout_ms: 4000
"#;
    let harness = Harness::new();
    harness.resolver.satisfy("The assistant has replied");

    let (suite, defaults) = load_suite(yaml);
    let runner = harness.runner(defaults);

    let started = Instant::now();
    let result = runner
        .run(&suite.scenario("reply").unwrap(), VariableContext::new())
        .await;

    assert_failed_at(&result, Phase::Main, 1, ErrorKind::Timeout);
    assert_eq!(
        harness.time_of("wait_for The assistant has replied"),
        Some(Duration::ZERO)
    );
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(4));
    assert!(elapsed < Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_pause_waits_exactly() {
    let yaml = r#"
name: "pause"
cases:
  - name: "wait"
    steps:
      - goto: "https://example.com/"
      - pause: 1500
      - goto: "https://example.com/after"
"#;
    let harness = Harness::new();
    let (suite, defaults) = load_suite(yaml);
    let runner = harness.runner(defaults);
    let result = runner
        .run(&suite.scenario("wait").unwrap(), VariableContext::new())
        .await;

    assert_completed(&result);
    assert_eq!(
        harness.time_of("goto https://example.com/after"),
        Some(Duration::from_millis(1500))
    );
}
