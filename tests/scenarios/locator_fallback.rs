//! Test: Locator Fallback - primary first, then every locator in priority order

use crate::helpers::*;
use std::time::Duration;
use stepwright::core::{
    ErrorKind, Locator, Phase, Scenario, Step, StructuralQuery, Target, TextMatcher,
    VariableContext,
};

const SEND_SUITE: &str = r#"
name: "fallback"
cases:
  - name: "send"
    steps:
      - click:
          target: { test_id: "send-button", describe: "Send button" }
"#;

#[tokio::test(start_paused = true)]
async fn test_semantic_fallback_after_probe() {
    let harness = Harness::new();
    harness.resolver.describe("Send button", "ai-send");

    let (suite, defaults) = load_suite(SEND_SUITE);
    let runner = harness.runner(defaults);
    let result = runner
        .run(&suite.scenario("send").unwrap(), VariableContext::new())
        .await;

    assert_completed(&result);
    assert_eq!(harness.calls(), vec!["click ai-send"]);

    // The primary gets the whole probe interval to itself
    let clicked_at = harness.time_of("click ai-send").unwrap();
    assert!(clicked_at >= Duration::from_secs(1), "clicked at {:?}", clicked_at);
    assert!(clicked_at < Duration::from_secs(2), "clicked at {:?}", clicked_at);
}

#[tokio::test(start_paused = true)]
async fn test_primary_wins_within_probe() {
    let harness = Harness::new();
    harness.page.add(
        MockElement::new("send")
            .test_id("send-button")
            .appears_after(Duration::from_millis(500)),
    );
    harness.resolver.describe("Send button", "ai-send");

    let (suite, defaults) = load_suite(SEND_SUITE);
    let runner = harness.runner(defaults);
    let result = runner
        .run(&suite.scenario("send").unwrap(), VariableContext::new())
        .await;

    assert_completed(&result);
    assert_eq!(harness.calls(), vec!["click send"]);
    assert!(harness.time_of("click send").unwrap() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_primary_still_tried_after_probe() {
    let harness = Harness::new();
    harness.page.add(
        MockElement::new("send")
            .test_id("send-button")
            .appears_after(Duration::from_secs(3)),
    );

    let (suite, defaults) = load_suite(SEND_SUITE);
    let runner = harness.runner(defaults);
    let result = runner
        .run(&suite.scenario("send").unwrap(), VariableContext::new())
        .await;

    assert_completed(&result);
    let clicked_at = harness.time_of("click send").unwrap();
    assert!(clicked_at >= Duration::from_secs(3));
    assert!(clicked_at < Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_not_found_names_primary_locator() {
    let yaml = r#"
name: "fallback"
defaults:
  probe_interval_ms: 200
cases:
  - name: "send"
    steps:
      - click:
          target: { test_id: "send-button", describe: "Send button" }
        timeout_ms: 2000
"#;
    let harness = Harness::new();
    let (suite, defaults) = load_suite(yaml);
    let runner = harness.runner(defaults);

    let started = tokio::time::Instant::now();
    let result = runner
        .run(&suite.scenario("send").unwrap(), VariableContext::new())
        .await;

    assert_failed_at(&result, Phase::Main, 0, ErrorKind::ElementNotFound);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2), "gave up after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "gave up after {:?}", elapsed);

    let cause = result.failure.unwrap();
    assert!(cause.message.contains("test-id=\"send-button\""));
    assert!(!cause.message.contains("Send button"));
}

#[tokio::test(start_paused = true)]
async fn test_fallbacks_tried_in_priority_order() {
    let harness = Harness::new();
    harness.page.add(MockElement::new("text-deploy").text("Deploy"));
    harness.resolver.describe("Deploy button", "ai-deploy");

    let target = Target::new(vec![
        Locator::Structural(StructuralQuery::TestId("deploy".to_string())),
        Locator::Structural(StructuralQuery::Text(TextMatcher::exact("Deploy"))),
        Locator::semantic("Deploy button"),
    ])
    .unwrap();
    let scenario = Scenario::new("deploy", vec![Step::click(target)]).unwrap();

    let runner = harness.runner(Default::default());
    let result = runner.run(&scenario, VariableContext::new()).await;

    assert_completed(&result);
    assert_eq!(harness.calls(), vec!["click text-deploy"]);
}

#[tokio::test(start_paused = true)]
async fn test_semantic_only_target_waits_for_visibility() {
    let yaml = r#"
name: "panel"
cases:
  - name: "open panel"
    steps:
      - wait_for_visible: { target: { describe: "Quick call panel" } }
      - click: { target: { describe: "Quick call panel" } }
"#;
    let harness = Harness::new();
    harness.page.add(MockElement::new("panel"));
    harness
        .resolver
        .describe_after("Quick call panel", "panel", Duration::from_secs(2));

    let (suite, defaults) = load_suite(yaml);
    let runner = harness.runner(defaults);
    let result = runner
        .run(&suite.scenario("open panel").unwrap(), VariableContext::new())
        .await;

    assert_completed(&result);
    let clicked_at = harness.time_of("click panel").unwrap();
    assert!(clicked_at >= Duration::from_secs(2));
    assert!(clicked_at < Duration::from_secs(3));
}
