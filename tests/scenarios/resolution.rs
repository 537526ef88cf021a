//! Test: Resolution - the locator race driven directly

use crate::helpers::*;
use std::time::Duration;
use stepwright::core::{StepDefaults, StepError, StructuralQuery, Target, TextMatcher};
use stepwright::execution::{resolve_target, wait_until_visible};
use stepwright::session::{ElementHandle, SessionError};
use tokio::time::Instant;

fn search_box() -> Target {
    Target::with_fallback(
        StructuralQuery::Placeholder(TextMatcher::exact("Search")),
        "Search box",
    )
}

#[tokio::test(start_paused = true)]
async fn test_primary_resolves_without_asking_resolver() {
    let harness = Harness::new();
    harness.page.add(MockElement::new("e1").placeholder("Search"));

    let resolution = resolve_target(
        &harness.session(),
        &search_box(),
        Duration::from_secs(5),
        &StepDefaults::default(),
    )
    .await
    .unwrap();

    assert_eq!(resolution.element, ElementHandle::new("e1"));
    assert_eq!(resolution.locator_index, 0);
    assert_eq!(harness.resolver.locate_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_asked_once_after_probe() {
    let harness = Harness::new();
    harness.resolver.describe("Search box", "e2");

    let start = Instant::now();
    let resolution = resolve_target(
        &harness.session(),
        &search_box(),
        Duration::from_secs(5),
        &StepDefaults::default(),
    )
    .await
    .unwrap();

    assert_eq!(resolution.element, ElementHandle::new("e2"));
    assert_eq!(resolution.locator_index, 1);
    assert!(start.elapsed() >= Duration::from_secs(1));
    assert_eq!(harness.resolver.locate_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_not_found_after_full_budget() {
    let harness = Harness::new();

    let start = Instant::now();
    let err = resolve_target(
        &harness.session(),
        &search_box(),
        Duration::from_secs(3),
        &StepDefaults::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err,
        StepError::ElementNotFound {
            locator: "placeholder=\"Search\"".to_string(),
            timeout: Duration::from_secs(3),
        }
    );
    assert!(start.elapsed() >= Duration::from_secs(3));
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_budget_shorter_than_probe() {
    let harness = Harness::new();

    let start = Instant::now();
    let err = resolve_target(
        &harness.session(),
        &search_box(),
        Duration::from_millis(300),
        &StepDefaults::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, StepError::ElementNotFound { .. }));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_late_element_is_found() {
    let harness = Harness::new();
    harness.page.add(
        MockElement::new("e3")
            .text("Deploy")
            .appears_after(Duration::from_millis(2500)),
    );

    let target = Target::structural(StructuralQuery::Text(TextMatcher::exact("Deploy")));
    let start = Instant::now();
    let resolution = resolve_target(
        &harness.session(),
        &target,
        Duration::from_secs(10),
        &StepDefaults::default(),
    )
    .await
    .unwrap();

    assert_eq!(resolution.element, ElementHandle::new("e3"));
    assert!(start.elapsed() >= Duration::from_millis(2500));
}

#[tokio::test(start_paused = true)]
async fn test_hidden_element_never_counts_as_visible() {
    let harness = Harness::new();
    harness
        .page
        .add(MockElement::new("e1").placeholder("Search").hidden());

    let err = wait_until_visible(
        &harness.session(),
        &Target::structural(StructuralQuery::Placeholder(TextMatcher::exact("Search"))),
        Duration::from_secs(2),
        &StepDefaults::default(),
    )
    .await
    .unwrap_err();

    assert!(err.is_timeout());
}

#[tokio::test(start_paused = true)]
async fn test_driver_error_ends_the_race() {
    let harness = Harness::new();
    harness.page.fail_with(SessionError::Closed);

    let start = Instant::now();
    let err = resolve_target(
        &harness.session(),
        &search_box(),
        Duration::from_secs(5),
        &StepDefaults::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(err, StepError::Session(SessionError::Closed));
    assert_eq!(start.elapsed(), Duration::ZERO);
}
