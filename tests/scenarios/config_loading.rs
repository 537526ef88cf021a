//! Test: Config Loading - suite files from disk into runnable suites

use crate::helpers::*;
use stepwright::core::config::SuiteConfig;
use stepwright::core::{Locator, VariableContext};

/// The documented example suite, end to end
const DEMO_SUITE: &str = r#"
name: "demo"
variables: { sample_name: "Stock assistant" }
defaults: { timeout_ms: 30000, probe_interval_ms: 1000 }
before:
  - goto: "https://example.com/"
  - wait_for_network_idle: { timeout_ms: 5000 }
cases:
  - name: "deploy"
    steps:
      - click:
          target: { placeholder: { pattern: "search", ignore_case: true }, describe: "Search box" }
      - set_value:
          target: { role: textbox, name: "Search", describe: "Search box" }
          value: "${sample_name}"
        wait_network_idle_after_step: true
      - wait_for_visible: { target: { describe: "Quick call panel" } }
        timeout_ms: 500000
      - assert: "The conversation shows no errors"
"#;

struct TempSuite(std::path::PathBuf);

impl TempSuite {
    fn write(content: &str) -> Self {
        let path = std::env::temp_dir().join(format!("stepwright-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, content).unwrap();
        Self(path)
    }
}

impl Drop for TempSuite {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[test]
fn test_load_from_file() {
    let file = TempSuite::write(DEMO_SUITE);
    let config = SuiteConfig::from_file(&file.0).unwrap();

    assert_eq!(config.name, "demo");
    assert_eq!(config.before.len(), 2);
    assert_eq!(config.total_steps(), 6);
    assert!(config.unbound_references().is_empty());

    let suite = config.to_suite().unwrap();
    let deploy = &suite.cases()[0];
    let locators = deploy.steps()[0].action.target().unwrap().locators();
    assert_eq!(locators.len(), 2);
    assert!(matches!(locators[0], Locator::Structural(_)));
    assert_eq!(locators[1], Locator::semantic("Search box"));
}

#[test]
fn test_missing_file_has_context() {
    let err = SuiteConfig::from_file("/definitely/not/here.yaml").unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read suite file"));
}

#[test]
fn test_invalid_suite_rejected() {
    let file = TempSuite::write(
        r##"
name: "broken"
cases:
  - name: "bad target"
    steps:
      - click: { target: { text: "A", css: "#b" } }
"##,
    );
    let err = SuiteConfig::from_file(&file.0).unwrap_err();
    assert!(format!("{:#}", err).contains("bad target"));
}

#[test]
fn test_unbound_reference_reported() {
    let config = SuiteConfig::from_yaml(
        r#"
name: "auth"
before:
  - set_variables: { values: { user: "alice" } }
cases:
  - name: "login"
    steps:
      - set_value: { target: { label: "User" }, value: "${user}" }
      - set_value: { target: { label: "Token" }, value: "${token}" }
"#,
    )
    .unwrap();

    let unbound = config.unbound_references();
    assert_eq!(unbound.len(), 1);
    assert_eq!(unbound[0].case.as_deref(), Some("login"));
    assert_eq!(unbound[0].variable, "token");
}

#[tokio::test(start_paused = true)]
async fn test_demo_suite_runs() {
    let harness = Harness::new();
    harness.page.add(MockElement::new("search").placeholder("Search"));
    harness.page.add(MockElement::new("search").role("textbox", "Search"));
    harness.page.add(MockElement::new("panel"));
    harness.resolver.describe("Quick call panel", "panel");

    let (suite, defaults) = load_suite(DEMO_SUITE);
    let runner = harness.runner(defaults);
    let result = runner.run_suite(&suite, VariableContext::new()).await;

    assert!(result.is_success(), "{:?}", result.failed());
    assert_eq!(
        harness.calls(),
        vec![
            "goto https://example.com/",
            "network idle",
            "click search",
            "set_value search Stock assistant",
            "network idle",
            "assert The conversation shows no errors"
        ]
    );
}
