//! Suite configuration from YAML

use crate::core::{
    context::VariableContext,
    locator::{Locator, StructuralQuery, Target, TextMatcher},
    scenario::{Scenario, Suite},
    step::{Action, Step, StepDefaults, StepOptions},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// Top-level suite configuration loaded from YAML (a `describe` block)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Suite name
    pub name: String,

    /// Variables seeding every case's context
    #[serde(default)]
    variables: HashMap<String, Value>,

    /// Timing defaults for every step
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Setup steps, run once before the cases
    #[serde(default)]
    pub before: Vec<StepConfig>,

    /// Test cases, run in declaration order
    pub cases: Vec<CaseConfig>,
}

/// Timing overrides, all in milliseconds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    #[serde(default)]
    pub probe_interval_ms: Option<u64>,

    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    #[serde(default)]
    pub network_idle_quiet_ms: Option<u64>,

    #[serde(default)]
    pub network_idle_timeout_ms: Option<u64>,

    #[serde(default)]
    pub action_timeout_ms: Option<u64>,
}

impl DefaultsConfig {
    pub fn to_defaults(&self) -> StepDefaults {
        let base = StepDefaults::default();
        let ms = |value: Option<u64>, fallback: Duration| {
            value.map(Duration::from_millis).unwrap_or(fallback)
        };

        StepDefaults {
            timeout: ms(self.timeout_ms, base.timeout),
            probe_interval: ms(self.probe_interval_ms, base.probe_interval),
            poll_interval: ms(self.poll_interval_ms, base.poll_interval),
            network_idle_quiet: ms(self.network_idle_quiet_ms, base.network_idle_quiet),
            network_idle_timeout: ms(self.network_idle_timeout_ms, base.network_idle_timeout),
            action_timeout: ms(self.action_timeout_ms, base.action_timeout),
        }
    }
}

/// One `it` case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseConfig {
    pub name: String,

    /// Case variables, layered over the suite's
    #[serde(default)]
    variables: HashMap<String, Value>,

    pub steps: Vec<StepConfig>,
}

impl CaseConfig {
    pub fn variables_as_string_map(&self) -> HashMap<String, String> {
        string_map(&self.variables)
    }
}

/// Step configuration as written in YAML: one action key plus options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Optional label for reports
    #[serde(default)]
    pub name: Option<String>,

    #[serde(flatten)]
    pub action: ActionConfig,

    /// Wait for network quiescence after the action
    #[serde(default)]
    pub wait_network_idle_after_step: bool,

    /// Timeout for this step (overrides the suite default)
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// The action key of a step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionConfig {
    Click {
        target: TargetConfig,
    },
    SetValue {
        target: TargetConfig,
        value: String,
    },
    WaitForVisible {
        target: TargetConfig,
    },
    Assert(String),
    Goto(String),
    /// Fixed sleep in milliseconds
    Pause(u64),
    WaitFor(String),
    WaitForNetworkIdle {
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    SetVariables {
        values: BTreeMap<String, String>,
        #[serde(default)]
        render_templates: bool,
    },
}

/// Where to find an element: at most one structural key plus an optional
/// semantic `describe` fallback
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Accessible name filter, only valid with `role`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<MatcherConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<MatcherConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<MatcherConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<MatcherConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,

    /// Natural-language description for the semantic resolver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub describe: Option<String>,
}

/// Either exact text or a regex pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatcherConfig {
    Exact(String),
    Pattern {
        pattern: String,
        #[serde(default)]
        ignore_case: bool,
    },
}

impl MatcherConfig {
    fn to_matcher(&self) -> Result<TextMatcher> {
        match self {
            MatcherConfig::Exact(text) => Ok(TextMatcher::exact(text.clone())),
            MatcherConfig::Pattern {
                pattern,
                ignore_case,
            } => Ok(TextMatcher::pattern(pattern.clone(), *ignore_case)?),
        }
    }
}

impl TargetConfig {
    /// Convert to a priority-ordered target: structural query first,
    /// semantic description last
    pub fn to_target(&self) -> Result<Target> {
        if self.name.is_some() && self.role.is_none() {
            anyhow::bail!("'name' is only valid together with 'role'");
        }

        let mut structural = Vec::new();
        if let Some(role) = &self.role {
            let name = self.name.as_ref().map(|n| n.to_matcher()).transpose()?;
            structural.push(StructuralQuery::Role {
                role: role.clone(),
                name,
            });
        }
        if let Some(text) = &self.text {
            structural.push(StructuralQuery::Text(text.to_matcher()?));
        }
        if let Some(placeholder) = &self.placeholder {
            structural.push(StructuralQuery::Placeholder(placeholder.to_matcher()?));
        }
        if let Some(label) = &self.label {
            structural.push(StructuralQuery::Label(label.to_matcher()?));
        }
        if let Some(test_id) = &self.test_id {
            structural.push(StructuralQuery::TestId(test_id.clone()));
        }
        if let Some(css) = &self.css {
            structural.push(StructuralQuery::Css(css.clone()));
        }

        if structural.len() > 1 {
            anyhow::bail!(
                "a target takes at most one structural query (role, text, placeholder, label, test_id or css), found {}",
                structural.len()
            );
        }

        let mut locators: Vec<Locator> = structural.into_iter().map(Locator::from).collect();
        if let Some(describe) = &self.describe {
            if describe.trim().is_empty() {
                anyhow::bail!("'describe' must not be empty");
            }
            locators.push(Locator::semantic(describe.clone()));
        }

        Ok(Target::new(locators)?)
    }
}

impl StepConfig {
    /// Convert to a domain step
    pub fn to_step(&self) -> Result<Step> {
        let mut options = StepOptions {
            wait_network_idle_after_step: self.wait_network_idle_after_step,
            timeout: self.timeout_ms.map(Duration::from_millis),
        };

        let action = match &self.action {
            ActionConfig::Click { target } => Action::Click {
                target: target.to_target()?,
            },
            ActionConfig::SetValue { target, value } => Action::SetValue {
                target: target.to_target()?,
                value: value.clone(),
            },
            ActionConfig::WaitForVisible { target } => Action::WaitForVisible {
                target: target.to_target()?,
            },
            ActionConfig::Assert(condition) => Action::Assert {
                condition: condition.clone(),
            },
            ActionConfig::Goto(url) => Action::Goto { url: url.clone() },
            ActionConfig::Pause(ms) => Action::Pause {
                duration: Duration::from_millis(*ms),
            },
            ActionConfig::WaitFor(condition) => Action::WaitFor {
                condition: condition.clone(),
            },
            ActionConfig::WaitForNetworkIdle { timeout_ms } => {
                if let Some(ms) = timeout_ms {
                    options.timeout = Some(Duration::from_millis(*ms));
                }
                Action::WaitForNetworkIdle
            }
            ActionConfig::SetVariables {
                values,
                render_templates,
            } => Action::SetVariables {
                values: values.clone(),
                render_templates: *render_templates,
            },
        };

        Ok(Step {
            name: self.name.clone(),
            action,
            options,
        })
    }

    /// Every `${var}` this step reads
    fn references(&self) -> Vec<String> {
        let mut texts: Vec<String> = Vec::new();
        let target = match &self.action {
            ActionConfig::Click { target } | ActionConfig::WaitForVisible { target } => Some(target),
            ActionConfig::SetValue { target, value } => {
                texts.push(value.clone());
                Some(target)
            }
            ActionConfig::Assert(text) | ActionConfig::Goto(text) | ActionConfig::WaitFor(text) => {
                texts.push(text.clone());
                None
            }
            ActionConfig::SetVariables {
                values,
                render_templates: true,
            } => {
                texts.extend(values.values().cloned());
                None
            }
            _ => None,
        };

        if let Some(target) = target {
            texts.extend(target.role.clone());
            texts.extend(target.test_id.clone());
            texts.extend(target.css.clone());
            texts.extend(target.describe.clone());
            for matcher in [&target.name, &target.text, &target.placeholder, &target.label]
                .into_iter()
                .flatten()
            {
                texts.push(match matcher {
                    MatcherConfig::Exact(text) => text.clone(),
                    MatcherConfig::Pattern { pattern, .. } => pattern.clone(),
                });
            }
        }

        texts
            .iter()
            .flat_map(|t| VariableContext::references(t))
            .collect()
    }

    /// Variables this step binds for later steps
    fn binds(&self) -> Vec<String> {
        match &self.action {
            ActionConfig::SetVariables { values, .. } => values.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

/// A `${var}` reference nothing in the file binds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnboundReference {
    /// Case name, or `None` for the setup block
    pub case: Option<String>,
    pub variable: String,
}

impl SuiteConfig {
    /// Load suite configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read suite file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse suite configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SuiteConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the suite configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Suite name must not be empty");
        }

        if self.cases.is_empty() {
            anyhow::bail!("Suite '{}' must contain at least one case", self.name);
        }

        let mut seen_names = HashSet::new();
        for case in &self.cases {
            if !seen_names.insert(&case.name) {
                anyhow::bail!("Duplicate case name: {}", case.name);
            }
            if case.steps.is_empty() {
                anyhow::bail!("Case '{}' must contain at least one step", case.name);
            }
        }

        for (index, step) in self.before.iter().enumerate() {
            step.to_step()
                .with_context(|| format!("Invalid setup step {}", index))?;
        }

        for case in &self.cases {
            for (index, step) in case.steps.iter().enumerate() {
                step.to_step()
                    .with_context(|| format!("Case '{}' has invalid step {}", case.name, index))?;
            }
        }

        Ok(())
    }

    /// References that no suite/case variable or earlier `set_variables`
    /// step binds. They must come from invocation overrides.
    pub fn unbound_references(&self) -> Vec<UnboundReference> {
        let mut unbound = Vec::new();
        let mut setup_bound: HashSet<String> = self.variables.keys().cloned().collect();

        for step in &self.before {
            for variable in step.references() {
                if !setup_bound.contains(&variable) {
                    unbound.push(UnboundReference {
                        case: None,
                        variable,
                    });
                }
            }
            setup_bound.extend(step.binds());
        }

        for case in &self.cases {
            let mut bound = setup_bound.clone();
            bound.extend(case.variables.keys().cloned());
            for step in &case.steps {
                for variable in step.references() {
                    if !bound.contains(&variable) {
                        unbound.push(UnboundReference {
                            case: Some(case.name.clone()),
                            variable,
                        });
                    }
                }
                bound.extend(step.binds());
            }
        }

        unbound.dedup();
        unbound
    }

    /// Get suite variables as string map
    pub fn variables_as_string_map(&self) -> HashMap<String, String> {
        string_map(&self.variables)
    }

    /// Total number of steps across setup and cases
    pub fn total_steps(&self) -> usize {
        self.before.len() + self.cases.iter().map(|c| c.steps.len()).sum::<usize>()
    }

    /// Convert config to a Suite domain model
    pub fn to_suite(&self) -> Result<Suite> {
        let setup = self
            .before
            .iter()
            .map(StepConfig::to_step)
            .collect::<Result<Vec<_>>>()?;

        let cases = self
            .cases
            .iter()
            .map(|case| -> Result<Scenario> {
                let steps = case
                    .steps
                    .iter()
                    .map(StepConfig::to_step)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Scenario::new(case.name.clone(), steps)?
                    .with_variables(case.variables_as_string_map()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Suite::new(self.name.clone(), cases)?
            .with_setup(setup)
            .with_variables(self.variables_as_string_map())
            .with_defaults(self.defaults.to_defaults()))
    }
}

fn string_map(values: &HashMap<String, Value>) -> HashMap<String, String> {
    values
        .iter()
        .map(|(k, v)| (k.clone(), render_value(v)))
        .collect()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
