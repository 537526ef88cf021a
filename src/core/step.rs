//! Step domain model

use crate::core::locator::Target;
use std::collections::BTreeMap;
use std::time::Duration;

/// What a step does once its target (if any) is resolved
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Dispatch a click on the resolved element
    Click { target: Target },

    /// Clear the element and type the (substituted) value
    SetValue { target: Target, value: String },

    /// Poll until the target resolves and is visible
    WaitForVisible { target: Target },

    /// Ask the semantic resolver whether a condition holds right now
    Assert { condition: String },

    /// Navigate the page
    Goto { url: String },

    /// Fixed sleep
    Pause { duration: Duration },

    /// Ask the semantic resolver to wait until a condition holds
    WaitFor { condition: String },

    /// Explicit network-idle wait; exceeding the ceiling only warns
    WaitForNetworkIdle,

    /// Bind or overwrite variables for the remaining steps.
    /// With `render_templates`, values are substituted before being stored.
    SetVariables {
        values: BTreeMap<String, String>,
        render_templates: bool,
    },
}

impl Action {
    /// Short name used in logs and events
    pub fn name(&self) -> &'static str {
        match self {
            Action::Click { .. } => "click",
            Action::SetValue { .. } => "set_value",
            Action::WaitForVisible { .. } => "wait_for_visible",
            Action::Assert { .. } => "assert",
            Action::Goto { .. } => "goto",
            Action::Pause { .. } => "pause",
            Action::WaitFor { .. } => "wait_for",
            Action::WaitForNetworkIdle => "wait_for_network_idle",
            Action::SetVariables { .. } => "set_variables",
        }
    }

    pub fn target(&self) -> Option<&Target> {
        match self {
            Action::Click { target }
            | Action::SetValue { target, .. }
            | Action::WaitForVisible { target } => Some(target),
            _ => None,
        }
    }
}

/// Per-step options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOptions {
    /// Wait for network quiescence after the action completes
    pub wait_network_idle_after_step: bool,

    /// Overrides the default step timeout
    pub timeout: Option<Duration>,
}

/// Timing defaults shared by every step of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefaults {
    /// Step timeout when the step sets none
    pub timeout: Duration,

    /// How long the primary locator is tried alone before fallbacks join in
    pub probe_interval: Duration,

    /// Delay between resolution/visibility polls
    pub poll_interval: Duration,

    /// Silence required before the network counts as idle
    pub network_idle_quiet: Duration,

    /// Ceiling for any network-idle wait
    pub network_idle_timeout: Duration,

    /// Bound on dispatching a click or value change once the target resolved
    pub action_timeout: Duration,
}

impl Default for StepDefaults {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            probe_interval: Duration::from_secs(1),
            poll_interval: Duration::from_millis(200),
            network_idle_quiet: Duration::from_millis(500),
            network_idle_timeout: Duration::from_secs(5),
            action_timeout: Duration::from_secs(10),
        }
    }
}

/// A single step in a scenario
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Optional label shown in reports instead of the locator text
    pub name: Option<String>,

    pub action: Action,

    pub options: StepOptions,
}

impl Step {
    pub fn new(action: Action) -> Self {
        Self {
            name: None,
            action,
            options: StepOptions::default(),
        }
    }

    pub fn click(target: Target) -> Self {
        Self::new(Action::Click { target })
    }

    pub fn set_value(target: Target, value: impl Into<String>) -> Self {
        Self::new(Action::SetValue {
            target,
            value: value.into(),
        })
    }

    pub fn wait_for_visible(target: Target) -> Self {
        Self::new(Action::WaitForVisible { target })
    }

    pub fn assert(condition: impl Into<String>) -> Self {
        Self::new(Action::Assert {
            condition: condition.into(),
        })
    }

    pub fn goto(url: impl Into<String>) -> Self {
        Self::new(Action::Goto { url: url.into() })
    }

    pub fn pause(duration: Duration) -> Self {
        Self::new(Action::Pause { duration })
    }

    pub fn wait_for(condition: impl Into<String>) -> Self {
        Self::new(Action::WaitFor {
            condition: condition.into(),
        })
    }

    pub fn wait_for_network_idle() -> Self {
        Self::new(Action::WaitForNetworkIdle)
    }

    pub fn set_variables(values: BTreeMap<String, String>, render_templates: bool) -> Self {
        Self::new(Action::SetVariables {
            values,
            render_templates,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn wait_network_idle(mut self, wait: bool) -> Self {
        self.options.wait_network_idle_after_step = wait;
        self
    }

    /// Effective timeout for this step
    pub fn timeout(&self, defaults: &StepDefaults) -> Duration {
        self.options.timeout.unwrap_or(defaults.timeout)
    }

    /// What the report shows for this step: its name, or the locator /
    /// condition it works on (before substitution)
    pub fn description(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }

        match &self.action {
            Action::Click { target }
            | Action::SetValue { target, .. }
            | Action::WaitForVisible { target } => target.description(),
            Action::Assert { condition } | Action::WaitFor { condition } => condition.clone(),
            Action::Goto { url } => url.clone(),
            Action::Pause { duration } => format!("{}ms", duration.as_millis()),
            Action::WaitForNetworkIdle => "network idle".to_string(),
            Action::SetVariables { values, .. } => values
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}
