//! Scenario and suite domain models

use crate::core::{error::DeclarationError, step::{Step, StepDefaults}};
use std::collections::HashMap;

/// A named, ordered sequence of steps with optional setup steps
///
/// Construction rejects empty step lists, so every scenario that reaches the
/// runner has at least one main step.
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    setup: Vec<Step>,
    steps: Vec<Step>,
    variables: HashMap<String, String>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Result<Self, DeclarationError> {
        let name = name.into();
        if steps.is_empty() {
            return Err(DeclarationError::EmptyScenario(name));
        }

        Ok(Self {
            name,
            setup: Vec::new(),
            steps,
            variables: HashMap::new(),
        })
    }

    /// Steps run once before the main steps
    pub fn with_setup(mut self, setup: Vec<Step>) -> Self {
        self.setup = setup;
        self
    }

    /// Declared variables; invocation-time values override them
    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn setup(&self) -> &[Step] {
        &self.setup
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }

    /// Setup plus main steps
    pub fn total_steps(&self) -> usize {
        self.setup.len() + self.steps.len()
    }
}

/// A `describe` block: shared setup and variables, one scenario per case
#[derive(Debug, Clone)]
pub struct Suite {
    name: String,
    variables: HashMap<String, String>,
    setup: Vec<Step>,
    cases: Vec<Scenario>,
    defaults: StepDefaults,
}

impl Suite {
    pub fn new(name: impl Into<String>, cases: Vec<Scenario>) -> Result<Self, DeclarationError> {
        let name = name.into();
        if cases.is_empty() {
            return Err(DeclarationError::EmptySuite(name));
        }

        Ok(Self {
            name,
            variables: HashMap::new(),
            setup: Vec::new(),
            cases,
            defaults: StepDefaults::default(),
        })
    }

    pub fn with_setup(mut self, setup: Vec<Step>) -> Self {
        self.setup = setup;
        self
    }

    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_defaults(mut self, defaults: StepDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }

    pub fn setup(&self) -> &[Step] {
        &self.setup
    }

    /// Cases without the suite setup attached
    pub fn cases(&self) -> &[Scenario] {
        &self.cases
    }

    pub fn defaults(&self) -> &StepDefaults {
        &self.defaults
    }

    /// Total number of steps a full suite run executes
    pub fn total_steps(&self) -> usize {
        self.setup.len() + self.cases.iter().map(|c| c.total_steps()).sum::<usize>()
    }

    /// A standalone scenario for one case: suite setup ahead of the case's
    /// own, suite variables underneath the case's own
    pub fn scenario(&self, case_name: &str) -> Option<Scenario> {
        self.cases.iter().find(|c| c.name() == case_name).map(|case| {
            let mut variables = self.variables.clone();
            variables.extend(case.variables().clone());
            let mut setup = self.setup.clone();
            setup.extend(case.setup().iter().cloned());
            case.clone().with_setup(setup).with_variables(variables)
        })
    }
}
