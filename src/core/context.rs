//! Variable context - `${var}` values bound for a scenario run

use crate::core::error::StepError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}").unwrap());

/// Variables available to step payloads and locator text
///
/// Created at run start from the scenario's declared variables plus any
/// invocation overrides. Only `set`/`update` (the `set_variables` action)
/// change it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableContext {
    variables: HashMap<String, String>,
}

impl VariableContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Get a variable
    pub fn get(&self, key: &str) -> Option<&String> {
        self.variables.get(key)
    }

    /// Merge values in, overwriting existing keys
    pub fn update(&mut self, values: HashMap<String, String>) {
        self.variables.extend(values);
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Names referenced by `${...}` tokens in a template, in order of appearance
    pub fn references(template: &str) -> Vec<String> {
        PLACEHOLDER
            .captures_iter(template)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// Replace every `${name}` token with its bound value
    ///
    /// Fails on the first referenced name that is not bound. Text that only
    /// looks like a token (`${}`, `${ 1abc }`) is left untouched.
    pub fn substitute(&self, template: &str) -> Result<String, StepError> {
        let mut rendered = String::with_capacity(template.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(template) {
            let Some(token) = caps.get(0) else { continue };
            let name = &caps[1];
            let value = self
                .variables
                .get(name)
                .ok_or_else(|| StepError::UnresolvedVariable {
                    name: name.to_string(),
                })?;

            rendered.push_str(&template[last..token.start()]);
            rendered.push_str(value);
            last = token.end();
        }

        rendered.push_str(&template[last..]);
        Ok(rendered)
    }
}

impl From<HashMap<String, String>> for VariableContext {
    fn from(variables: HashMap<String, String>) -> Self {
        Self { variables }
    }
}
