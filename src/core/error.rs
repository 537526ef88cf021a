//! Step failures, soft warnings and declaration errors

use crate::session::SessionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Classification of a fatal step failure, as shown in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnresolvedVariable,
    ElementNotFound,
    Timeout,
    AssertionFailed,
    InvalidPattern,
    Driver,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnresolvedVariable => "UnresolvedVariable",
            ErrorKind::ElementNotFound => "ElementNotFound",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::AssertionFailed => "AssertionFailed",
            ErrorKind::InvalidPattern => "InvalidPattern",
            ErrorKind::Driver => "Driver",
        };
        f.write_str(name)
    }
}

/// A fatal step failure. Any of these halts the scenario run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StepError {
    #[error("unresolved variable '{name}'")]
    UnresolvedVariable { name: String },

    #[error("element not found within {}ms: {locator}", .timeout.as_millis())]
    ElementNotFound { locator: String, timeout: Duration },

    #[error("timed out after {}ms waiting for {what}", .timeout.as_millis())]
    Timeout { what: String, timeout: Duration },

    #[error("assertion failed: {condition}{}", format_reason(.reason))]
    AssertionFailed {
        condition: String,
        reason: Option<String>,
    },

    #[error("invalid pattern /{pattern}/: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("driver error: {0}")]
    Session(#[from] SessionError),
}

fn format_reason(reason: &Option<String>) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => format!(" ({})", reason),
        _ => String::new(),
    }
}

impl StepError {
    /// The report classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StepError::UnresolvedVariable { .. } => ErrorKind::UnresolvedVariable,
            StepError::ElementNotFound { .. } => ErrorKind::ElementNotFound,
            StepError::Timeout { .. } => ErrorKind::Timeout,
            StepError::AssertionFailed { .. } => ErrorKind::AssertionFailed,
            StepError::InvalidPattern { .. } => ErrorKind::InvalidPattern,
            StepError::Session(_) => ErrorKind::Driver,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, StepError::Timeout { .. })
    }
}

/// A non-fatal degradation recorded on a step that otherwise passed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepWarning {
    /// The page never went quiet before the idle ceiling; execution proceeded anyway
    NetworkIdleTimeout { waited_ms: u64 },
}

impl fmt::Display for StepWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepWarning::NetworkIdleTimeout { waited_ms } => {
                write!(f, "NetworkIdleTimeout: network still busy after {}ms", waited_ms)
            }
        }
    }
}

/// Errors raised while declaring scenarios, before anything runs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("scenario '{0}' must contain at least one step")]
    EmptyScenario(String),

    #[error("suite '{0}' must contain at least one case")]
    EmptySuite(String),

    #[error("a target needs at least one locator")]
    EmptyTarget,
}
