//! Execution state and result models

use crate::core::error::{ErrorKind, StepError, StepWarning};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Overall scenario execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Scenario has not started
    Pending,
    /// Scenario is currently running
    Running,
    /// Every step passed
    Completed,
    /// A step failed; later steps did not run
    Failed,
    /// Aborted between steps
    Cancelled,
}

/// Which part of a scenario a step belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    Main,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => f.write_str("setup"),
            Phase::Main => f.write_str("main"),
        }
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Passed,
    Failed,
    TimedOut,
    /// Skipped because an earlier step failed or the run was cancelled
    NotRun,
}

/// Report line for one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub phase: Phase,

    /// Zero-based index within its phase
    pub index: usize,

    /// Locator or condition description
    pub description: String,

    pub status: StepStatus,

    #[serde(default)]
    pub error_kind: Option<ErrorKind>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub warnings: Vec<StepWarning>,

    pub duration_ms: u64,
}

impl StepReport {
    pub fn passed(
        phase: Phase,
        index: usize,
        description: String,
        warnings: Vec<StepWarning>,
        duration_ms: u64,
    ) -> Self {
        Self {
            phase,
            index,
            description,
            status: StepStatus::Passed,
            error_kind: None,
            error: None,
            warnings,
            duration_ms,
        }
    }

    pub fn failed(
        phase: Phase,
        index: usize,
        description: String,
        error: &StepError,
        duration_ms: u64,
    ) -> Self {
        let status = if error.is_timeout() {
            StepStatus::TimedOut
        } else {
            StepStatus::Failed
        };

        Self {
            phase,
            index,
            description,
            status,
            error_kind: Some(error.kind()),
            error: Some(error.to_string()),
            warnings: Vec::new(),
            duration_ms,
        }
    }

    pub fn not_run(phase: Phase, index: usize, description: String) -> Self {
        Self {
            phase,
            index,
            description,
            status: StepStatus::NotRun,
            error_kind: None,
            error: None,
            warnings: Vec::new(),
            duration_ms: 0,
        }
    }
}

/// The single failure recorded for a failed scenario run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
    pub phase: Phase,
    pub step_index: usize,
    pub locator: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} step {} [{}] {}: {}",
            self.phase, self.step_index, self.kind, self.locator, self.message
        )
    }
}

/// Result of one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Unique execution ID
    pub execution_id: Uuid,

    pub scenario: String,

    pub status: ExecutionStatus,

    /// Reports in execution order, setup first
    pub steps: Vec<StepReport>,

    /// Set exactly when `status` is `Failed`
    pub failure: Option<FailureCause>,

    pub started_at: Option<DateTime<Utc>>,

    pub completed_at: Option<DateTime<Utc>>,
}

impl ScenarioResult {
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            scenario: scenario.into(),
            status: ExecutionStatus::Pending,
            steps: Vec::new(),
            failure: None,
            started_at: None,
            completed_at: None,
        }
    }

    /// Mark scenario as started
    pub fn start(&mut self) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Record the failure cause; only the first one sticks
    pub fn record_failure(&mut self, cause: FailureCause) {
        if self.failure.is_none() {
            self.failure = Some(cause);
        }
    }

    /// Settle the final status from what was recorded
    pub fn finish(&mut self, cancelled: bool) {
        self.status = if self.failure.is_some() {
            ExecutionStatus::Failed
        } else if cancelled {
            ExecutionStatus::Cancelled
        } else {
            ExecutionStatus::Completed
        };
        self.completed_at = Some(Utc::now());
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }

    pub fn passed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Passed)
            .count()
    }

    pub fn warnings(&self) -> Vec<&StepWarning> {
        self.steps.iter().flat_map(|s| s.warnings.iter()).collect()
    }

    /// Report for a step by phase and index
    pub fn step(&self, phase: Phase, index: usize) -> Option<&StepReport> {
        self.steps
            .iter()
            .find(|s| s.phase == phase && s.index == index)
    }

    /// Calculate progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        self.passed_steps() as f64 / self.steps.len() as f64
    }
}

/// Results of a whole suite run, one per case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub suite: String,

    /// Reports of the shared setup steps, run once
    #[serde(default)]
    pub setup: Vec<StepReport>,

    pub scenarios: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn is_success(&self) -> bool {
        self.scenarios.iter().all(|s| s.is_success())
    }

    pub fn failed(&self) -> Vec<&ScenarioResult> {
        self.scenarios
            .iter()
            .filter(|s| s.status == ExecutionStatus::Failed)
            .collect()
    }
}
