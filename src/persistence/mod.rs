//! Persistence layer for scenario run history

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteExecutionStore;

pub use crate::core::ExecutionStatus;
use crate::core::{FailureCause, ScenarioResult};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Summary of one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// Suite the scenario belongs to
    pub suite_name: String,

    /// Scenario (case) name
    pub scenario_name: String,

    /// Execution status
    pub status: ExecutionStatus,

    /// When execution started
    pub started_at: DateTime<Utc>,

    /// When execution completed (if complete)
    pub completed_at: Option<DateTime<Utc>>,

    /// Progress (0.0 to 1.0)
    pub progress: f64,

    /// Number of passed steps
    pub passed_steps: usize,

    /// Total number of steps, setup included
    pub total_steps: usize,

    /// Why the run failed
    pub failure: Option<FailureCause>,

    /// Number of non-fatal warnings
    pub warnings: usize,
}

/// Trait for persistence backends
#[async_trait::async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Save a scenario run
    async fn save_execution(&self, execution: &ExecutionSummary) -> Result<()>;

    /// Load an execution by ID
    async fn load_execution(&self, execution_id: Uuid) -> Result<Option<ExecutionSummary>>;

    /// List all executions for a suite, newest first
    async fn list_executions(&self, suite_name: &str) -> Result<Vec<ExecutionSummary>>;

    /// Most recent execution for a suite
    async fn get_latest_execution(&self, suite_name: &str) -> Result<Option<ExecutionSummary>>;

    /// List all suite names
    async fn list_suites(&self) -> Result<Vec<String>>;
}

/// In-memory persistence (for testing or ephemeral use)
pub struct InMemoryPersistence {
    executions: tokio::sync::RwLock<HashMap<Uuid, ExecutionSummary>>,
    by_suite: tokio::sync::RwLock<HashMap<String, Vec<Uuid>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self {
            executions: tokio::sync::RwLock::new(HashMap::new()),
            by_suite: tokio::sync::RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for InMemoryPersistence {
    async fn save_execution(&self, execution: &ExecutionSummary) -> Result<()> {
        let mut execs = self.executions.write().await;
        let replaced = execs
            .insert(execution.execution_id, execution.clone())
            .is_some();

        if !replaced {
            let mut by_suite = self.by_suite.write().await;
            by_suite
                .entry(execution.suite_name.clone())
                .or_default()
                .push(execution.execution_id);
        }

        Ok(())
    }

    async fn load_execution(&self, execution_id: Uuid) -> Result<Option<ExecutionSummary>> {
        let execs = self.executions.read().await;
        Ok(execs.get(&execution_id).cloned())
    }

    async fn list_executions(&self, suite_name: &str) -> Result<Vec<ExecutionSummary>> {
        let execs = self.executions.read().await;
        let by_suite = self.by_suite.read().await;

        let mut result: Vec<ExecutionSummary> = by_suite
            .get(suite_name)
            .map(|ids| ids.iter().filter_map(|id| execs.get(id).cloned()).collect())
            .unwrap_or_default();
        result.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(result)
    }

    async fn get_latest_execution(&self, suite_name: &str) -> Result<Option<ExecutionSummary>> {
        Ok(self.list_executions(suite_name).await?.into_iter().next())
    }

    async fn list_suites(&self) -> Result<Vec<String>> {
        let by_suite = self.by_suite.read().await;
        let mut names: Vec<String> = by_suite.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Create a summary from a scenario result
pub fn create_summary(suite_name: &str, result: &ScenarioResult) -> ExecutionSummary {
    ExecutionSummary {
        execution_id: result.execution_id,
        suite_name: suite_name.to_string(),
        scenario_name: result.scenario.clone(),
        status: result.status,
        started_at: result.started_at.unwrap_or_else(Utc::now),
        completed_at: result.completed_at,
        progress: result.progress(),
        passed_steps: result.passed_steps(),
        total_steps: result.steps.len(),
        failure: result.failure.clone(),
        warnings: result.warnings().len(),
    }
}
