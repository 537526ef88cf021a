//! stepwright - a declarative browser step runner

pub mod cli;
pub mod core;
pub mod execution;
pub mod persistence;
pub mod session;

// Re-export commonly used types
pub use core::{
    ErrorKind, ExecutionStatus, Locator, Scenario, ScenarioResult, Step, StepError, Suite,
    SuiteResult, Target, VariableContext,
};
pub use execution::{ExecutionEvent, StepExecutor, StepOutcome, StepRunner};
pub use session::{
    BridgeConfig, DriverBridge, ElementHandle, PageSession, SemanticResolver, Session,
    SessionError, Verdict,
};
