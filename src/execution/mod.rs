//! Scenario execution: target resolution, single steps, whole runs

pub mod executor;
pub mod resolve;
pub mod runner;

pub use executor::{StepExecutor, StepOutcome};
pub use resolve::{resolve_target, wait_until_visible, Resolution};
pub use runner::{EventHandler, ExecutionEvent, StepRunner};
