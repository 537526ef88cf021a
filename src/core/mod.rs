//! Core domain models for the step runner
//!
//! This module defines the fundamental data structures that represent
//! locators, steps, scenarios, and their configuration.

pub mod config;
pub mod context;
pub mod error;
pub mod locator;
pub mod scenario;
pub mod state;
pub mod step;

pub use context::*;
pub use error::*;
pub use locator::*;
pub use scenario::*;
pub use state::*;
pub use step::*;
