//! Scenario-based tests for stepwright
//!
//! Every test runs on paused tokio time, so multi-minute timeouts finish
//! instantly and elapsed-time assertions are exact.


mod cancellation;
mod config_loading;
mod locator_fallback;
mod network_idle;
mod resolution;
mod timeouts;
