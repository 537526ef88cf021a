//! Driver bridge configuration

use std::time::Duration;

/// Configuration for the driver subprocess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Driver executable
    ///
    /// Defaults to "stepwright-driver" (assumes it's on PATH).
    pub command: String,

    /// Extra arguments passed to the driver
    pub args: Vec<String>,

    /// Upper bound for a single request/response exchange.
    /// Requests that carry their own timeout get that plus this margin.
    pub request_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command: "stepwright-driver".to_string(),
            args: Vec::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whitespace-separated command line such as `node driver.js --headless`
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let command = parts.next()?;
        Some(Self {
            command,
            args: parts.collect(),
            ..Self::default()
        })
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
