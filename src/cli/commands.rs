//! CLI command definitions

use clap::Args;

/// Run a suite
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to suite YAML file
    #[arg(short, long)]
    pub file: String,

    /// Run only this case (with the suite setup)
    #[arg(long)]
    pub case: Option<String>,

    /// Variable overrides (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub var: Vec<(String, String)>,

    /// Driver command line, e.g. "node driver.js --headless"
    #[arg(long)]
    pub driver: Option<String>,

    /// Don't save runs to history
    #[arg(long)]
    pub no_history: bool,
}

/// Validate a suite file
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to suite YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List suites in history
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Show run counts
    #[arg(long)]
    pub with_counts: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show run history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Suite name to filter by
    #[arg(short, long)]
    pub suite: Option<String>,

    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show a single run
    #[arg(long)]
    pub execution_id: Option<String>,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Invalid key=value pair: {}", s)),
    }
}
