//! CLI output formatting

use crate::{
    core::{ExecutionStatus, FailureCause, ScenarioResult, StepReport, StepStatus},
    execution::ExecutionEvent,
    persistence::ExecutionSummary,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");

/// Create a progress bar
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    progress.set_style(style);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a step status for display
pub fn format_step_status(status: StepStatus) -> String {
    match status {
        StepStatus::Passed => style("PASSED").green().to_string(),
        StepStatus::Failed => style("FAILED").red().to_string(),
        StepStatus::TimedOut => style("TIMED OUT").red().to_string(),
        StepStatus::NotRun => style("NOT RUN").dim().to_string(),
    }
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
        ExecutionStatus::Cancelled => style("CANCELLED").yellow().to_string(),
    }
}

fn short_id(id: &uuid::Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

/// Format a failure cause: phase, step index, locator and kind
pub fn format_failure(cause: &FailureCause) -> String {
    format!(
        "{} step {} {} {}: {}",
        cause.phase,
        style(cause.step_index).bold(),
        style(format!("[{}]", cause.kind)).red(),
        style(&cause.locator).cyan(),
        cause.message
    )
}

/// Format execution summary for display
pub fn format_execution_summary(summary: &ExecutionSummary) -> String {
    let status_icon = match summary.status {
        ExecutionStatus::Completed => CHECK,
        ExecutionStatus::Failed => CROSS,
        ExecutionStatus::Running => SPINNER,
        _ => INFO,
    };

    let mut line = format!(
        "{} {} - {} / {} - {} ({}/{})",
        status_icon,
        style(short_id(&summary.execution_id)).dim(),
        style(&summary.suite_name).bold(),
        style(&summary.scenario_name).bold(),
        format_status(summary.status),
        summary.passed_steps,
        summary.total_steps,
    );
    if summary.warnings > 0 {
        line.push_str(&format!(" {}{}", WARN, style(summary.warnings).yellow()));
    }
    line
}

/// Format a single step report line
pub fn format_step_report(report: &StepReport) -> String {
    let mut line = format!(
        "{} {} {} - {}",
        style(report.phase).dim(),
        style(report.index).dim(),
        report.description,
        format_step_status(report.status)
    );
    if report.status != StepStatus::NotRun {
        line.push_str(&format!(" {}", style(format!("({}ms)", report.duration_ms)).dim()));
    }
    if let Some(error) = &report.error {
        line.push_str(&format!("\n      {}", style(error).red()));
    }
    for warning in &report.warnings {
        line.push_str(&format!("\n      {}{}", WARN, style(warning).yellow()));
    }
    line
}

/// Format a scenario result with one line per step
pub fn format_scenario_result(result: &ScenarioResult) -> String {
    let icon = if result.is_success() { CHECK } else { CROSS };
    let mut out = format!(
        "{} {} - {} ({}/{})",
        icon,
        style(&result.scenario).bold(),
        format_status(result.status),
        result.passed_steps(),
        result.steps.len()
    );
    for report in &result.steps {
        out.push_str(&format!("\n    {}", format_step_report(report)));
    }
    if let Some(cause) = &result.failure {
        out.push_str(&format!("\n    {} {}", CROSS, format_failure(cause)));
    }
    out
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::SuiteStarted { suite, cases } => format!(
            "{} Starting suite {} ({} cases)",
            ROCKET,
            style(suite).bold(),
            style(cases).cyan()
        ),
        ExecutionEvent::ScenarioStarted {
            execution_id,
            scenario,
            total_steps,
        } => format!(
            "{} {} ({}, {} steps)",
            ROCKET,
            style(scenario).bold(),
            style(short_id(execution_id)).dim(),
            total_steps
        ),
        ExecutionEvent::StepStarted {
            phase,
            index,
            action,
            description,
        } => format!(
            "{} {} {} {} {}",
            SPINNER,
            style(phase).dim(),
            style(index).dim(),
            style(action).dim(),
            style(description).cyan()
        ),
        ExecutionEvent::StepPassed {
            description,
            duration_ms,
            ..
        } => format!(
            "{} {} {}",
            CHECK,
            style(description).green(),
            style(format!("({}ms)", duration_ms)).dim()
        ),
        ExecutionEvent::StepWarning {
            phase,
            index,
            warning,
        } => format!(
            "{} {} step {}: {}",
            WARN,
            phase,
            index,
            style(warning).yellow()
        ),
        ExecutionEvent::StepFailed {
            phase,
            index,
            description,
            kind,
            error,
        } => format!(
            "{} {} step {} {} {}: {}",
            CROSS,
            phase,
            index,
            style(format!("[{}]", kind)).red(),
            style(description).red(),
            style(error).dim()
        ),
        ExecutionEvent::ScenarioCompleted {
            execution_id,
            scenario,
            status,
        } => format!(
            "{} {} ({}) {}",
            INFO,
            style(scenario).bold(),
            style(short_id(execution_id)).dim(),
            format_status(*status)
        ),
        ExecutionEvent::SuiteCompleted {
            suite,
            passed,
            failed,
        } => format!(
            "{} Suite {}: {} passed, {} failed",
            INFO,
            style(suite).bold(),
            style(passed).green(),
            style(failed).red()
        ),
    }
}

/// Human readable duration
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
