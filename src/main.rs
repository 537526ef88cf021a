use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stepwright::cli::commands::{HistoryCommand, ListCommand, RunCommand, ValidateCommand};
use stepwright::cli::output::*;
use stepwright::cli::{Cli, Command};
use stepwright::core::config::SuiteConfig;
use stepwright::core::{ExecutionStatus, ScenarioResult, StepStatus, VariableContext};
use stepwright::execution::{ExecutionEvent, StepRunner};
use stepwright::persistence::{
    create_summary, ExecutionSummary, InMemoryPersistence, PersistenceBackend,
};
use stepwright::session::{BridgeConfig, DriverBridge, Session};
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    let success = match &cli.command {
        Command::Run(cmd) => run_suite(cmd).await?,
        Command::Validate(cmd) => validate_suite(cmd)?,
        Command::List(cmd) => {
            list_suites(cmd).await?;
            true
        }
        Command::History(cmd) => {
            show_history(cmd).await?;
            true
        }
    };

    if !success {
        std::process::exit(1);
    }

    Ok(())
}

/// Open the run history store
async fn open_history(ephemeral: bool) -> Result<Arc<dyn PersistenceBackend>> {
    if ephemeral {
        return Ok(Arc::new(InMemoryPersistence::new()));
    }

    #[cfg(feature = "sqlite")]
    {
        let store = stepwright::persistence::SqliteExecutionStore::with_default_path().await?;
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "sqlite"))]
    {
        warn!("Built without the sqlite feature; run history is not kept");
        Ok(Arc::new(InMemoryPersistence::new()))
    }
}

async fn run_suite(cmd: &RunCommand) -> Result<bool> {
    // Load suite config
    let config = SuiteConfig::from_file(&cmd.file).context("Failed to load suite config")?;

    println!("{} Loaded suite: {}", INFO, style(&config.name).bold());

    let suite = config.to_suite()?;
    let selected = cmd
        .case
        .as_ref()
        .map(|name| {
            suite
                .scenario(name)
                .with_context(|| format!("Suite '{}' has no case named '{}'", suite.name(), name))
        })
        .transpose()?;

    // Apply variable overrides
    let mut overrides = VariableContext::new();
    for (key, value) in &cmd.var {
        overrides.set(key.clone(), value.clone());
        println!(
            "{} Variable override: {} = {}",
            INFO,
            style(key).cyan(),
            style(value).dim()
        );
    }

    // Set up persistence
    let store = open_history(cmd.no_history).await?;

    // Start the page driver
    let bridge_config = match &cmd.driver {
        Some(line) => {
            BridgeConfig::from_command_line(line).context("--driver must name a command")?
        }
        None => BridgeConfig::default(),
    };
    let bridge = DriverBridge::spawn(bridge_config).context("Failed to start page driver")?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let runner = StepRunner::new(Session::from_bridge(bridge), suite.defaults().clone())
        .with_interrupt_flag(interrupted.clone());

    // Ctrl-C stops the run before the next step
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current step");
            interrupted.store(true, Ordering::SeqCst);
        }
    });

    let total = match &selected {
        Some(scenario) => scenario.total_steps(),
        None => suite.total_steps(),
    };
    let progress = create_progress_bar(total);
    let bar = progress.clone();
    runner
        .add_event_handler(move |event| {
            match &event {
                ExecutionEvent::StepStarted { description, .. } => {
                    bar.set_message(description.clone())
                }
                ExecutionEvent::StepPassed { .. } | ExecutionEvent::StepFailed { .. } => {
                    bar.inc(1)
                }
                _ => {}
            }
            bar.println(format_execution_event(&event));
        })
        .await;

    // Execute
    println!();
    let (setup, results) = match &selected {
        Some(scenario) => (Vec::new(), vec![runner.run(scenario, overrides).await]),
        None => {
            let result = runner.run_suite(&suite, overrides).await;
            (result.setup, result.scenarios)
        }
    };
    progress.finish_and_clear();

    if let Err(err) = runner.session().page().close().await {
        warn!("Driver did not shut down cleanly: {}", err);
    }

    for report in setup.iter().filter(|r| r.status != StepStatus::Passed) {
        println!("  {}", format_step_report(report));
    }
    for result in &results {
        println!("\n{}", format_scenario_result(result));
    }

    // Save to history
    if !cmd.no_history {
        for result in &results {
            store.save_execution(&create_summary(suite.name(), result)).await?;
        }
        println!("\n{} {} run(s) saved to history", INFO, results.len());
    }

    // Print final status
    let failed: Vec<&ScenarioResult> = results.iter().filter(|r| !r.is_success()).collect();
    if failed.is_empty() {
        println!(
            "\n{} {} completed {}",
            CHECK,
            style(suite.name()).bold(),
            style("successfully").green()
        );
        Ok(true)
    } else {
        println!(
            "\n{} {} {} ({} of {} scenarios)",
            CROSS,
            style(suite.name()).bold(),
            style("failed").red(),
            failed.len(),
            results.len()
        );
        for result in failed {
            match &result.failure {
                Some(cause) => error!("{}: {}", result.scenario, cause),
                None => error!("{}: {:?}", result.scenario, result.status),
            }
        }
        Ok(false)
    }
}

fn validate_suite(cmd: &ValidateCommand) -> Result<bool> {
    let result = SuiteConfig::from_file(&cmd.file);

    if cmd.json {
        let data = match &result {
            Ok(config) => serde_json::json!({
                "valid": true,
                "name": config.name,
                "cases": config.cases.iter().map(|c| &c.name).collect::<Vec<_>>(),
                "total_steps": config.total_steps(),
                "unbound_references": config.unbound_references(),
            }),
            Err(e) => serde_json::json!({
                "valid": false,
                "error": format!("{:#}", e),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(result.is_ok());
    }

    println!("{} Validating suite...", INFO);

    match result {
        Ok(config) => {
            println!("{} Suite configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Setup steps: {}", style(config.before.len()).cyan());
            println!("  Cases: {}", style(config.cases.len()).cyan());
            println!("  Steps: {}", style(config.total_steps()).cyan());

            for unbound in config.unbound_references() {
                let scope = unbound.case.as_deref().unwrap_or("setup");
                println!(
                    "  {}{} in {} must be passed with --var",
                    WARN,
                    style(format!("${{{}}}", unbound.variable)).yellow(),
                    style(scope).bold()
                );
            }
            Ok(true)
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            Ok(false)
        }
    }
}

async fn list_suites(cmd: &ListCommand) -> Result<()> {
    let store = open_history(false).await?;
    let suites = store.list_suites().await?;

    if cmd.json {
        let mut json_data = Vec::new();
        for suite in &suites {
            let executions = store.list_executions(suite).await?;
            json_data.push(serde_json::json!({
                "name": suite,
                "execution_count": executions.len(),
            }));
        }
        let data = serde_json::json!({ "suites": json_data });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if suites.is_empty() {
        println!("{} No suites found in history", INFO);
        return Ok(());
    }

    println!("{} Suites in history:", INFO);

    for suite_name in &suites {
        if cmd.with_counts {
            let executions = store.list_executions(suite_name).await?;
            let completed = executions
                .iter()
                .filter(|e| e.status == ExecutionStatus::Completed)
                .count();
            let failed = executions
                .iter()
                .filter(|e| e.status == ExecutionStatus::Failed)
                .count();
            println!(
                "  {} ({} runs: {} passed, {} failed)",
                style(suite_name).bold(),
                style(executions.len()).cyan(),
                style(completed).green(),
                style(failed).red()
            );
        } else {
            println!("  {}", style(suite_name).bold());
        }
    }

    Ok(())
}

async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let store = open_history(false).await?;

    // If specific execution ID is requested
    if let Some(exec_id_str) = &cmd.execution_id {
        let exec_id =
            uuid::Uuid::parse_str(exec_id_str).context("Invalid execution ID format")?;

        match store.load_execution(exec_id).await? {
            Some(summary) if cmd.json => {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            Some(summary) => print_execution_details(&summary),
            None => println!("{} Execution not found", WARN),
        }
        return Ok(());
    }

    let mut executions = match &cmd.suite {
        Some(suite_name) => store.list_executions(suite_name).await?,
        None => {
            let mut all_execs = Vec::new();
            for suite in store.list_suites().await? {
                all_execs.extend(store.list_executions(&suite).await?);
            }
            all_execs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
            all_execs
        }
    };
    executions.truncate(cmd.limit);

    if cmd.json {
        let data = serde_json::json!({ "executions": executions });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if executions.is_empty() {
        println!("{} No executions found", INFO);
        return Ok(());
    }

    println!("{} Run history (showing latest {}):", INFO, executions.len());
    for summary in &executions {
        println!("  {}", format_execution_summary(summary));
    }

    Ok(())
}

fn print_execution_details(summary: &ExecutionSummary) {
    println!("{} Execution Details", INFO);
    println!("  ID: {}", style(summary.execution_id).cyan());
    println!("  Suite: {}", style(&summary.suite_name).bold());
    println!("  Scenario: {}", style(&summary.scenario_name).bold());
    println!("  Status: {}", format_status(summary.status));
    println!("  Started: {}", style(summary.started_at.to_rfc3339()).dim());
    if let Some(completed) = summary.completed_at {
        println!("  Completed: {}", style(completed.to_rfc3339()).dim());
        if let Ok(duration) = completed.signed_duration_since(summary.started_at).to_std() {
            println!("  Duration: {}", style(format_duration(duration)).dim());
        }
    }
    println!(
        "  Steps: {} ({}/{})",
        style(format!("{:.0}%", summary.progress * 100.0)).cyan(),
        summary.passed_steps,
        summary.total_steps
    );
    if summary.warnings > 0 {
        println!("  Warnings: {}", style(summary.warnings).yellow());
    }
    if let Some(cause) = &summary.failure {
        println!("  Failure: {}", format_failure(cause));
    }
}
