//! Step runner - runs scenarios and suites step by step, fail-fast

use crate::{
    core::{
        ErrorKind, ExecutionStatus, FailureCause, Phase, Scenario, ScenarioResult, Step,
        StepDefaults, StepReport, StepWarning, Suite, SuiteResult, VariableContext,
    },
    execution::{StepExecutor, StepOutcome},
    session::{PageSession, SemanticResolver, Session},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Events that can occur during a run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    SuiteStarted {
        suite: String,
        cases: usize,
    },
    ScenarioStarted {
        execution_id: Uuid,
        scenario: String,
        total_steps: usize,
    },
    StepStarted {
        phase: Phase,
        index: usize,
        action: &'static str,
        description: String,
    },
    StepPassed {
        phase: Phase,
        index: usize,
        description: String,
        duration_ms: u64,
    },
    StepWarning {
        phase: Phase,
        index: usize,
        warning: StepWarning,
    },
    StepFailed {
        phase: Phase,
        index: usize,
        description: String,
        kind: ErrorKind,
        error: String,
    },
    ScenarioCompleted {
        execution_id: Uuid,
        scenario: String,
        status: ExecutionStatus,
    },
    SuiteCompleted {
        suite: String,
        passed: usize,
        failed: usize,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// How a phase ended
#[derive(Debug)]
enum PhaseOutcome {
    Completed,
    Failed(FailureCause),
    Cancelled,
}

/// Runs scenarios against one session
///
/// Steps never overlap: each action and its optional idle wait finish before
/// the next step starts. The interrupt flag is checked between steps only.
pub struct StepRunner<P, R> {
    executor: StepExecutor<P, R>,
    event_handlers: Arc<Mutex<Vec<EventHandler>>>,
    interrupted: Arc<AtomicBool>,
}

impl<P: PageSession, R: SemanticResolver> StepRunner<P, R> {
    pub fn new(session: Session<P, R>, defaults: StepDefaults) -> Self {
        Self {
            executor: StepExecutor::new(session, defaults),
            event_handlers: Arc::new(Mutex::new(Vec::new())),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an externally owned interrupt flag (e.g. set from Ctrl-C)
    pub fn with_interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = flag;
        self
    }

    /// Flag that aborts the run before the next step when set
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    pub fn session(&self) -> &Session<P, R> {
        self.executor.session()
    }

    pub fn defaults(&self) -> &StepDefaults {
        self.executor.defaults()
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.lock().await.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    async fn emit_event(&self, event: ExecutionEvent) {
        let handlers = self.event_handlers.lock().await;
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Run a scenario: its setup steps, then its main steps
    ///
    /// The context starts from the scenario's declared variables with
    /// `context` layered on top.
    pub async fn run(&self, scenario: &Scenario, context: VariableContext) -> ScenarioResult {
        let mut variables = VariableContext::from(scenario.variables().clone());
        variables.update(context.variables().clone());

        let mut result = ScenarioResult::new(scenario.name());
        self.begin(&mut result, scenario.total_steps()).await;

        let outcome = self
            .run_scenario_steps(scenario, &mut variables, &mut result.steps)
            .await;

        self.finish(&mut result, outcome).await;
        result
    }

    /// Run a whole suite: setup once, then every case in order
    ///
    /// A failing case does not stop later ones. A failing suite setup fails
    /// every case with its cause. A case's own setup runs before its steps.
    pub async fn run_suite(&self, suite: &Suite, overrides: VariableContext) -> SuiteResult {
        info!("Starting suite: {} ({} cases)", suite.name(), suite.cases().len());
        self.emit_event(ExecutionEvent::SuiteStarted {
            suite: suite.name().to_string(),
            cases: suite.cases().len(),
        })
        .await;

        let mut shared = VariableContext::from(suite.variables().clone());
        shared.update(overrides.variables().clone());

        let mut setup = Vec::new();
        let setup_outcome = self
            .run_phase(Phase::Setup, suite.setup(), &mut shared, &mut setup)
            .await;

        let mut scenarios = Vec::with_capacity(suite.cases().len());
        for case in suite.cases() {
            let mut result = ScenarioResult::new(case.name());
            self.begin(&mut result, case.total_steps()).await;

            let outcome = match &setup_outcome {
                PhaseOutcome::Completed if !self.is_interrupted() => {
                    let mut variables = shared.clone();
                    variables.update(case.variables().clone());
                    variables.update(overrides.variables().clone());
                    self.run_scenario_steps(case, &mut variables, &mut result.steps)
                        .await
                }
                PhaseOutcome::Failed(cause) => {
                    skip_scenario(case, &mut result.steps);
                    PhaseOutcome::Failed(cause.clone())
                }
                _ => {
                    skip_scenario(case, &mut result.steps);
                    PhaseOutcome::Cancelled
                }
            };

            self.finish(&mut result, outcome).await;
            scenarios.push(result);
        }

        let result = SuiteResult {
            suite: suite.name().to_string(),
            setup,
            scenarios,
        };

        let passed = result.scenarios.iter().filter(|s| s.is_success()).count();
        let failed = result.failed().len();
        info!(
            "Suite finished: {} - {} passed, {} failed",
            suite.name(),
            passed,
            failed
        );
        self.emit_event(ExecutionEvent::SuiteCompleted {
            suite: suite.name().to_string(),
            passed,
            failed,
        })
        .await;

        result
    }

    /// Setup steps, then main steps unless setup stopped the run
    async fn run_scenario_steps(
        &self,
        scenario: &Scenario,
        variables: &mut VariableContext,
        reports: &mut Vec<StepReport>,
    ) -> PhaseOutcome {
        match self
            .run_phase(Phase::Setup, scenario.setup(), variables, reports)
            .await
        {
            PhaseOutcome::Completed => {
                self.run_phase(Phase::Main, scenario.steps(), variables, reports)
                    .await
            }
            other => {
                skip_all(Phase::Main, scenario.steps(), reports);
                other
            }
        }
    }

    async fn begin(&self, result: &mut ScenarioResult, total_steps: usize) {
        info!("Starting scenario: {} ({})", result.scenario, result.execution_id);
        result.start();
        self.emit_event(ExecutionEvent::ScenarioStarted {
            execution_id: result.execution_id,
            scenario: result.scenario.clone(),
            total_steps,
        })
        .await;
    }

    async fn finish(&self, result: &mut ScenarioResult, outcome: PhaseOutcome) {
        let cancelled = match outcome {
            PhaseOutcome::Failed(cause) => {
                result.record_failure(cause);
                false
            }
            PhaseOutcome::Cancelled => true,
            PhaseOutcome::Completed => false,
        };
        result.finish(cancelled);

        info!("Scenario finished: {} - {:?}", result.scenario, result.status);
        self.emit_event(ExecutionEvent::ScenarioCompleted {
            execution_id: result.execution_id,
            scenario: result.scenario.clone(),
            status: result.status,
        })
        .await;
    }

    /// Run steps in order until one fails or the run is interrupted
    async fn run_phase(
        &self,
        phase: Phase,
        steps: &[Step],
        context: &mut VariableContext,
        reports: &mut Vec<StepReport>,
    ) -> PhaseOutcome {
        for (index, step) in steps.iter().enumerate() {
            if self.is_interrupted() {
                warn!("Run interrupted before {} step {}", phase, index);
                skip_from(phase, steps, index, reports);
                return PhaseOutcome::Cancelled;
            }

            let description = step.description();
            self.emit_event(ExecutionEvent::StepStarted {
                phase,
                index,
                action: step.action.name(),
                description: description.clone(),
            })
            .await;

            let started = Instant::now();
            let outcome = self.executor.execute(step, context).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match outcome {
                StepOutcome::Passed { warnings } => {
                    for warning in &warnings {
                        self.emit_event(ExecutionEvent::StepWarning {
                            phase,
                            index,
                            warning: warning.clone(),
                        })
                        .await;
                    }
                    reports.push(StepReport::passed(
                        phase,
                        index,
                        description.clone(),
                        warnings,
                        duration_ms,
                    ));
                    self.emit_event(ExecutionEvent::StepPassed {
                        phase,
                        index,
                        description,
                        duration_ms,
                    })
                    .await;
                }
                StepOutcome::Failed { error } => {
                    reports.push(StepReport::failed(
                        phase,
                        index,
                        description.clone(),
                        &error,
                        duration_ms,
                    ));
                    self.emit_event(ExecutionEvent::StepFailed {
                        phase,
                        index,
                        description: description.clone(),
                        kind: error.kind(),
                        error: error.to_string(),
                    })
                    .await;

                    skip_from(phase, steps, index + 1, reports);

                    return PhaseOutcome::Failed(FailureCause {
                        phase,
                        step_index: index,
                        locator: description,
                        kind: error.kind(),
                        message: error.to_string(),
                    });
                }
            }
        }

        PhaseOutcome::Completed
    }
}

/// Report every step as not run
fn skip_all(phase: Phase, steps: &[Step], reports: &mut Vec<StepReport>) {
    skip_from(phase, steps, 0, reports);
}

fn skip_scenario(scenario: &Scenario, reports: &mut Vec<StepReport>) {
    skip_all(Phase::Setup, scenario.setup(), reports);
    skip_all(Phase::Main, scenario.steps(), reports);
}

/// Report `steps[first..]` as not run, keeping their indices
fn skip_from(phase: Phase, steps: &[Step], first: usize, reports: &mut Vec<StepReport>) {
    reports.extend(
        steps
            .iter()
            .enumerate()
            .skip(first)
            .map(|(index, step)| StepReport::not_run(phase, index, step.description())),
    );
}
