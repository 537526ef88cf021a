//! Step executor - runs individual steps against the session

use crate::{
    core::{Action, StepDefaults, Step, StepError, StepWarning, VariableContext},
    execution::resolve::{resolve_target, wait_until_visible},
    session::{PageSession, SemanticResolver, Session, SessionError},
};
use std::collections::HashMap;
use std::future::Future;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, error, info, warn};

/// Result of executing a step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The action completed; warnings are non-fatal degradations
    Passed { warnings: Vec<StepWarning> },
    /// The step failed; the scenario must stop here
    Failed { error: StepError },
}

impl StepOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, StepOutcome::Passed { .. })
    }
}

/// Executes a single step
pub struct StepExecutor<P, R> {
    session: Session<P, R>,
    defaults: StepDefaults,
}

impl<P: PageSession, R: SemanticResolver> StepExecutor<P, R> {
    pub fn new(session: Session<P, R>, defaults: StepDefaults) -> Self {
        Self { session, defaults }
    }

    pub fn session(&self) -> &Session<P, R> {
        &self.session
    }

    pub fn defaults(&self) -> &StepDefaults {
        &self.defaults
    }

    /// Execute a step and return the outcome
    ///
    /// `context` is only modified by `set_variables` steps.
    pub async fn execute(&self, step: &Step, context: &mut VariableContext) -> StepOutcome {
        info!("Executing step: {} ({})", step.description(), step.action.name());

        match self.perform(step, context).await {
            Ok(warnings) => StepOutcome::Passed { warnings },
            Err(error) => {
                error!("Step {} failed: {}", step.description(), error);
                StepOutcome::Failed { error }
            }
        }
    }

    async fn perform(
        &self,
        step: &Step,
        context: &mut VariableContext,
    ) -> Result<Vec<StepWarning>, StepError> {
        let limit = step.timeout(&self.defaults);
        let page = self.session.page();
        let resolver = self.session.resolver();
        let mut warnings = Vec::new();

        match &step.action {
            Action::Click { target } => {
                let target = target.substitute(context)?;
                let resolution = resolve_target(&self.session, &target, limit, &self.defaults).await?;
                bounded(
                    self.defaults.action_timeout,
                    &target.description(),
                    page.click(&resolution.element),
                )
                .await?;
            }
            Action::SetValue { target, value } => {
                let value = context.substitute(value)?;
                let target = target.substitute(context)?;
                debug!("Setting value on {}: {}", target.description(), value);
                let resolution = resolve_target(&self.session, &target, limit, &self.defaults).await?;
                bounded(
                    self.defaults.action_timeout,
                    &target.description(),
                    page.set_value(&resolution.element, &value),
                )
                .await?;
            }
            Action::WaitForVisible { target } => {
                let target = target.substitute(context)?;
                wait_until_visible(&self.session, &target, limit, &self.defaults).await?;
            }
            Action::Assert { condition } => {
                let condition = context.substitute(condition)?;
                let verdict = bounded(limit, &condition, resolver.assert(&condition)).await?;
                if !verdict.passed {
                    return Err(StepError::AssertionFailed {
                        condition,
                        reason: verdict.reason,
                    });
                }
            }
            Action::Goto { url } => {
                let url = context.substitute(url)?;
                bounded(limit, &url, page.goto(&url)).await?;
            }
            Action::Pause { duration } => {
                sleep(*duration).await;
            }
            Action::WaitFor { condition } => {
                let condition = context.substitute(condition)?;
                let met = bounded(limit, &condition, resolver.wait_for(&condition, limit)).await?;
                if !met {
                    return Err(StepError::Timeout {
                        what: condition,
                        timeout: limit,
                    });
                }
            }
            Action::WaitForNetworkIdle => {
                let ceiling = step
                    .options
                    .timeout
                    .unwrap_or(self.defaults.network_idle_timeout);
                warnings.extend(self.wait_network_idle(ceiling).await?);
            }
            Action::SetVariables {
                values,
                render_templates,
            } => {
                // Render everything first so a failure leaves the context untouched
                let mut rendered = HashMap::with_capacity(values.len());
                for (key, value) in values {
                    let value = if *render_templates {
                        context.substitute(value)?
                    } else {
                        value.clone()
                    };
                    rendered.insert(key.clone(), value);
                }
                debug!("Updating variables: {:?}", rendered.keys().collect::<Vec<_>>());
                context.update(rendered);
            }
        }

        if step.options.wait_network_idle_after_step {
            warnings.extend(self.wait_network_idle(self.defaults.network_idle_timeout).await?);
        }

        Ok(warnings)
    }

    /// Wait for network quiescence; running past `ceiling` only warns
    async fn wait_network_idle(&self, ceiling: Duration) -> Result<Option<StepWarning>, StepError> {
        let quiet = self.defaults.network_idle_quiet;
        match timeout(ceiling, self.session.page().wait_for_network_idle(quiet)).await {
            Ok(Ok(())) => Ok(None),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                let waited_ms = ceiling.as_millis() as u64;
                warn!("Network still busy after {}ms, continuing", waited_ms);
                Ok(Some(StepWarning::NetworkIdleTimeout { waited_ms }))
            }
        }
    }
}

/// Bound a collaborator call; running out of time is a `Timeout` failure
async fn bounded<T>(
    limit: Duration,
    what: &str,
    call: impl Future<Output = Result<T, SessionError>>,
) -> Result<T, StepError> {
    match timeout(limit, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(StepError::Timeout {
            what: what.to_string(),
            timeout: limit,
        }),
    }
}
