//! Target resolution - the primary-then-fallback locator race
//!
//! The primary locator is polled alone for the probe interval. After that,
//! every poll round tries each locator once in priority order and the first
//! one that resolves wins. Every collaborator call is bounded by what is
//! left of the step timeout.

use crate::core::{
    error::StepError,
    locator::{Locator, Target},
    step::StepDefaults,
};
use crate::session::{ElementHandle, PageSession, SemanticResolver, Session, SessionError};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

/// An element found for a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub element: ElementHandle,
    /// Position of the winning locator in the target
    pub locator_index: usize,
}

/// Resolve `target` within `limit`, or fail with `ElementNotFound`
pub async fn resolve_target<P, R>(
    session: &Session<P, R>,
    target: &Target,
    limit: Duration,
    defaults: &StepDefaults,
) -> Result<Resolution, StepError>
where
    P: PageSession,
    R: SemanticResolver,
{
    race(session, target, limit, defaults, false).await
}

/// Poll until some locator of `target` resolves to a visible element,
/// or fail with `Timeout` once `limit` has elapsed
pub async fn wait_until_visible<P, R>(
    session: &Session<P, R>,
    target: &Target,
    limit: Duration,
    defaults: &StepDefaults,
) -> Result<Resolution, StepError>
where
    P: PageSession,
    R: SemanticResolver,
{
    match race(session, target, limit, defaults, true).await {
        Err(StepError::ElementNotFound { .. }) => Err(StepError::Timeout {
            what: format!("{} to become visible", target.description()),
            timeout: limit,
        }),
        other => other,
    }
}

async fn race<P, R>(
    session: &Session<P, R>,
    target: &Target,
    limit: Duration,
    defaults: &StepDefaults,
    require_visible: bool,
) -> Result<Resolution, StepError>
where
    P: PageSession,
    R: SemanticResolver,
{
    let start = Instant::now();
    let deadline = start + limit;
    let probe_end = start + defaults.probe_interval.min(limit);

    // Primary alone
    loop {
        if let Some(element) =
            attempt(session, target.primary(), deadline, require_visible).await?
        {
            return Ok(Resolution {
                element,
                locator_index: 0,
            });
        }

        let now = Instant::now();
        if now >= probe_end {
            break;
        }
        sleep(defaults.poll_interval.min(probe_end - now)).await;
    }

    if target.locators().len() > 1 {
        debug!(
            "Primary locator {} unresolved after {}ms, racing fallbacks",
            target.primary(),
            start.elapsed().as_millis()
        );
    }

    // Every locator, in priority order, once per round
    loop {
        for (index, locator) in target.locators().iter().enumerate() {
            if Instant::now() >= deadline {
                return Err(not_found(target, limit));
            }
            if let Some(element) = attempt(session, locator, deadline, require_visible).await? {
                debug!("Resolved {} to {}", locator, element);
                return Ok(Resolution {
                    element,
                    locator_index: index,
                });
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(not_found(target, limit));
        }
        sleep(defaults.poll_interval.min(deadline - now)).await;
    }
}

fn not_found(target: &Target, limit: Duration) -> StepError {
    StepError::ElementNotFound {
        locator: target.primary().to_string(),
        timeout: limit,
    }
}

/// One lookup through the collaborator that owns the locator kind
async fn attempt<P, R>(
    session: &Session<P, R>,
    locator: &Locator,
    deadline: Instant,
    require_visible: bool,
) -> Result<Option<ElementHandle>, StepError>
where
    P: PageSession,
    R: SemanticResolver,
{
    let found = match locator {
        Locator::Structural(query) => bounded(deadline, session.page().find(query)).await?,
        Locator::Semantic(description) => {
            bounded(deadline, session.resolver().locate(description)).await?
        }
    };

    let Some(element) = found.flatten() else {
        return Ok(None);
    };

    if !require_visible {
        return Ok(Some(element));
    }

    match bounded(deadline, session.page().is_visible(&element)).await? {
        Some(true) => Ok(Some(element)),
        _ => Ok(None),
    }
}

/// Run a collaborator call with what is left of the budget. `Ok(None)`
/// means the budget ran out first.
async fn bounded<T>(
    deadline: Instant,
    call: impl Future<Output = Result<T, SessionError>>,
) -> Result<Option<T>, StepError> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    match timeout(remaining, call).await {
        Ok(result) => Ok(Some(result?)),
        Err(_) => Ok(None),
    }
}
