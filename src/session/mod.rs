//! Collaborators the runner drives: the live page and the semantic resolver

pub mod bridge;
pub mod config;
pub mod error;
pub mod protocol;

use crate::core::locator::StructuralQuery;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use bridge::DriverBridge;
pub use config::BridgeConfig;
pub use error::SessionError;

/// Opaque reference to an element in the live page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Answer of the semantic resolver to an assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub passed: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Verdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: Some(reason.into()),
        }
    }
}

/// The live browser page
///
/// `find` returns `Ok(None)` when nothing currently matches; errors are
/// reserved for the driver itself failing.
#[async_trait]
pub trait PageSession: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), SessionError>;

    /// Answer a structural query (role, text, placeholder, CSS, ...)
    async fn find(&self, query: &StructuralQuery) -> Result<Option<ElementHandle>, SessionError>;

    async fn is_visible(&self, element: &ElementHandle) -> Result<bool, SessionError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), SessionError>;

    /// Clear the element, then type `value`
    async fn set_value(&self, element: &ElementHandle, value: &str) -> Result<(), SessionError>;

    /// Resolve once no request has been in flight for `quiet`.
    /// May never resolve; callers bound it.
    async fn wait_for_network_idle(&self, quiet: Duration) -> Result<(), SessionError>;
}

/// Natural-language element location and page assertions
#[async_trait]
pub trait SemanticResolver: Send + Sync {
    async fn locate(&self, description: &str) -> Result<Option<ElementHandle>, SessionError>;

    /// Evaluate a condition against the current page state
    async fn assert(&self, condition: &str) -> Result<Verdict, SessionError>;

    /// Wait until the condition holds; `Ok(false)` if it never did within `timeout`
    async fn wait_for(&self, condition: &str, timeout: Duration) -> Result<bool, SessionError>;
}

#[async_trait]
impl<T: PageSession + ?Sized> PageSession for Arc<T> {
    async fn goto(&self, url: &str) -> Result<(), SessionError> {
        (**self).goto(url).await
    }

    async fn find(&self, query: &StructuralQuery) -> Result<Option<ElementHandle>, SessionError> {
        (**self).find(query).await
    }

    async fn is_visible(&self, element: &ElementHandle) -> Result<bool, SessionError> {
        (**self).is_visible(element).await
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), SessionError> {
        (**self).click(element).await
    }

    async fn set_value(&self, element: &ElementHandle, value: &str) -> Result<(), SessionError> {
        (**self).set_value(element, value).await
    }

    async fn wait_for_network_idle(&self, quiet: Duration) -> Result<(), SessionError> {
        (**self).wait_for_network_idle(quiet).await
    }
}

#[async_trait]
impl<T: SemanticResolver + ?Sized> SemanticResolver for Arc<T> {
    async fn locate(&self, description: &str) -> Result<Option<ElementHandle>, SessionError> {
        (**self).locate(description).await
    }

    async fn assert(&self, condition: &str) -> Result<Verdict, SessionError> {
        (**self).assert(condition).await
    }

    async fn wait_for(&self, condition: &str, timeout: Duration) -> Result<bool, SessionError> {
        (**self).wait_for(condition, timeout).await
    }
}

/// Explicit handle to the page and resolver a run works against
#[derive(Debug)]
pub struct Session<P, R> {
    page: P,
    resolver: R,
}

impl<P: PageSession, R: SemanticResolver> Session<P, R> {
    pub fn new(page: P, resolver: R) -> Self {
        Self { page, resolver }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn into_parts(self) -> (P, R) {
        (self.page, self.resolver)
    }
}

impl Session<Arc<DriverBridge>, Arc<DriverBridge>> {
    /// One driver process serving as both page and resolver
    pub fn from_bridge(bridge: DriverBridge) -> Self {
        let bridge = Arc::new(bridge);
        Self::new(bridge.clone(), bridge)
    }
}
