//! JSON-lines wire format spoken with the driver subprocess
//!
//! One request per line on the driver's stdin:
//! `{"id":1,"op":"find","query":{"by":"text","matcher":{"kind":"exact","text":"Send"}}}`
//!
//! One response per line on its stdout:
//! `{"id":1,"ok":true,"result":"e17"}` or `{"id":1,"ok":false,"error":"..."}`

use crate::core::locator::{StructuralQuery, TextMatcher};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WireMatcher {
    Exact { text: String },
    Pattern { source: String, ignore_case: bool },
}

impl From<&TextMatcher> for WireMatcher {
    fn from(matcher: &TextMatcher) -> Self {
        match matcher {
            TextMatcher::Exact(text) => WireMatcher::Exact { text: text.clone() },
            TextMatcher::Pattern {
                source,
                ignore_case,
                ..
            } => WireMatcher::Pattern {
                source: source.clone(),
                ignore_case: *ignore_case,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum WireQuery {
    Role {
        role: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<WireMatcher>,
    },
    Text { matcher: WireMatcher },
    Placeholder { matcher: WireMatcher },
    Label { matcher: WireMatcher },
    TestId { id: String },
    Css { selector: String },
}

impl From<&StructuralQuery> for WireQuery {
    fn from(query: &StructuralQuery) -> Self {
        match query {
            StructuralQuery::Role { role, name } => WireQuery::Role {
                role: role.clone(),
                name: name.as_ref().map(WireMatcher::from),
            },
            StructuralQuery::Text(m) => WireQuery::Text { matcher: m.into() },
            StructuralQuery::Placeholder(m) => WireQuery::Placeholder { matcher: m.into() },
            StructuralQuery::Label(m) => WireQuery::Label { matcher: m.into() },
            StructuralQuery::TestId(id) => WireQuery::TestId { id: id.clone() },
            StructuralQuery::Css(selector) => WireQuery::Css {
                selector: selector.clone(),
            },
        }
    }
}

/// Operations the driver understands
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Goto { url: String },
    Find { query: WireQuery },
    IsVisible { element: String },
    Click { element: String },
    SetValue { element: String, value: String },
    WaitForNetworkIdle { quiet_ms: u64 },
    Locate { description: String },
    Assert { condition: String },
    WaitFor { condition: String, timeout_ms: u64 },
    Close,
}

impl Request {
    pub fn op(&self) -> &'static str {
        match self {
            Request::Goto { .. } => "goto",
            Request::Find { .. } => "find",
            Request::IsVisible { .. } => "is_visible",
            Request::Click { .. } => "click",
            Request::SetValue { .. } => "set_value",
            Request::WaitForNetworkIdle { .. } => "wait_for_network_idle",
            Request::Locate { .. } => "locate",
            Request::Assert { .. } => "assert",
            Request::WaitFor { .. } => "wait_for",
            Request::Close => "close",
        }
    }
}

/// A request with its correlation id
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<'a> {
    pub id: u64,
    #[serde(flatten)]
    pub request: &'a Request,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    pub id: u64,
    pub ok: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<String>,
}
