//! Locators - how a step finds the element it acts on
//!
//! A [`Target`] is a priority-ordered list of [`Locator`]s. Structural
//! locators are answered by the page session (role, text, placeholder,
//! CSS, ...); semantic locators are free-text descriptions answered by the
//! semantic resolver. The runner tries them in order, see
//! `execution::resolve`.

use crate::core::{context::VariableContext, error::{DeclarationError, StepError}};
use regex::{Regex, RegexBuilder};
use std::fmt;

/// How text in the page is matched (not serializable due to Regex)
#[derive(Debug, Clone)]
pub enum TextMatcher {
    /// Whole-string match after trimming surrounding whitespace
    Exact(String),
    /// Regular expression search. `regex` stays `None` while the source
    /// still holds `${var}` placeholders; it is compiled on substitution.
    Pattern {
        source: String,
        ignore_case: bool,
        regex: Option<Regex>,
    },
}

impl TextMatcher {
    pub fn exact(text: impl Into<String>) -> Self {
        TextMatcher::Exact(text.into())
    }

    /// Build a pattern matcher, compiling it unless it is still templated
    pub fn pattern(source: impl Into<String>, ignore_case: bool) -> Result<Self, StepError> {
        let source = source.into();
        let regex = if VariableContext::references(&source).is_empty() {
            Some(compile(&source, ignore_case)?)
        } else {
            None
        };

        Ok(TextMatcher::Pattern {
            source,
            ignore_case,
            regex,
        })
    }

    /// Check whether some page text satisfies this matcher
    pub fn matches(&self, text: &str) -> bool {
        match self {
            TextMatcher::Exact(expected) => text.trim() == expected.trim(),
            TextMatcher::Pattern { regex: Some(regex), .. } => regex.is_match(text),
            TextMatcher::Pattern { regex: None, .. } => false,
        }
    }

    /// Substitute `${var}` tokens in the matcher text
    pub fn substitute(&self, context: &VariableContext) -> Result<Self, StepError> {
        match self {
            TextMatcher::Exact(text) => Ok(TextMatcher::Exact(context.substitute(text)?)),
            TextMatcher::Pattern {
                source,
                ignore_case,
                regex,
            } => {
                if regex.is_some() {
                    return Ok(self.clone());
                }
                let source = context.substitute(source)?;
                let regex = compile(&source, *ignore_case)?;
                Ok(TextMatcher::Pattern {
                    source,
                    ignore_case: *ignore_case,
                    regex: Some(regex),
                })
            }
        }
    }
}

fn compile(source: &str, ignore_case: bool) -> Result<Regex, StepError> {
    RegexBuilder::new(source)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| StepError::InvalidPattern {
            pattern: source.to_string(),
            message: e.to_string(),
        })
}

impl PartialEq for TextMatcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TextMatcher::Exact(a), TextMatcher::Exact(b)) => a == b,
            (
                TextMatcher::Pattern {
                    source: a,
                    ignore_case: ai,
                    ..
                },
                TextMatcher::Pattern {
                    source: b,
                    ignore_case: bi,
                    ..
                },
            ) => a == b && ai == bi,
            _ => false,
        }
    }
}

impl fmt::Display for TextMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextMatcher::Exact(text) => write!(f, "{:?}", text),
            TextMatcher::Pattern {
                source,
                ignore_case,
                ..
            } => write!(f, "/{}/{}", source, if *ignore_case { "i" } else { "" }),
        }
    }
}

/// A query the page session can answer without any model in the loop
#[derive(Debug, Clone, PartialEq)]
pub enum StructuralQuery {
    /// ARIA role, optionally filtered by accessible name
    Role {
        role: String,
        name: Option<TextMatcher>,
    },
    /// Visible text content
    Text(TextMatcher),
    /// Input/textarea placeholder attribute
    Placeholder(TextMatcher),
    /// Form control by associated label text
    Label(TextMatcher),
    /// `data-testid` attribute
    TestId(String),
    /// Raw CSS selector
    Css(String),
}

impl StructuralQuery {
    pub fn role(role: impl Into<String>) -> Self {
        StructuralQuery::Role {
            role: role.into(),
            name: None,
        }
    }

    pub fn role_named(role: impl Into<String>, name: TextMatcher) -> Self {
        StructuralQuery::Role {
            role: role.into(),
            name: Some(name),
        }
    }

    pub fn substitute(&self, context: &VariableContext) -> Result<Self, StepError> {
        Ok(match self {
            StructuralQuery::Role { role, name } => StructuralQuery::Role {
                role: context.substitute(role)?,
                name: name.as_ref().map(|n| n.substitute(context)).transpose()?,
            },
            StructuralQuery::Text(m) => StructuralQuery::Text(m.substitute(context)?),
            StructuralQuery::Placeholder(m) => StructuralQuery::Placeholder(m.substitute(context)?),
            StructuralQuery::Label(m) => StructuralQuery::Label(m.substitute(context)?),
            StructuralQuery::TestId(id) => StructuralQuery::TestId(context.substitute(id)?),
            StructuralQuery::Css(css) => StructuralQuery::Css(context.substitute(css)?),
        })
    }
}

impl fmt::Display for StructuralQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralQuery::Role { role, name: Some(name) } => {
                write!(f, "role={}[name={}]", role, name)
            }
            StructuralQuery::Role { role, name: None } => write!(f, "role={}", role),
            StructuralQuery::Text(m) => write!(f, "text={}", m),
            StructuralQuery::Placeholder(m) => write!(f, "placeholder={}", m),
            StructuralQuery::Label(m) => write!(f, "label={}", m),
            StructuralQuery::TestId(id) => write!(f, "test-id={:?}", id),
            StructuralQuery::Css(css) => write!(f, "css={}", css),
        }
    }
}

/// One way of finding an element
#[derive(Debug, Clone, PartialEq)]
pub enum Locator {
    Structural(StructuralQuery),
    /// Natural-language description handed to the semantic resolver
    Semantic(String),
}

impl Locator {
    pub fn semantic(description: impl Into<String>) -> Self {
        Locator::Semantic(description.into())
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, Locator::Semantic(_))
    }

    pub fn substitute(&self, context: &VariableContext) -> Result<Self, StepError> {
        match self {
            Locator::Structural(query) => Ok(Locator::Structural(query.substitute(context)?)),
            Locator::Semantic(text) => Ok(Locator::Semantic(context.substitute(text)?)),
        }
    }
}

impl From<StructuralQuery> for Locator {
    fn from(query: StructuralQuery) -> Self {
        Locator::Structural(query)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Structural(query) => write!(f, "{}", query),
            Locator::Semantic(text) => write!(f, "{:?}", text),
        }
    }
}

/// Priority-ordered locators for one element; the first one is the primary
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    locators: Vec<Locator>,
}

impl Target {
    pub fn new(locators: Vec<Locator>) -> Result<Self, DeclarationError> {
        if locators.is_empty() {
            return Err(DeclarationError::EmptyTarget);
        }
        Ok(Self { locators })
    }

    /// Structural query first, semantic description as fallback
    pub fn with_fallback(primary: StructuralQuery, description: impl Into<String>) -> Self {
        Self {
            locators: vec![
                Locator::Structural(primary),
                Locator::Semantic(description.into()),
            ],
        }
    }

    pub fn structural(query: StructuralQuery) -> Self {
        Self {
            locators: vec![Locator::Structural(query)],
        }
    }

    pub fn semantic(description: impl Into<String>) -> Self {
        Self {
            locators: vec![Locator::Semantic(description.into())],
        }
    }

    pub fn primary(&self) -> &Locator {
        &self.locators[0]
    }

    pub fn locators(&self) -> &[Locator] {
        &self.locators
    }

    /// Human-readable description used in reports
    pub fn description(&self) -> String {
        self.locators
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub fn substitute(&self, context: &VariableContext) -> Result<Self, StepError> {
        let locators = self
            .locators
            .iter()
            .map(|l| l.substitute(context))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { locators })
    }
}
