//! Typed plan model
//!
//! A plan is produced by an external authoring process as JSON, checked by the
//! guardrail validator, and then handed to the interpreter one scenario at a
//! time. Nothing in here mutates a plan after it has been loaded.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Sentinel test id used by plan producers that could not find a stable locator.
pub const UNKNOWN_TEST_ID: &str = "UNKNOWN_TEST_ID";

/// Target application kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum App {
    Web,
    Mobile,
}

impl App {
    pub fn as_str(&self) -> &'static str {
        match self {
            App::Web => "web",
            App::Mobile => "mobile",
        }
    }
}

/// A complete test plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    pub app: App,

    /// Base URL relative `goto` targets are resolved against
    #[serde(rename = "baseUrl")]
    pub base_url: String,

    /// Feature under test
    pub feature: String,

    /// Scenarios in authoring order
    pub scenarios: Vec<Scenario>,
}

/// One named test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,

    /// Set by the producer when it could not author this scenario safely
    #[serde(rename = "needsHuman")]
    pub needs_human: bool,

    pub steps: Vec<Step>,
}

/// A single declarative action or assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", deny_unknown_fields)]
pub enum Step {
    /// Navigate the session to a URL
    Goto { url: String },

    /// Set the value of an element; the value may be a `${VAR}` placeholder
    Fill {
        #[serde(rename = "testId")]
        test_id: String,
        value: String,
    },

    /// Click an element
    Click {
        #[serde(rename = "testId")]
        test_id: String,
    },

    /// The current URL must match
    AssertUrlContains { contains: String },

    /// The element must be visible
    AssertVisible {
        #[serde(rename = "testId")]
        test_id: String,
    },

    /// The element's text must contain a substring
    AssertTextContains {
        #[serde(rename = "testId")]
        test_id: String,
        contains: String,
    },
}

impl Plan {
    /// Parse a plan from a JSON string without running any guardrails
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::from)
    }

    /// Look up a scenario by name
    pub fn scenario(&self, name: &str) -> Result<&Scenario> {
        self.scenarios
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::ScenarioNotFound {
                name: name.to_string(),
            })
    }
}

/// Resolve a `goto` target against a base URL.
///
/// Absolute URLs (anything carrying a `scheme://`) are returned as-is.
pub fn join_url(base: &str, url: &str) -> String {
    if url.contains("://") || base.is_empty() {
        return url.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
}

impl Scenario {
    /// Whether any step references the unknown-locator sentinel
    pub fn references_unknown_test_id(&self) -> bool {
        self.steps
            .iter()
            .any(|step| step.test_id() == Some(UNKNOWN_TEST_ID))
    }
}

impl Step {
    /// The variant tag as it appears in plan JSON
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Goto { .. } => "goto",
            Step::Fill { .. } => "fill",
            Step::Click { .. } => "click",
            Step::AssertUrlContains { .. } => "assertUrlContains",
            Step::AssertVisible { .. } => "assertVisible",
            Step::AssertTextContains { .. } => "assertTextContains",
        }
    }

    /// The stable test id this step locates, if any
    pub fn test_id(&self) -> Option<&str> {
        match self {
            Step::Fill { test_id, .. }
            | Step::Click { test_id }
            | Step::AssertVisible { test_id }
            | Step::AssertTextContains { test_id, .. } => Some(test_id),
            Step::Goto { .. } | Step::AssertUrlContains { .. } => None,
        }
    }
}

// Never includes fill values, which may carry resolved secrets.
impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Goto { url } => write!(f, "goto:{}", url),
            Step::AssertUrlContains { contains } => write!(f, "assertUrlContains:{}", contains),
            other => write!(f, "{}:{}", other.kind(), other.test_id().unwrap_or_default()),
        }
    }
}
