//! Error types for scenario execution

use planguard_guardrail::GuardrailError;
use thiserror::Error;

/// Failure of a single driver primitive
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Driver error: {0}")]
    Backend(String),

    #[error("Driver protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Why a step did not complete
#[derive(Error, Debug)]
pub enum StepFailure {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("Assertion failed: {0}")]
    Assertion(String),
}

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Scenario \"{scenario}\" is marked needsHuman=true (UNKNOWN_TEST_ID or incomplete selectors)")]
    HumanReviewRequired { scenario: String },

    #[error("Scenario not found: {name}")]
    ScenarioNotFound { name: String },

    #[error("Missing required env var: {name} (used in step {index} `{step}` of scenario \"{scenario}\")")]
    MissingEnvironmentVariable {
        name: String,
        scenario: String,
        index: usize,
        step: String,
    },

    #[error("Step failed: scenario \"{scenario}\" step {index} `{step}` - {cause}")]
    StepExecutionFailure {
        scenario: String,
        index: usize,
        step: String,
        #[source]
        cause: StepFailure,
    },

    #[error("Unsupported app kind for this driver: {0}")]
    UnsupportedApp(String),

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Driver session error: {0}")]
    Session(#[from] DriverError),

    #[error("Plan rejected by guardrails: {0}")]
    Guardrail(#[from] GuardrailError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl E2eError {
    /// Zero-based position of the failing step, when a step failed
    pub fn step_index(&self) -> Option<usize> {
        match self {
            E2eError::MissingEnvironmentVariable { index, .. }
            | E2eError::StepExecutionFailure { index, .. } => Some(*index),
            _ => None,
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
