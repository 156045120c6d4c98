//! Error types for plan validation

use std::fmt::Display;

use thiserror::Error;

use crate::scan::PatternHit;
use crate::schema::SchemaIssue;

#[derive(Error, Debug)]
pub enum GuardrailError {
    #[error("Schema errors: {}", join(.0))]
    SchemaViolation(Vec<SchemaIssue>),

    #[error("{}", join(.0))]
    BannedPatternDetected(Vec<PatternHit>),

    #[error("{}", unflagged(.0))]
    InconsistentHumanFlag(Vec<String>),

    #[error("Invalid plan schema: {0}")]
    SchemaCompile(String),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GuardrailError {
    /// Name of the validation phase that produced this error
    pub fn phase(&self) -> &'static str {
        match self {
            GuardrailError::SchemaViolation(_) => "schema",
            GuardrailError::BannedPatternDetected(_) => "heuristic scan",
            GuardrailError::InconsistentHumanFlag(_) => "human escalation",
            GuardrailError::SchemaCompile(_)
            | GuardrailError::Io { .. }
            | GuardrailError::Json { .. } => "input",
        }
    }
}

pub type GuardrailResult<T> = Result<T, GuardrailError>;

fn join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn unflagged(scenarios: &[String]) -> String {
    scenarios
        .iter()
        .map(|name| {
            format!(
                "Scenario \"{}\" contains UNKNOWN_TEST_ID but needsHuman is not true.",
                name
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}
