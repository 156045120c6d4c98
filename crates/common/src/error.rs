//! Error types for Planguard

use thiserror::Error;

/// Result type alias using Planguard Error
pub type Result<T> = std::result::Result<T, Error>;

/// Planguard error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing required env var: {name}")]
    MissingEnvironmentVariable { name: String },

    #[error("Scenario not found: {name}")]
    ScenarioNotFound { name: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
