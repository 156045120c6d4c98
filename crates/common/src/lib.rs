//! Planguard Common Library
//!
//! The typed plan model shared by the guardrail validator and the scenario
//! interpreter, plus `${VAR}` environment substitution for step values.

pub mod env;
pub mod error;
pub mod plan;

// Re-export commonly used types
pub use env::{placeholder_name, substitute_env, EnvSnapshot, EnvSource, ProcessEnv};
pub use error::{Error, Result};
pub use plan::{join_url, App, Plan, Scenario, Step, UNKNOWN_TEST_ID};
