//! CLI Commands

pub mod run;
pub mod scenarios;
pub mod validate;

use std::path::Path;

use planguard_common::Plan;
use planguard_guardrail::{GuardrailResult, Validator};

/// Validate `plan`, using `schema` instead of the embedded schema when given
pub fn load_plan(plan: &Path, schema: Option<&Path>) -> GuardrailResult<Plan> {
    let validator = match schema {
        Some(path) => Validator::from_schema_file(path)?,
        None => Validator::new()?,
    };
    validator.validate_file(plan)
}
