//! Three-phase plan validator

use std::collections::HashSet;
use std::path::Path;

use planguard_common::Plan;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{GuardrailError, GuardrailResult};
use crate::escalation::check_human_escalation;
use crate::scan::scan_banned_patterns;
use crate::schema::{PlanSchema, SchemaIssue};

/// Validates raw plan documents and yields the typed plan on success
pub struct Validator {
    schema: PlanSchema,
}

impl Validator {
    /// Validator backed by the embedded companion schema
    pub fn new() -> GuardrailResult<Self> {
        Ok(Self {
            schema: PlanSchema::embedded()?,
        })
    }

    /// Validator backed by a schema file on disk
    pub fn from_schema_file(path: &Path) -> GuardrailResult<Self> {
        Ok(Self {
            schema: PlanSchema::from_file(path)?,
        })
    }

    /// Run every phase against a parsed document
    pub fn validate(&self, document: &Value) -> GuardrailResult<Plan> {
        debug!("Guardrail phase 1: schema");
        self.schema.check(document)?;
        let plan: Plan = serde_json::from_value(document.clone()).map_err(|e| {
            GuardrailError::SchemaViolation(vec![SchemaIssue {
                path: String::new(),
                message: e.to_string(),
            }])
        })?;
        let duplicates = duplicate_scenario_names(&plan);
        if !duplicates.is_empty() {
            return Err(GuardrailError::SchemaViolation(duplicates));
        }

        debug!("Guardrail phase 2: heuristic scan");
        let hits = scan_banned_patterns(document);
        if !hits.is_empty() {
            return Err(GuardrailError::BannedPatternDetected(hits));
        }

        debug!("Guardrail phase 3: human escalation");
        check_human_escalation(&plan)?;

        info!(
            feature = %plan.feature,
            scenarios = plan.scenarios.len(),
            "Plan passed guardrails"
        );
        Ok(plan)
    }

    /// Parse and validate a JSON string; `source` names it in diagnostics
    pub fn validate_str(&self, json: &str, source: &str) -> GuardrailResult<Plan> {
        let document: Value = serde_json::from_str(json).map_err(|e| GuardrailError::Json {
            path: source.to_string(),
            source: e,
        })?;
        self.validate(&document)
    }

    /// Read, parse and validate a plan file
    pub fn validate_file(&self, path: &Path) -> GuardrailResult<Plan> {
        let content = std::fs::read_to_string(path).map_err(|source| GuardrailError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.validate_str(&content, &path.display().to_string())
    }
}

/// Scenario names are lookup keys; every repeat after the first is an issue
fn duplicate_scenario_names(plan: &Plan) -> Vec<SchemaIssue> {
    let mut seen = HashSet::new();
    plan.scenarios
        .iter()
        .enumerate()
        .filter(|(_, scenario)| !seen.insert(scenario.name.as_str()))
        .map(|(index, scenario)| SchemaIssue {
            path: format!("/scenarios/{}/name", index),
            message: format!("duplicate scenario name \"{}\"", scenario.name),
        })
        .collect()
}

/// Validate a parsed document against the embedded schema
pub fn validate(document: &Value) -> GuardrailResult<Plan> {
    Validator::new()?.validate(document)
}

/// Validate a plan file against the embedded schema
pub fn validate_file(path: &Path) -> GuardrailResult<Plan> {
    Validator::new()?.validate_file(path)
}
