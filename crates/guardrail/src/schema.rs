//! Schema phase: structural validation against the plan JSON Schema

use std::fmt;
use std::path::Path;

use jsonschema::{Draft, JSONSchema};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{GuardrailError, GuardrailResult};

/// Companion schema shipped with the crate
pub const PLAN_SCHEMA: &str = include_str!("../schema/plan.schema.json");

/// One structural violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    /// JSON pointer to the offending instance; empty for the document root
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{}: {}", path, self.message)
    }
}

/// Compiled plan schema
pub struct PlanSchema {
    compiled: JSONSchema,
}

impl PlanSchema {
    /// Compile the embedded companion schema
    pub fn embedded() -> GuardrailResult<Self> {
        let schema: Value =
            serde_json::from_str(PLAN_SCHEMA).map_err(|source| GuardrailError::Json {
                path: "<embedded plan schema>".to_string(),
                source,
            })?;
        Self::compile(&schema)
    }

    /// Load and compile a schema file
    pub fn from_file(path: &Path) -> GuardrailResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| GuardrailError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let schema: Value = serde_json::from_str(&content).map_err(|source| GuardrailError::Json {
            path: path.display().to_string(),
            source,
        })?;
        debug!("Loaded plan schema from {}", path.display());
        Self::compile(&schema)
    }

    /// Compile a draft-07 schema document
    pub fn compile(schema: &Value) -> GuardrailResult<Self> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|e| GuardrailError::SchemaCompile(e.to_string()))?;
        Ok(Self { compiled })
    }

    /// Every structural violation in `instance`; empty when it conforms
    pub fn issues(&self, instance: &Value) -> Vec<SchemaIssue> {
        match self.compiled.validate(instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| SchemaIssue {
                    path: e.instance_path.to_string(),
                    message: e.to_string(),
                })
                .collect(),
        }
    }

    /// Fail with all violations at once
    pub fn check(&self, instance: &Value) -> GuardrailResult<()> {
        let issues = self.issues(instance);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(GuardrailError::SchemaViolation(issues))
        }
    }
}
