//! Planguard Guardrails
//!
//! Static checks applied to an AI-authored plan before any browser action
//! runs. Validation happens in three ordered phases and the first failing
//! phase stops the pipeline:
//!
//! ```text
//! ┌──────────────┐    ┌──────────────────┐    ┌────────────────────┐
//! │ schema phase │ -> │ heuristic scan   │ -> │ human escalation   │ -> Plan
//! │ (jsonschema) │    │ (every str leaf) │    │ (UNKNOWN_TEST_ID)  │
//! └──────────────┘    └──────────────────┘    └────────────────────┘
//! ```

pub mod error;
pub mod escalation;
pub mod scan;
pub mod schema;
pub mod validator;

pub use error::{GuardrailError, GuardrailResult};
pub use scan::{scan_banned_patterns, BannedPattern, PatternHit, BANNED_PATTERNS};
pub use schema::{PlanSchema, SchemaIssue, PLAN_SCHEMA};
pub use validator::{validate, validate_file, Validator};
