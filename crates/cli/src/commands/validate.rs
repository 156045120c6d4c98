//! Validate Command

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::load_plan;
use crate::output::{print_error, print_success};

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the plan JSON file
    pub plan: PathBuf,

    /// JSON Schema to validate against instead of the built-in one
    #[arg(long)]
    pub schema: Option<PathBuf>,
}

/// Returns whether the plan passed every guardrail
pub async fn execute(args: ValidateArgs) -> Result<bool> {
    match load_plan(&args.plan, args.schema.as_deref()) {
        Ok(_) => {
            print_success(&format!("Plan validation passed: {}", args.plan.display()));
            Ok(true)
        }
        Err(e) => {
            print_error(&format!("Plan validation failed: {}", e));
            Ok(false)
        }
    }
}
