//! Scenarios Command
//!
//! Lists the scenarios of a validated plan.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use planguard_common::Scenario;
use serde::Serialize;

use super::load_plan;
use crate::output::{print_error, print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ScenariosArgs {
    /// Path to the plan JSON file
    pub plan: PathBuf,

    /// JSON Schema to validate against instead of the built-in one
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Scenario summary for display
#[derive(Serialize, Clone)]
pub struct ScenarioInfo {
    pub name: String,
    pub steps: usize,
    pub needs_human: bool,
}

impl From<&Scenario> for ScenarioInfo {
    fn from(s: &Scenario) -> Self {
        Self {
            name: s.name.clone(),
            steps: s.steps.len(),
            needs_human: s.needs_human,
        }
    }
}

impl TableDisplay for ScenarioInfo {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Steps", "Needs Human"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.steps.to_string(),
            if self.needs_human { "yes" } else { "no" }.to_string(),
        ]
    }
}

pub async fn execute(args: ScenariosArgs) -> Result<bool> {
    let plan = match load_plan(&args.plan, args.schema.as_deref()) {
        Ok(plan) => plan,
        Err(e) => {
            print_error(&format!("Plan validation failed: {}", e));
            return Ok(false);
        }
    };

    let scenarios: Vec<ScenarioInfo> = plan.scenarios.iter().map(ScenarioInfo::from).collect();
    print_list(&scenarios, args.format);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::render_table;

    #[test]
    fn test_scenario_row() {
        let info = ScenarioInfo {
            name: "Successful login".to_string(),
            steps: 6,
            needs_human: true,
        };
        assert_eq!(info.row(), vec!["Successful login", "6", "yes"]);

        let table = render_table(&[info]).to_string();
        assert!(table.contains("Needs Human"));
        assert!(table.contains("Successful login"));
    }
}
