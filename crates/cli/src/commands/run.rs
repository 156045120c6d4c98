//! Run Command
//!
//! Validates a plan, executes one or all of its scenarios against a
//! Playwright session, and writes `plan-results.json`.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use planguard_e2e::{
    Browser, E2eError, PlanRunner, PlaywrightConfig, RunnerConfig, ScenarioStatus, SuiteResult,
};
use tracing::debug;

use crate::output::{print_error, print_success, print_warning};

#[derive(Args)]
pub struct RunArgs {
    /// Path to the plan JSON file
    pub plan: PathBuf,

    /// Run a single scenario by name
    #[arg(long, conflicts_with = "all", required_unless_present = "all")]
    pub scenario: Option<String>,

    /// Run every scenario in the plan
    #[arg(long)]
    pub all: bool,

    /// JSON Schema to validate against instead of the built-in one
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Browser engine (chromium, firefox, webkit)
    #[arg(long, env = "PLANGUARD_BROWSER", default_value = "chromium")]
    pub browser: Browser,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Timeout for every browser wait, in milliseconds
    #[arg(long, env = "PLANGUARD_TIMEOUT_MS", default_value = "5000")]
    pub timeout_ms: u64,

    /// Attribute carrying stable test ids
    #[arg(long, env = "PLANGUARD_TEST_ID_ATTRIBUTE", default_value = "data-testid")]
    pub test_id_attribute: String,

    /// Directory for plan-results.json
    #[arg(long, env = "PLANGUARD_OUTPUT_DIR", default_value = "test-results")]
    pub output: PathBuf,
}

impl RunArgs {
    fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            plan_path: self.plan.clone(),
            schema_path: self.schema.clone(),
            playwright: PlaywrightConfig {
                browser: self.browser,
                headless: !self.headed,
                timeout_ms: self.timeout_ms,
                test_id_attribute: self.test_id_attribute.clone(),
                ..Default::default()
            },
            output_dir: self.output.clone(),
        }
    }
}

/// Returns whether every scenario ran and passed
pub async fn execute(args: RunArgs) -> Result<bool> {
    let config = args.runner_config();
    debug!(?config, "Runner configuration");
    let mut runner = PlanRunner::with_config(config);

    let feature = match runner.load() {
        Ok(plan) => plan.feature.clone(),
        Err(E2eError::Guardrail(e)) => {
            print_error(&format!("Plan validation failed: {}", e));
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    let suite = match &args.scenario {
        Some(name) => {
            let start = Instant::now();
            let result = match runner.run_scenario(name).await {
                Ok(result) => result,
                Err(e @ E2eError::ScenarioNotFound { .. }) => {
                    print_error(&e.to_string());
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            };
            SuiteResult::from_results(&feature, vec![result], start.elapsed().as_millis() as u64)
        }
        None => runner.run_all().await?,
    };

    runner.write_results(&suite)?;
    report(&suite);
    Ok(suite.success())
}

fn report(suite: &SuiteResult) {
    for result in &suite.results {
        match result.status {
            ScenarioStatus::Passed => {
                print_success(&format!("{} ({} ms)", result.name, result.duration_ms))
            }
            ScenarioStatus::NeedsHuman => {
                print_warning(&format!("{} needs human review", result.name))
            }
            ScenarioStatus::Failed => print_error(&format!(
                "{} - {}",
                result.name,
                result.error.as_deref().unwrap_or("failed")
            )),
        }
    }

    println!(
        "{}: {} passed, {} failed, {} need human review",
        suite.feature, suite.passed, suite.failed, suite.needs_human
    );
}
