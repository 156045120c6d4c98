//! Plan runner: validate once, then execute scenarios and record results

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use planguard_common::{App, EnvSource, Plan, ProcessEnv, Scenario};
use planguard_guardrail::Validator;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::driver::Driver;
use crate::error::{E2eError, E2eResult};
use crate::interpreter::{Interpreter, StepRecord};
use crate::playwright::{PlaywrightConfig, PlaywrightSession};

/// Opens one fresh driver session per scenario
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: Driver;

    async fn open(&self, plan: &Plan) -> E2eResult<Self::Session>;
}

/// Sessions backed by a local Playwright install
pub struct PlaywrightFactory {
    config: PlaywrightConfig,
}

impl PlaywrightFactory {
    pub fn new(config: PlaywrightConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for PlaywrightFactory {
    type Session = PlaywrightSession;

    async fn open(&self, plan: &Plan) -> E2eResult<PlaywrightSession> {
        if plan.app != App::Web {
            return Err(E2eError::UnsupportedApp(plan.app.as_str().to_string()));
        }
        PlaywrightSession::launch(&self.config).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    /// Abstained because the producer flagged the scenario for review
    NeedsHuman,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub status: ScenarioStatus,
    pub duration_ms: u64,
    pub steps: Vec<StepRecord>,
    /// Zero-based index of the step that failed
    pub failed_step: Option<usize>,
    pub error: Option<String>,
}

impl ScenarioResult {
    pub fn success(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }
}

/// Result of running every scenario in a plan
#[derive(Debug, Clone, Serialize)]
pub struct SuiteResult {
    pub feature: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub needs_human: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    /// Tally `results` in the order given
    pub fn from_results(feature: &str, results: Vec<ScenarioResult>, duration_ms: u64) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        Self {
            feature: feature.to_string(),
            total: results.len(),
            passed: count(ScenarioStatus::Passed),
            failed: count(ScenarioStatus::Failed),
            needs_human: count(ScenarioStatus::NeedsHuman),
            duration_ms,
            results,
        }
    }

    /// Every scenario ran and passed
    pub fn success(&self) -> bool {
        self.failed == 0 && self.needs_human == 0
    }
}

/// Configuration for the plan runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub plan_path: PathBuf,

    /// Overrides the embedded plan schema
    pub schema_path: Option<PathBuf>,

    pub playwright: PlaywrightConfig,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            plan_path: PathBuf::from("ai/plan.json"),
            schema_path: None,
            playwright: PlaywrightConfig::default(),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Validates a plan file and runs its scenarios
pub struct PlanRunner<F = PlaywrightFactory> {
    config: RunnerConfig,
    factory: F,
    env: Arc<dyn EnvSource + Send + Sync>,
    plan: Option<Plan>,
}

impl PlanRunner<PlaywrightFactory> {
    /// Runner using Playwright sessions from `config.playwright`
    pub fn with_config(config: RunnerConfig) -> Self {
        let factory = PlaywrightFactory::new(config.playwright.clone());
        Self::with_factory(config, factory)
    }
}

impl<F: SessionFactory> PlanRunner<F> {
    pub fn with_factory(config: RunnerConfig, factory: F) -> Self {
        Self {
            config,
            factory,
            env: Arc::new(ProcessEnv),
            plan: None,
        }
    }

    /// Resolve `${VAR}` placeholders from `env` instead of the process environment
    pub fn with_env(mut self, env: impl EnvSource + Send + Sync + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Validate the plan file; later calls reuse the validated plan
    pub fn load(&mut self) -> E2eResult<&Plan> {
        let plan = match self.plan.take() {
            Some(plan) => plan,
            None => {
                let validator = match &self.config.schema_path {
                    Some(path) => Validator::from_schema_file(path)?,
                    None => Validator::new()?,
                };
                let plan = validator.validate_file(&self.config.plan_path)?;
                info!(
                    plan = %self.config.plan_path.display(),
                    feature = %plan.feature,
                    "Plan validation passed"
                );
                plan
            }
        };
        Ok(self.plan.insert(plan))
    }

    /// Run one scenario by name
    pub async fn run_scenario(&mut self, name: &str) -> E2eResult<ScenarioResult> {
        let plan = self.load()?.clone();
        let scenario = plan.scenario(name).map_err(|_| E2eError::ScenarioNotFound {
            name: name.to_string(),
        })?;
        Ok(self.execute(&plan, scenario).await)
    }

    /// Run every scenario in plan order
    pub async fn run_all(&mut self) -> E2eResult<SuiteResult> {
        let plan = self.load()?.clone();
        let start = Instant::now();

        info!("Running {} scenario(s)...", plan.scenarios.len());

        let mut results = Vec::with_capacity(plan.scenarios.len());
        for scenario in &plan.scenarios {
            results.push(self.execute(&plan, scenario).await);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let suite = SuiteResult::from_results(&plan.feature, results, duration_ms);
        info!(
            "Scenario results: {} passed, {} failed, {} need human review ({} ms)",
            suite.passed, suite.failed, suite.needs_human, suite.duration_ms
        );
        Ok(suite)
    }

    /// Write results to `plan-results.json` under the output directory
    pub fn write_results(&self, suite: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("plan-results.json");
        let json = serde_json::to_string_pretty(suite)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }

    async fn execute(&self, plan: &Plan, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();

        // Abstain before a browser is ever launched.
        if scenario.needs_human {
            let err = E2eError::HumanReviewRequired {
                scenario: scenario.name.clone(),
            };
            warn!("⚠ {}", err);
            return ScenarioResult {
                name: scenario.name.clone(),
                status: ScenarioStatus::NeedsHuman,
                duration_ms: 0,
                steps: vec![],
                failed_step: None,
                error: Some(err.to_string()),
            };
        }

        let outcome = match self.factory.open(plan).await {
            Ok(mut session) => {
                let interpreter =
                    Interpreter::with_env(Arc::clone(&self.env)).base_url(plan.base_url.clone());
                let outcome = interpreter.run(&mut session, scenario).await;
                if let Err(e) = session.close().await {
                    warn!("Failed to close session for '{}': {}", scenario.name, e);
                }
                outcome
            }
            Err(e) => Err(e),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(report) => {
                info!("✓ {} ({} ms)", scenario.name, duration_ms);
                ScenarioResult {
                    name: scenario.name.clone(),
                    status: ScenarioStatus::Passed,
                    duration_ms,
                    steps: report.steps,
                    failed_step: None,
                    error: None,
                }
            }
            Err(e) => {
                error!("✗ {} - {}", scenario.name, e);
                ScenarioResult {
                    name: scenario.name.clone(),
                    status: ScenarioStatus::Failed,
                    duration_ms,
                    steps: vec![],
                    failed_step: e.step_index(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
