//! Scenario interpreter
//!
//! Walks a validated scenario's steps strictly in order and dispatches each to
//! a driver primitive. The first failing step aborts the scenario; nothing is
//! retried and nothing is rolled back.

use std::time::Instant;

use planguard_common::{join_url, EnvSource, Error as CommonError, ProcessEnv, Scenario, Step};
use serde::Serialize;
use tracing::{debug, info};

use crate::driver::{Driver, ElementHandle, UrlPattern};
use crate::error::{DriverError, E2eError, E2eResult, StepFailure};

/// A step that completed
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub index: usize,
    /// Display form of the step; never carries fill values
    pub step: String,
    pub duration_ms: u64,
}

/// Outcome of a fully successful scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub steps: Vec<StepRecord>,
    pub duration_ms: u64,
}

/// Executes scenarios against a driver session
pub struct Interpreter<E = ProcessEnv> {
    env: E,
    base_url: Option<String>,
}

impl<E: EnvSource + Sync> Interpreter<E> {
    pub fn with_env(env: E) -> Self {
        Self { env, base_url: None }
    }

    /// Resolve relative `goto` targets against this base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Run every step of `scenario` in order.
    ///
    /// A scenario flagged `needsHuman` is refused before the session is touched.
    pub async fn run<D: Driver>(
        &self,
        session: &mut D,
        scenario: &Scenario,
    ) -> E2eResult<ScenarioReport> {
        if scenario.needs_human {
            return Err(E2eError::HumanReviewRequired {
                scenario: scenario.name.clone(),
            });
        }

        info!(scenario = %scenario.name, steps = scenario.steps.len(), "Running scenario");
        let start = Instant::now();
        let mut records = Vec::with_capacity(scenario.steps.len());

        for (index, step) in scenario.steps.iter().enumerate() {
            let step_start = Instant::now();
            debug!(index, step = %step, "Executing step");

            self.execute_step(session, step)
                .await
                .map_err(|e| e.into_error(scenario, index, step))?;

            records.push(StepRecord {
                index,
                step: step.to_string(),
                duration_ms: step_start.elapsed().as_millis() as u64,
            });
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(scenario = %scenario.name, duration_ms, "Scenario passed");

        Ok(ScenarioReport {
            scenario: scenario.name.clone(),
            steps: records,
            duration_ms,
        })
    }

    // Adding a Step variant must extend this match; there is no catch-all arm.
    async fn execute_step<D: Driver>(&self, session: &mut D, step: &Step) -> Result<(), StepError> {
        match step {
            Step::Goto { url } => {
                let target = match &self.base_url {
                    Some(base) => join_url(base, url),
                    None => url.clone(),
                };
                session.navigate(&target).await?;
            }
            Step::Fill { test_id, value } => {
                let resolved = self.env.substitute(value).map_err(StepError::Env)?;
                let element = session.locate_by_stable_id(test_id).await?;
                element.set_value(&resolved).await?;
            }
            Step::Click { test_id } => {
                let element = session.locate_by_stable_id(test_id).await?;
                element.click().await?;
            }
            Step::AssertUrlContains { contains } => {
                let pattern = UrlPattern::parse(contains);
                if !session.url_matches(&pattern).await? {
                    let actual = session.current_url().await?;
                    return Err(StepFailure::Assertion(format!(
                        "expected URL to match /{}/, got {}",
                        pattern.as_str(),
                        actual
                    ))
                    .into());
                }
            }
            Step::AssertVisible { test_id } => {
                let element = session.locate_by_stable_id(test_id).await?;
                if !element.is_visible().await? {
                    let message = format!("element '{}' is not visible", test_id);
                    return Err(StepFailure::Assertion(message).into());
                }
            }
            Step::AssertTextContains { test_id, contains } => {
                let element = session.locate_by_stable_id(test_id).await?;
                if !element.text_contains(contains).await? {
                    return Err(StepFailure::Assertion(format!(
                        "element '{}' does not contain text \"{}\"",
                        test_id, contains
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }
}

enum StepError {
    Env(CommonError),
    Failure(StepFailure),
}

impl From<StepFailure> for StepError {
    fn from(e: StepFailure) -> Self {
        StepError::Failure(e)
    }
}

impl From<DriverError> for StepError {
    fn from(e: DriverError) -> Self {
        StepError::Failure(StepFailure::Driver(e))
    }
}

impl StepError {
    fn into_error(self, scenario: &Scenario, index: usize, step: &Step) -> E2eError {
        match self {
            StepError::Env(CommonError::MissingEnvironmentVariable { name }) => {
                E2eError::MissingEnvironmentVariable {
                    name,
                    scenario: scenario.name.clone(),
                    index,
                    step: step.to_string(),
                }
            }
            StepError::Env(other) => E2eError::StepExecutionFailure {
                scenario: scenario.name.clone(),
                index,
                step: step.to_string(),
                cause: StepFailure::Assertion(other.to_string()),
            },
            StepError::Failure(cause) => E2eError::StepExecutionFailure {
                scenario: scenario.name.clone(),
                index,
                step: step.to_string(),
                cause,
            },
        }
    }
}
