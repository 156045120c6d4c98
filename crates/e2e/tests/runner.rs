//! Plan runner: validation, scenario selection and result files

mod support;

use std::path::Path;

use planguard_common::EnvSnapshot;
use planguard_e2e::{
    E2eError, PlanRunner, PlaywrightConfig, RunnerConfig, ScenarioStatus,
};
use planguard_guardrail::GuardrailError;
use tempfile::TempDir;

use support::{login_page, FakeFactory, LOGIN_PLAN};

fn write_plan(dir: &Path, json: &str) -> RunnerConfig {
    let plan_path = dir.join("plan.json");
    std::fs::write(&plan_path, json).unwrap();
    RunnerConfig {
        plan_path,
        output_dir: dir.join("results"),
        ..Default::default()
    }
}

fn runner(config: RunnerConfig, factory: FakeFactory) -> PlanRunner<FakeFactory> {
    let env: EnvSnapshot = [("USER", "standard_user"), ("PASS", "secret_sauce")]
        .into_iter()
        .collect();
    PlanRunner::with_factory(config, factory).with_env(env)
}

#[tokio::test]
async fn test_run_scenario_by_name() {
    let tmp = TempDir::new().unwrap();
    let factory = FakeFactory::new(login_page());
    let mut runner = runner(write_plan(tmp.path(), LOGIN_PLAN), factory.clone());

    let result = runner.run_scenario("Successful login").await.unwrap();

    assert!(result.success());
    assert_eq!(result.steps.len(), 6);
    assert_eq!(factory.opened(), 1);
    assert_eq!(factory.calls().last().map(String::as_str), Some("close"));
}

#[tokio::test]
async fn test_unknown_scenario_fails_before_session_opens() {
    let tmp = TempDir::new().unwrap();
    let factory = FakeFactory::new(login_page());
    let mut runner = runner(write_plan(tmp.path(), LOGIN_PLAN), factory.clone());

    let err = runner.run_scenario("Checkout").await.unwrap_err();

    assert!(matches!(err, E2eError::ScenarioNotFound { ref name } if name == "Checkout"));
    assert_eq!(factory.opened(), 0);
}

#[tokio::test]
async fn test_run_all_counts_outcomes() {
    let tmp = TempDir::new().unwrap();
    let factory = FakeFactory::new(login_page());
    let mut runner = runner(write_plan(tmp.path(), LOGIN_PLAN), factory.clone());

    let suite = runner.run_all().await.unwrap();

    assert_eq!(suite.feature, "Login");
    assert_eq!(suite.total, 3);
    assert_eq!(suite.passed, 2);
    assert_eq!(suite.failed, 0);
    assert_eq!(suite.needs_human, 1);
    assert!(!suite.success());

    // Flagged scenarios never get a browser.
    assert_eq!(factory.opened(), 2);
    assert_eq!(suite.results[2].status, ScenarioStatus::NeedsHuman);
    assert!(suite.results[2].error.as_deref().unwrap().contains("needsHuman"));
}

#[tokio::test]
async fn test_failed_scenario_reports_step() {
    let tmp = TempDir::new().unwrap();
    let factory = FakeFactory::new(login_page());
    let env: EnvSnapshot = [("USER", "standard_user"), ("PASS", "wrong")].into_iter().collect();
    let mut runner =
        PlanRunner::with_factory(write_plan(tmp.path(), LOGIN_PLAN), factory.clone()).with_env(env);

    let result = runner.run_scenario("Successful login").await.unwrap();

    assert_eq!(result.status, ScenarioStatus::Failed);
    assert_eq!(result.failed_step, Some(4));
    assert!(result.error.as_deref().unwrap().contains("inventory"));
    // The session is closed even when a step fails.
    assert_eq!(factory.calls().last().map(String::as_str), Some("close"));
}

#[tokio::test]
async fn test_write_results() {
    let tmp = TempDir::new().unwrap();
    let factory = FakeFactory::new(login_page());
    let mut runner = runner(write_plan(tmp.path(), LOGIN_PLAN), factory);

    let suite = runner.run_all().await.unwrap();
    let path = runner.write_results(&suite).unwrap();

    assert_eq!(path, tmp.path().join("results").join("plan-results.json"));
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["total"], 3);
    assert_eq!(written["needs_human"], 1);
    assert_eq!(written["results"][0]["status"], "passed");
    assert_eq!(written["results"][2]["status"], "needs_human");
    assert!(!written.to_string().contains("secret_sauce"));
}

#[tokio::test]
async fn test_rejected_plan_never_opens_session() {
    let tmp = TempDir::new().unwrap();
    let factory = FakeFactory::new(login_page());
    let unflagged = LOGIN_PLAN.replace(r#""needsHuman": true"#, r#""needsHuman": false"#);
    let mut runner = runner(write_plan(tmp.path(), &unflagged), factory.clone());

    let err = runner.run_all().await.unwrap_err();

    assert!(matches!(
        err,
        E2eError::Guardrail(GuardrailError::InconsistentHumanFlag(_))
    ));
    assert_eq!(factory.opened(), 0);
}

#[tokio::test]
async fn test_mobile_plan_unsupported_by_playwright() {
    let tmp = TempDir::new().unwrap();
    let mobile = LOGIN_PLAN.replace(r#""app": "web""#, r#""app": "mobile""#);
    let config = RunnerConfig {
        playwright: PlaywrightConfig::default(),
        ..write_plan(tmp.path(), &mobile)
    };
    let mut runner = PlanRunner::with_config(config);

    let result = runner.run_scenario("Successful login").await.unwrap();

    assert_eq!(result.status, ScenarioStatus::Failed);
    assert!(result.error.as_deref().unwrap().contains("mobile"));
}
