//! Planguard scenario execution
//!
//! This crate executes scenarios from a validated plan against a browser:
//! - Interprets each step as one driver primitive, strictly in order
//! - Resolves `${VAR}` placeholders in fill values at execution time
//! - Drives Chromium, Firefox or WebKit through a persistent Playwright bridge
//! - Refuses scenarios flagged `needsHuman` before a session is opened
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PlanRunner (Rust)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  load()            guardrail::Validator -> Plan             │
//! │  run_scenario()    SessionFactory::open -> Driver           │
//! │  run_all()           └── Interpreter::run(session, scenario)│
//! │  write_results()   plan-results.json                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Driver                                                     │
//! │    ├── navigate { url }                                     │
//! │    ├── locate_by_stable_id { testId } -> ElementHandle      │
//! │    │     ├── set_value / click                              │
//! │    │     └── is_visible / text_contains                     │
//! │    └── current_url / url_matches                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PlaywrightSession  node bridge, line-delimited JSON        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod driver;
pub mod error;
pub mod interpreter;
pub mod playwright;
pub mod runner;

pub use driver::{Driver, ElementHandle, UrlPattern};
pub use error::{DriverError, DriverResult, E2eError, E2eResult, StepFailure};
pub use interpreter::{Interpreter, ScenarioReport, StepRecord};
pub use playwright::{Browser, PlaywrightConfig, PlaywrightElement, PlaywrightSession};
pub use runner::{
    PlanRunner, PlaywrightFactory, RunnerConfig, ScenarioResult, ScenarioStatus, SessionFactory,
    SuiteResult,
};
