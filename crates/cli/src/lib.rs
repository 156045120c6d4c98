//! Planguard CLI
//!
//! Command-line interface for validating AI-authored test plans and
//! running their scenarios.

pub mod commands;
pub mod output;
