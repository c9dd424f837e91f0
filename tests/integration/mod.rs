//! Integration tests for the query runner.

pub mod config_test;
pub mod run_test;
