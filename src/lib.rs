//! Athena query runner - bounded SQL execution against a remote query service.
//!
//! This library exposes the core modules for use by the binary and in
//! integration tests.

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod query;
pub mod safety;
pub mod service;
