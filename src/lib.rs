//! testman: a declarative HTTP API contract test harness.
//!
//! Scenarios are ordered setup/check/teardown step sequences issued against
//! external REST APIs. Each check captures one HTTP response and evaluates a
//! list of declarative assertions against it; results aggregate into exact
//! pass/fail tallies rendered as a human listing, a JSON report file, and
//! optionally an HTML page.

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod suite;
pub mod testing;
