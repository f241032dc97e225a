//! Smoketest harness for a running trading/signals service.
//!
//! Probes the service's HTTP endpoints, validates response bodies, checks that
//! its JSONL logs are growing and folds everything into one PASS/WARN/FAIL report.

pub mod core;
pub mod utils;
