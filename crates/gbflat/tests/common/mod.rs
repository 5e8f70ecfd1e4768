//! Shared helpers for gbflat integration tests

#![allow(dead_code)]

use std::path::PathBuf;

pub const FIXTURE_ID: &str = "JQ610684.1";

/// Initialize tracing for tests; later calls are no-ops
pub fn init_tracing() {
    use gbflat_common::logging::{init_logging, LogConfig};

    let _ = init_logging(&LogConfig::for_tests());
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Text of the JQ610684.1 fixture record
pub fn fixture_text() -> String {
    std::fs::read_to_string(fixture_path("JQ610684.1.gbk")).expect("Failed to read fixture")
}
