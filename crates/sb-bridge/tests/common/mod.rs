//! Shared fixtures for bridge integration tests.

#![allow(dead_code)]

use sb_bridge::{BridgeConfig, Session};
use sb_engine::testing::ScriptedEngine;
use std::path::PathBuf;

/// Write a placeholder model file unique to `tag` and return its path.
pub fn model_file(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("sb_bridge_{tag}.inp"));
    std::fs::write(&path, "[TITLE]\nTreatment train test model\n").unwrap();
    path
}

pub fn config_for(tag: &str) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.model.input = model_file(tag);
    config.model.report = std::env::temp_dir().join(format!("sb_bridge_{tag}.rpt"));
    config.model.output = std::env::temp_dir().join(format!("sb_bridge_{tag}.out"));
    config.logging.file = None;
    config
}

pub fn session(engine: ScriptedEngine, tag: &str) -> Session<ScriptedEngine> {
    Session::new(engine, config_for(tag))
}

/// Outputs the scripted engine produces for the treatment train by default.
pub const DEFAULT_OUTPUTS: [f64; 7] = [205.0, 305.0, 305.1, 305.2, 410.0, 410.1, 410.2];

pub fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
    }
}
