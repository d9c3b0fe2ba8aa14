use sb_bridge::{BridgeError, ConfigError};
use std::path::PathBuf;
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[cfg(feature = "swmm")]
    #[error(transparent)]
    Engine(#[from] sb_engine::EngineError),

    #[error("Cannot read rainfall series {}: {source}", path.display())]
    RainfallRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Rainfall series line {line}: '{text}' is not a number")]
    RainfallParse { line: usize, text: String },

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
