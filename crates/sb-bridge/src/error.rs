//! Bridge error taxonomy and its mapping onto host status codes.

use crate::elements::ElementRole;
use sb_core::Status;
use sb_engine::{EngineError, EngineOp};
use std::path::PathBuf;
use thiserror::Error;

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Every way a host call can fail.
///
/// Engine failures carry the engine's own message, captured at the point of
/// failure, so a later teardown cannot overwrite it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Input file path is not provided")]
    InputPathMissing,

    #[error("Input file does not exist: {}", path.display())]
    InputPathNotFound { path: PathBuf },

    #[error("Input file path is a directory: {}", path.display())]
    InputPathIsDirectory { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to open model: {message} ({source})")]
    EngineOpen {
        source: EngineError,
        message: String,
    },

    #[error("{} {name} ({}) not found in model", .role.kind_label(), .role.purpose())]
    ElementNotFound { role: ElementRole, name: String },

    #[error("Subcatchment {name} index {index} is out of range (valid range: 0-{})", .count - 1)]
    SubcatchmentOutOfRange {
        name: String,
        index: i32,
        count: i32,
    },

    #[error("Failed to start simulation: {message} ({source})")]
    EngineStart {
        source: EngineError,
        message: String,
    },

    #[error("Simulation step failed: {message} ({source})")]
    EngineStep {
        source: EngineError,
        message: String,
    },

    #[error("Engine {op} failed during cleanup: {message} ({source})")]
    EngineCleanup {
        op: EngineOp,
        source: EngineError,
        message: String,
    },

    #[error("Engine is not running")]
    NotRunning,

    #[error("Unknown method id: {0}")]
    UnknownMethod(i32),

    #[error("Expected {expected} inputs, got {got}")]
    MissingInputs { expected: usize, got: usize },
}

impl BridgeError {
    /// Host status for this failure. Only state-transition and protocol
    /// errors go back without a message.
    pub fn status(&self) -> Status {
        match self {
            BridgeError::NotRunning | BridgeError::UnknownMethod(_) => Status::Failure,
            _ => Status::FailureWithMessage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(BridgeError::NotRunning.status(), Status::Failure);
        assert_eq!(BridgeError::UnknownMethod(7).status(), Status::Failure);
        assert_eq!(
            BridgeError::InputPathMissing.status(),
            Status::FailureWithMessage
        );
        let step = BridgeError::EngineStep {
            source: EngineError::Call {
                op: EngineOp::Step,
                code: -1,
            },
            message: "ERROR 303".into(),
        };
        assert_eq!(step.status(), Status::FailureWithMessage);
    }

    #[test]
    fn element_message_names_element_and_role() {
        let err = BridgeError::ElementNotFound {
            role: ElementRole::Detention,
            name: "ST2".into(),
        };
        assert_eq!(err.to_string(), "Storage node ST2 (detention) not found in model");
    }

    #[test]
    fn range_message_shows_valid_range() {
        let err = BridgeError::SubcatchmentOutOfRange {
            name: "S1".into(),
            index: 3,
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "Subcatchment S1 index 3 is out of range (valid range: 0-1)"
        );
    }
}
