//! Engine call errors.

use core::fmt;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine operations that report a status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineOp {
    Open,
    Start,
    Step,
    End,
    Close,
}

impl fmt::Display for EngineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineOp::Open => "open",
            EngineOp::Start => "start",
            EngineOp::Step => "step",
            EngineOp::End => "end",
            EngineOp::Close => "close",
        };
        f.write_str(name)
    }
}

/// Errors that can occur when driving the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine returned a non-zero (or, for step, negative) code.
    #[error("Engine {op} failed with code {code}")]
    Call { op: EngineOp, code: i32 },

    /// Another handle to the process-wide engine is still alive.
    #[error("Engine is already in use by this process")]
    Busy,

    /// Argument cannot be passed to the engine (e.g. interior NUL in a path).
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

impl EngineError {
    /// Build the error for a failed call, or `Ok` for code zero.
    pub fn check(op: EngineOp, code: i32) -> EngineResult<()> {
        if code == 0 {
            Ok(())
        } else {
            Err(EngineError::Call { op, code })
        }
    }

    /// Engine-native code, when the failure came from the engine itself.
    pub fn code(&self) -> Option<i32> {
        match self {
            EngineError::Call { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_zero_is_ok() {
        assert!(EngineError::check(EngineOp::Open, 0).is_ok());
    }

    #[test]
    fn check_nonzero_keeps_op_and_code() {
        let err = EngineError::check(EngineOp::Close, 303).unwrap_err();
        assert_eq!(err.code(), Some(303));
        assert!(err.to_string().contains("close"));
        assert!(err.to_string().contains("303"));
    }

    #[test]
    fn busy_has_no_code() {
        assert_eq!(EngineError::Busy.code(), None);
    }
}
