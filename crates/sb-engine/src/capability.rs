//! Engine capability trait.

use crate::error::{EngineError, EngineOp, EngineResult};
use crate::kinds::{ObjectKind, Property};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Files handed to the engine when a model is opened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelFiles {
    /// Model definition (input) file.
    pub input: PathBuf,
    /// Text report written by the engine.
    pub report: PathBuf,
    /// Binary results file written by the engine.
    pub output: PathBuf,
}

impl Default for ModelFiles {
    fn default() -> Self {
        Self {
            input: PathBuf::from("model.inp"),
            report: PathBuf::from("model.rpt"),
            output: PathBuf::from("model.out"),
        }
    }
}

/// Outcome of a successful engine step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepStatus {
    /// The engine advanced by its own routing step and can continue.
    Advanced { elapsed_days: f64 },
    /// The simulation horizon has been reached.
    Finished { elapsed_days: f64 },
}

impl StepStatus {
    /// Interpret a raw step return code.
    ///
    /// Zero continues, positive means the horizon was reached and negative is
    /// a fatal engine error.
    pub fn from_code(code: i32, elapsed_days: f64) -> EngineResult<Self> {
        match code {
            0 => Ok(StepStatus::Advanced { elapsed_days }),
            c if c > 0 => Ok(StepStatus::Finished { elapsed_days }),
            c => Err(EngineError::Call {
                op: EngineOp::Step,
                code: c,
            }),
        }
    }

    pub fn elapsed_days(&self) -> f64 {
        match self {
            StepStatus::Advanced { elapsed_days } | StepStatus::Finished { elapsed_days } => {
                *elapsed_days
            }
        }
    }
}

/// Operations the bridge consumes from the hydraulic engine.
///
/// The engine is a process-wide, non-reentrant resource. Implementations are
/// driven by exactly one caller at a time; none of these methods are expected
/// to be called concurrently.
///
/// Element lookups return the engine's raw answer (negative means "not
/// found"); validating those answers is the caller's job.
pub trait Engine {
    /// Engine name (for logging).
    fn name(&self) -> &str;

    /// Load a model definition.
    fn open(&mut self, files: &ModelFiles) -> EngineResult<()>;

    /// Begin a simulation on the opened model.
    fn start(&mut self, save_results: bool) -> EngineResult<()>;

    /// Advance by one internal routing step.
    fn step(&mut self) -> EngineResult<StepStatus>;

    /// Read a scalar property of an element.
    fn value(&self, property: Property, index: usize) -> f64;

    /// Write a scalar property of an element.
    fn set_value(&mut self, property: Property, index: usize, value: f64);

    /// Look up an element by name. Negative when the element does not exist.
    fn index_of(&self, kind: ObjectKind, name: &str) -> i32;

    /// Number of elements of a category in the opened model.
    fn count(&self, kind: ObjectKind) -> i32;

    /// Finish the simulation started by [`Engine::start`].
    fn end(&mut self) -> EngineResult<()>;

    /// Release the opened model.
    fn close(&mut self) -> EngineResult<()>;

    /// Human-readable text for the most recent engine error.
    fn last_error(&mut self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_codes() {
        assert_eq!(
            StepStatus::from_code(0, 0.5),
            Ok(StepStatus::Advanced { elapsed_days: 0.5 })
        );
        assert_eq!(
            StepStatus::from_code(1, 2.0),
            Ok(StepStatus::Finished { elapsed_days: 2.0 })
        );
        let err = StepStatus::from_code(-7, 0.0).unwrap_err();
        assert_eq!(err.code(), Some(-7));
    }

    #[test]
    fn default_model_files() {
        let files = ModelFiles::default();
        assert_eq!(files.input, PathBuf::from("model.inp"));
        assert_eq!(files.report, PathBuf::from("model.rpt"));
        assert_eq!(files.output, PathBuf::from("model.out"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn step_code_sign_decides_outcome(code in any::<i32>(), elapsed in 0.0_f64..1.0e4) {
            match StepStatus::from_code(code, elapsed) {
                Ok(StepStatus::Advanced { .. }) => prop_assert_eq!(code, 0),
                Ok(StepStatus::Finished { elapsed_days }) => {
                    prop_assert!(code > 0);
                    prop_assert_eq!(elapsed_days, elapsed);
                }
                Err(err) => {
                    prop_assert!(code < 0);
                    prop_assert_eq!(err.code(), Some(code));
                }
            }
        }
    }
}
