//! Method dispatch.
//!
//! Routes one host method id to exactly one operation and turns the result
//! into an [`Outcome`]. Failures that carry a message are written to the
//! session's error channel here; packing the channel address into an output
//! slot is left to [`crate::boundary`].

use crate::error::BridgeError;
use crate::session::{CalculateOutcome, Session, SessionState, StepInputs};
use sb_core::{ARGUMENT_COUNTS, BRIDGE_VERSION, MethodId, Status};
use sb_engine::Engine;
use tracing::{debug, error};

/// Result of one host call.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Outputs to copy into the host's output array, in slot order. May be
    /// empty when the operation produces nothing.
    Success(Vec<f64>),
    /// Failed without a message. Outputs untouched.
    Failure,
    /// Failed; the message is also held by the session's error channel.
    FailureWithMessage(String),
}

impl Outcome {
    pub fn status(&self) -> Status {
        match self {
            Outcome::Success(_) => Status::Success,
            Outcome::Failure => Status::Failure,
            Outcome::FailureWithMessage(_) => Status::FailureWithMessage,
        }
    }

    pub fn outputs(&self) -> &[f64] {
        match self {
            Outcome::Success(values) => values,
            _ => &[],
        }
    }
}

pub fn report_version() -> [f64; 1] {
    [BRIDGE_VERSION]
}

pub fn report_arguments() -> [f64; 2] {
    ARGUMENT_COUNTS
}

impl<E: Engine> Session<E> {
    /// Perform the operation named by `method_id`.
    pub fn dispatch(&mut self, method_id: i32, inputs: &[f64]) -> Outcome {
        let method = match MethodId::try_from(method_id) {
            Ok(method) => method,
            Err(_) => return self.fail(BridgeError::UnknownMethod(method_id)),
        };
        debug!(%method, "method called");

        let result = match method {
            MethodId::Initialize => self.initialize().map(|()| Vec::new()),
            // State is checked before the inputs are looked at.
            MethodId::Calculate if self.state() == SessionState::Uninitialized => {
                Err(BridgeError::NotRunning)
            }
            MethodId::Calculate => StepInputs::from_slice(inputs)
                .and_then(|inputs| self.calculate(inputs))
                .map(|outcome| match outcome {
                    CalculateOutcome::Advanced(outputs) => outputs.to_array().to_vec(),
                    CalculateOutcome::Completed => Vec::new(),
                }),
            MethodId::ReportVersion => Ok(report_version().to_vec()),
            MethodId::ReportArguments => Ok(report_arguments().to_vec()),
            MethodId::Cleanup => self.cleanup().map(|()| Vec::new()),
        };

        let outcome = match result {
            Ok(values) => Outcome::Success(values),
            Err(err) => self.fail(err),
        };
        debug!(%method, status = outcome.status().code(), "method complete");
        outcome
    }

    fn fail(&mut self, err: BridgeError) -> Outcome {
        match err.status() {
            Status::FailureWithMessage => {
                error!(error = %err, "call failed");
                let text = err.to_string();
                self.error_channel_mut().publish(&text);
                Outcome::FailureWithMessage(text)
            }
            _ => {
                error!(error = %err, "call rejected");
                Outcome::Failure
            }
        }
    }
}
