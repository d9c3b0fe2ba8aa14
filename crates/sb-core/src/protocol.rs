//! Host calling contract.
//!
//! The host drives the bridge through a single entry point that takes an
//! integer method id and reports back an integer status. Both sets of values
//! are fixed by the host and must stay bit-exact.

use core::fmt;
use thiserror::Error;

/// Version number reported to the host by [`MethodId::ReportVersion`].
pub const BRIDGE_VERSION: f64 = 4.1;

/// Number of scalar inputs the host passes to each Calculate call.
pub const INPUT_COUNT: usize = 2;

/// Number of scalar outputs returned by a continuing Calculate call.
pub const OUTPUT_COUNT: usize = 7;

/// Argument counts as reported by [`MethodId::ReportArguments`].
pub const ARGUMENT_COUNTS: [f64; 2] = [INPUT_COUNT as f64, OUTPUT_COUNT as f64];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unknown method id: {0}")]
    UnknownMethod(i32),
}

/// Operation requested by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MethodId {
    /// Open the model and start a realization.
    Initialize,
    /// Advance the engine by one step and exchange scalars.
    Calculate,
    /// Report the bridge version.
    ReportVersion,
    /// Report input/output argument counts.
    ReportArguments,
    /// End the realization and release the engine.
    Cleanup,
}

impl MethodId {
    pub const ALL: [MethodId; 5] = [
        MethodId::Initialize,
        MethodId::Calculate,
        MethodId::ReportVersion,
        MethodId::ReportArguments,
        MethodId::Cleanup,
    ];

    /// Raw id as passed across the host boundary.
    pub const fn code(self) -> i32 {
        match self {
            MethodId::Initialize => 0,
            MethodId::Calculate => 1,
            MethodId::ReportVersion => 2,
            MethodId::ReportArguments => 3,
            MethodId::Cleanup => 99,
        }
    }
}

impl TryFrom<i32> for MethodId {
    type Error = ProtocolError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MethodId::Initialize),
            1 => Ok(MethodId::Calculate),
            2 => Ok(MethodId::ReportVersion),
            3 => Ok(MethodId::ReportArguments),
            99 => Ok(MethodId::Cleanup),
            other => Err(ProtocolError::UnknownMethod(other)),
        }
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MethodId::Initialize => "XF_INITIALIZE",
            MethodId::Calculate => "XF_CALCULATE",
            MethodId::ReportVersion => "XF_REP_VERSION",
            MethodId::ReportArguments => "XF_REP_ARGUMENTS",
            MethodId::Cleanup => "XF_CLEANUP",
        };
        f.write_str(name)
    }
}

/// Result of a single host call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    /// Failed without a diagnostic.
    Failure,
    /// Failed; output slot 0 carries the address of a message.
    FailureWithMessage,
}

impl Status {
    pub const fn code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Failure => 1,
            Status::FailureWithMessage => -1,
        }
    }
}
