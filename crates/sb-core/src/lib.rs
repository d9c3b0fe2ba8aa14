//! sb-core: shared vocabulary for the SWMM bridge.
//!
//! Contains:
//! - protocol (host method ids, status codes, fixed reporting constants)
//! - units (uom time types + conversions used for step synchronization)

pub mod protocol;
pub mod units;

pub use protocol::{
    ARGUMENT_COUNTS, BRIDGE_VERSION, INPUT_COUNT, MethodId, OUTPUT_COUNT, ProtocolError, Status,
};
pub use units::*;
