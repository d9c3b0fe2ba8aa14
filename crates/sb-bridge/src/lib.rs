//! sb-bridge: step-by-step control of a SWMM simulation from an external host.
//!
//! The host calls a single entry point once per method (initialize, calculate,
//! report version, report arguments, cleanup). This crate turns those calls
//! into engine operations:
//!
//! - [`elements`]: resolves the eight named model elements to engine indices
//! - [`error_channel`]: the message buffer whose address is handed to the host
//! - [`session`]: the Uninitialized/Running lifecycle state machine
//! - [`dispatch`]: routes a method id to one operation and produces an [`Outcome`]
//! - [`boundary`]: raw pointer marshaling and, with feature `swmm`, the exported
//!   `SwmmGoldSimBridge` symbol
//!
//! Configuration ([`config`]) comes from an optional YAML file and logging
//! ([`logging`]) goes through `tracing`.
//!
//! # Threading
//!
//! The host must serialize calls. A session is driven by one caller at a time
//! and the engine behind it is a process-wide, non-reentrant resource.

pub mod boundary;
pub mod config;
pub mod dispatch;
pub mod elements;
pub mod error;
pub mod error_channel;
pub mod logging;
pub mod session;

pub use config::{BridgeConfig, ConfigError, ConfigResult, ElementNames, LogConfig};
pub use dispatch::{Outcome, report_arguments, report_version};
pub use elements::{ElementHandle, ElementRole, ElementSet, ResolvedElements};
pub use error::{BridgeError, BridgeResult};
pub use error_channel::{ERROR_BUFFER_LEN, ErrorChannel};
pub use session::{
    CalculateOutcome, Session, SessionState, StepInputs, StepOutputs, validate_input_path,
};
