//! sb-engine: the hydraulic engine as seen by the bridge.
//!
//! Provides:
//! - `Engine` trait: the fixed set of operations the bridge consumes
//!   (open/start/step/value/set_value/index_of/count/end/close/last_error)
//! - Element categories and exchanged properties
//! - EPA SWMM 5 binding (feature `swmm`)
//! - `ScriptedEngine` test double (feature `testing`)
//!
//! # Architecture
//!
//! The bridge never calls the engine library directly. Everything goes through
//! the [`Engine`] trait so the lifecycle logic can be exercised against a
//! double that records every call, and so the FFI surface stays in one file.

pub mod capability;
pub mod error;
pub mod kinds;

#[cfg(feature = "swmm")]
pub mod swmm;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use capability::{Engine, ModelFiles, StepStatus};
pub use error::{EngineError, EngineOp, EngineResult};
pub use kinds::{ObjectKind, Property};

#[cfg(feature = "swmm")]
pub use swmm::SwmmEngine;
