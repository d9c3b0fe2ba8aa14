//! Raw host boundary.
//!
//! The host passes a method id, a status slot and two `double` arrays with no
//! lengths attached. [`invoke`] reads and writes exactly the counts fixed by
//! the calling contract and never lets a panic cross into the host.
//!
//! With feature `swmm` this module also exports the `SwmmGoldSimBridge`
//! symbol, backed by one process-wide session over [`sb_engine::SwmmEngine`].

use crate::dispatch::Outcome;
use crate::session::Session;
use sb_core::{INPUT_COUNT, MethodId, OUTPUT_COUNT, Status};
use sb_engine::Engine;
use std::ffi::c_int;
use std::panic::{self, AssertUnwindSafe};

/// Perform one host call against `session`.
///
/// # Safety
///
/// - `status` is null or valid for writing one `c_int`.
/// - For Calculate, `inargs` is null or valid for reading [`INPUT_COUNT`] values.
/// - `outargs` is null or valid for writing [`OUTPUT_COUNT`] values.
/// - No other call on `session` is in progress.
pub unsafe fn invoke<E: Engine>(
    session: &mut Session<E>,
    method_id: c_int,
    status: *mut c_int,
    inargs: *const f64,
    outargs: *mut f64,
) {
    if status.is_null() {
        return;
    }

    let inputs: &[f64] = if method_id == MethodId::Calculate.code() && !inargs.is_null() {
        // SAFETY: caller guarantees INPUT_COUNT readable values.
        unsafe { std::slice::from_raw_parts(inargs, INPUT_COUNT) }
    } else {
        &[]
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| session.dispatch(method_id, inputs)))
        .unwrap_or_else(|_| {
            tracing::error!(method_id, "panic inside bridge call");
            Outcome::Failure
        });

    if !outargs.is_null() {
        match &outcome {
            Outcome::Success(values) => {
                let n = values.len().min(OUTPUT_COUNT);
                // SAFETY: caller guarantees OUTPUT_COUNT writable values.
                unsafe { std::ptr::copy_nonoverlapping(values.as_ptr(), outargs, n) };
            }
            Outcome::FailureWithMessage(_) => {
                let slot = session.error_channel().address_slot();
                // SAFETY: slot 0 is always writable.
                unsafe { outargs.write(slot) };
            }
            Outcome::Failure => {}
        }
    }

    // SAFETY: checked non-null above.
    unsafe { status.write(outcome.status().code()) };
}

/// Write Failure into a status slot without touching anything else.
///
/// # Safety
///
/// `status` is null or valid for writing one `c_int`.
pub unsafe fn reject(status: *mut c_int) {
    if !status.is_null() {
        // SAFETY: checked non-null.
        unsafe { status.write(Status::Failure.code()) };
    }
}

#[cfg(feature = "swmm")]
mod exported {
    use super::{invoke, reject};
    use crate::config::BridgeConfig;
    use crate::logging;
    use crate::session::Session;
    use sb_engine::SwmmEngine;
    use std::ffi::c_int;
    use std::sync::{LazyLock, Mutex, PoisonError};

    /// The process-wide session. Created on the first call, lives until unload.
    ///
    /// The host serializes calls, so this lock is never contended; it only
    /// makes the global sound.
    static SESSION: LazyLock<Mutex<Option<Session<SwmmEngine>>>> =
        LazyLock::new(|| Mutex::new(open_session()));

    fn open_session() -> Option<Session<SwmmEngine>> {
        let loaded = BridgeConfig::from_env();
        let log_config = loaded
            .as_ref()
            .map(|c| c.logging.clone())
            .unwrap_or_default();
        logging::init(&log_config);

        let engine = match SwmmEngine::acquire() {
            Ok(engine) => engine,
            Err(err) => {
                tracing::error!(error = %err, "cannot acquire SWMM engine");
                return None;
            }
        };
        Some(match loaded {
            Ok(config) => Session::new(engine, config),
            Err(err) => {
                tracing::error!(error = %err, "configuration rejected");
                Session::with_config_error(engine, &err)
            }
        })
    }

    /// Host entry point.
    ///
    /// # Safety
    ///
    /// Same contract as [`invoke`]: pointers follow the host's fixed argument
    /// counts and calls are never made concurrently.
    #[allow(non_snake_case)]
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn SwmmGoldSimBridge(
        method_id: c_int,
        status: *mut c_int,
        inargs: *mut f64,
        outargs: *mut f64,
    ) {
        let mut guard = SESSION.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            // SAFETY: forwarded caller contract.
            Some(session) => unsafe { invoke(session, method_id, status, inargs, outargs) },
            // SAFETY: forwarded caller contract.
            None => unsafe { reject(status) },
        }
    }
}

#[cfg(feature = "swmm")]
pub use exported::SwmmGoldSimBridge;
