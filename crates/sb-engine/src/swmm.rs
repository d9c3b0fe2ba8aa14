//! EPA SWMM 5 backend.
//!
//! Binds the toolkit functions exported by `swmm5` and wraps them in
//! [`Engine`]. SWMM keeps one project in global state, so at most one
//! [`SwmmEngine`] may exist per process; [`SwmmEngine::acquire`] enforces it.

use crate::capability::{Engine, ModelFiles, StepStatus};
use crate::error::{EngineError, EngineOp, EngineResult};
use crate::kinds::{ObjectKind, Property};
use std::ffi::{CStr, CString, c_char, c_double, c_int};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

const ERROR_TEXT_LEN: usize = 256;

static IN_USE: AtomicBool = AtomicBool::new(false);

#[link(name = "swmm5")]
unsafe extern "system" {
    fn swmm_open(input: *const c_char, report: *const c_char, output: *const c_char) -> c_int;
    fn swmm_start(save_flag: c_int) -> c_int;
    fn swmm_step(elapsed_time: *mut c_double) -> c_int;
    fn swmm_end() -> c_int;
    fn swmm_close() -> c_int;
    fn swmm_getError(err_msg: *mut c_char, msg_len: c_int) -> c_int;
    fn swmm_getCount(obj_type: c_int) -> c_int;
    fn swmm_getIndex(obj_type: c_int, name: *const c_char) -> c_int;
    fn swmm_getValue(property: c_int, index: c_int) -> c_double;
    fn swmm_setValue(property: c_int, index: c_int, value: c_double);
}

/// Exclusive handle to the process-wide SWMM engine.
#[derive(Debug)]
pub struct SwmmEngine {
    _private: (),
}

impl SwmmEngine {
    /// Take the engine. Fails with [`EngineError::Busy`] while another handle is alive.
    pub fn acquire() -> EngineResult<Self> {
        if IN_USE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EngineError::Busy);
        }
        Ok(Self { _private: () })
    }
}

impl Drop for SwmmEngine {
    fn drop(&mut self) {
        IN_USE.store(false, Ordering::Release);
    }
}

fn c_path(path: &Path) -> EngineResult<CString> {
    CString::new(path.to_string_lossy().into_owned()).map_err(|_| EngineError::InvalidArg {
        what: "model path contains an interior NUL byte",
    })
}

fn c_index(index: usize) -> c_int {
    c_int::try_from(index).unwrap_or(c_int::MAX)
}

impl Engine for SwmmEngine {
    fn name(&self) -> &str {
        "EPA SWMM 5"
    }

    fn open(&mut self, files: &ModelFiles) -> EngineResult<()> {
        let input = c_path(&files.input)?;
        let report = c_path(&files.report)?;
        let output = c_path(&files.output)?;
        // SAFETY: all three pointers are valid NUL-terminated strings for the call.
        let code = unsafe { swmm_open(input.as_ptr(), report.as_ptr(), output.as_ptr()) };
        EngineError::check(EngineOp::Open, code)
    }

    fn start(&mut self, save_results: bool) -> EngineResult<()> {
        // SAFETY: plain integer argument.
        let code = unsafe { swmm_start(c_int::from(save_results)) };
        EngineError::check(EngineOp::Start, code)
    }

    fn step(&mut self) -> EngineResult<StepStatus> {
        let mut elapsed: c_double = 0.0;
        // SAFETY: `elapsed` outlives the call.
        let code = unsafe { swmm_step(&mut elapsed) };
        StepStatus::from_code(code, elapsed)
    }

    fn value(&self, property: Property, index: usize) -> f64 {
        // SAFETY: out-of-range indices are rejected inside the engine.
        unsafe { swmm_getValue(property.code(), c_index(index)) }
    }

    fn set_value(&mut self, property: Property, index: usize, value: f64) {
        // SAFETY: out-of-range indices are ignored inside the engine.
        unsafe { swmm_setValue(property.code(), c_index(index), value) }
    }

    fn index_of(&self, kind: ObjectKind, name: &str) -> i32 {
        let Ok(name) = CString::new(name) else {
            return -1;
        };
        // SAFETY: `name` is a valid NUL-terminated string for the call.
        unsafe { swmm_getIndex(kind.code(), name.as_ptr()) }
    }

    fn count(&self, kind: ObjectKind) -> i32 {
        // SAFETY: plain integer argument.
        unsafe { swmm_getCount(kind.code()) }
    }

    fn end(&mut self) -> EngineResult<()> {
        // SAFETY: no arguments; safe to call in any engine state.
        let code = unsafe { swmm_end() };
        EngineError::check(EngineOp::End, code)
    }

    fn close(&mut self) -> EngineResult<()> {
        // SAFETY: no arguments; safe to call in any engine state.
        let code = unsafe { swmm_close() };
        EngineError::check(EngineOp::Close, code)
    }

    fn last_error(&mut self) -> String {
        let mut buf = [0 as c_char; ERROR_TEXT_LEN];
        // SAFETY: the engine writes at most `msg_len` bytes, terminator included.
        unsafe { swmm_getError(buf.as_mut_ptr(), ERROR_TEXT_LEN as c_int) };
        buf[ERROR_TEXT_LEN - 1] = 0;
        // SAFETY: the buffer is NUL-terminated above.
        let text = unsafe { CStr::from_ptr(buf.as_ptr()) };
        text.to_string_lossy().trim().to_string()
    }
}
