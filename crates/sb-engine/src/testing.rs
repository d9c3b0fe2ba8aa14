//! Scriptable engine double.
//!
//! `ScriptedEngine` answers element lookups from an in-memory model, replays a
//! queue of step codes, injects failures per operation and records every call
//! so tests can assert on call counts and ordering.

use crate::capability::{Engine, ModelFiles, StepStatus};
use crate::error::{EngineError, EngineOp, EngineResult};
use crate::kinds::{ObjectKind, Property};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;

/// Engine routing step used when no step script is given (minutes).
const DEFAULT_STEP_MINUTES: f64 = 5.0;

/// A single recorded engine call.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineCall {
    Open,
    Start { save_results: bool },
    Step,
    GetValue { property: Property, index: usize },
    SetValue { property: Property, index: usize, value: f64 },
    GetIndex { kind: ObjectKind, name: String },
    GetCount { kind: ObjectKind },
    End,
    Close,
    GetError,
}

impl EngineCall {
    fn op(&self) -> Option<EngineOp> {
        match self {
            EngineCall::Open => Some(EngineOp::Open),
            EngineCall::Start { .. } => Some(EngineOp::Start),
            EngineCall::Step => Some(EngineOp::Step),
            EngineCall::End => Some(EngineOp::End),
            EngineCall::Close => Some(EngineOp::Close),
            _ => None,
        }
    }
}

/// In-memory engine with scripted behavior.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    elements: BTreeMap<ObjectKind, Vec<String>>,
    values: HashMap<(Property, usize), f64>,
    failures: HashMap<EngineOp, i32>,
    step_codes: VecDeque<i32>,
    count_override: HashMap<ObjectKind, i32>,
    step_minutes: f64,
    elapsed_days: f64,
    message: String,
    opened: bool,
    started: bool,
    calls: CallLog,
}

/// Call record shared between an engine and whoever inspects it.
pub type CallLog = Rc<RefCell<Vec<EngineCall>>>;

impl ScriptedEngine {
    /// Engine with no elements at all.
    pub fn empty() -> Self {
        Self {
            step_minutes: DEFAULT_STEP_MINUTES,
            message: "ERROR 000: scripted engine failure".to_string(),
            ..Self::default()
        }
    }

    /// Engine holding the treatment-train model: one gage, subcatchment `S1`,
    /// storage nodes `ST1`..`ST3` plus outfall `J2`, links `C1`..`C3`.
    pub fn treatment_train() -> Self {
        Self::empty()
            .with_elements(ObjectKind::Gage, ["RG1"])
            .with_elements(ObjectKind::Subcatchment, ["S1"])
            .with_elements(ObjectKind::Node, ["ST1", "ST2", "ST3", "J2"])
            .with_elements(ObjectKind::Link, ["C1", "C2", "C3"])
    }

    /// Append named elements of one category; indices follow insertion order.
    pub fn with_elements<I, S>(mut self, kind: ObjectKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements
            .entry(kind)
            .or_default()
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Remove a named element so lookups for it report "not found".
    pub fn without_element(mut self, kind: ObjectKind, name: &str) -> Self {
        if let Some(names) = self.elements.get_mut(&kind) {
            names.retain(|n| n != name);
        }
        self
    }

    /// Report a different element count than the model actually holds.
    pub fn with_count(mut self, kind: ObjectKind, count: i32) -> Self {
        self.count_override.insert(kind, count);
        self
    }

    /// Make `op` return `code` every time it is called.
    pub fn fail_on(mut self, op: EngineOp, code: i32) -> Self {
        self.failures.insert(op, code);
        self
    }

    /// Queue raw step codes. Once exhausted, steps return 0.
    pub fn with_step_codes<I: IntoIterator<Item = i32>>(mut self, codes: I) -> Self {
        self.step_codes.extend(codes);
        self
    }

    pub fn with_step_minutes(mut self, minutes: f64) -> Self {
        self.step_minutes = minutes;
        self
    }

    pub fn with_value(mut self, property: Property, index: usize, value: f64) -> Self {
        self.values.insert((property, index), value);
        self
    }

    /// Text returned by `last_error`.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.borrow().clone()
    }

    /// Number of calls to a status-returning operation.
    pub fn calls_of(&self, op: EngineOp) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.op() == Some(op))
            .count()
    }

    /// Handle on the call record that outlives the engine itself.
    pub fn call_log(&self) -> CallLog {
        Rc::clone(&self.calls)
    }

    pub fn clear_calls(&mut self) {
        self.calls.borrow_mut().clear();
    }

    /// A model is loaded and not yet closed.
    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// A simulation is started and not yet ended.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Last value written to a property, or the scripted/default read value.
    pub fn peek(&self, property: Property, index: usize) -> f64 {
        self.values
            .get(&(property, index))
            .copied()
            .unwrap_or_else(|| default_value(property, index))
    }

    fn record(&self, call: EngineCall) {
        self.calls.borrow_mut().push(call);
    }

    fn scripted(&self, op: EngineOp) -> EngineResult<()> {
        EngineError::check(op, self.failures.get(&op).copied().unwrap_or(0))
    }
}

/// Distinct, recognisable value per (property, index): `code + index / 10`.
fn default_value(property: Property, index: usize) -> f64 {
    f64::from(property.code()) + index as f64 / 10.0
}

impl Engine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn open(&mut self, _files: &ModelFiles) -> EngineResult<()> {
        self.record(EngineCall::Open);
        self.opened = true;
        self.elapsed_days = 0.0;
        self.scripted(EngineOp::Open)
    }

    fn start(&mut self, save_results: bool) -> EngineResult<()> {
        self.record(EngineCall::Start { save_results });
        self.scripted(EngineOp::Start)?;
        self.started = true;
        Ok(())
    }

    fn step(&mut self) -> EngineResult<StepStatus> {
        self.record(EngineCall::Step);
        self.scripted(EngineOp::Step)?;
        let code = self.step_codes.pop_front().unwrap_or(0);
        if code == 0 {
            self.elapsed_days += self.step_minutes / 1440.0;
        }
        StepStatus::from_code(code, self.elapsed_days)
    }

    fn value(&self, property: Property, index: usize) -> f64 {
        self.record(EngineCall::GetValue { property, index });
        self.peek(property, index)
    }

    fn set_value(&mut self, property: Property, index: usize, value: f64) {
        self.record(EngineCall::SetValue {
            property,
            index,
            value,
        });
        self.values.insert((property, index), value);
    }

    fn index_of(&self, kind: ObjectKind, name: &str) -> i32 {
        self.record(EngineCall::GetIndex {
            kind,
            name: name.to_string(),
        });
        self.elements
            .get(&kind)
            .and_then(|names| names.iter().position(|n| n == name))
            .and_then(|i| i32::try_from(i).ok())
            .unwrap_or(-1)
    }

    fn count(&self, kind: ObjectKind) -> i32 {
        self.record(EngineCall::GetCount { kind });
        if let Some(count) = self.count_override.get(&kind) {
            return *count;
        }
        self.elements
            .get(&kind)
            .map_or(0, |names| i32::try_from(names.len()).unwrap_or(i32::MAX))
    }

    fn end(&mut self) -> EngineResult<()> {
        self.record(EngineCall::End);
        self.started = false;
        self.scripted(EngineOp::End)
    }

    fn close(&mut self) -> EngineResult<()> {
        self.record(EngineCall::Close);
        self.opened = false;
        self.scripted(EngineOp::Close)
    }

    fn last_error(&mut self) -> String {
        self.record(EngineCall::GetError);
        self.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_log_survives_the_engine() {
        let mut engine = ScriptedEngine::treatment_train();
        let log = engine.call_log();
        engine.end().unwrap();
        drop(engine);
        assert_eq!(*log.borrow(), vec![EngineCall::End]);
    }

    #[test]
    fn treatment_train_indices() {
        let engine = ScriptedEngine::treatment_train();
        assert_eq!(engine.index_of(ObjectKind::Subcatchment, "S1"), 0);
        assert_eq!(engine.index_of(ObjectKind::Node, "ST3"), 2);
        assert_eq!(engine.index_of(ObjectKind::Node, "J2"), 3);
        assert_eq!(engine.index_of(ObjectKind::Link, "C2"), 1);
        assert_eq!(engine.index_of(ObjectKind::Link, "C9"), -1);
        assert_eq!(engine.count(ObjectKind::Node), 4);
    }

    #[test]
    fn removed_element_is_not_found() {
        let engine = ScriptedEngine::treatment_train().without_element(ObjectKind::Node, "ST2");
        assert_eq!(engine.index_of(ObjectKind::Node, "ST2"), -1);
        assert_eq!(engine.index_of(ObjectKind::Node, "ST3"), 1);
    }

    #[test]
    fn step_script_is_replayed() {
        let mut engine = ScriptedEngine::treatment_train().with_step_codes([0, 0, 1]);
        assert!(matches!(engine.step(), Ok(StepStatus::Advanced { .. })));
        assert!(matches!(engine.step(), Ok(StepStatus::Advanced { .. })));
        assert!(matches!(engine.step(), Ok(StepStatus::Finished { .. })));
        assert!(matches!(engine.step(), Ok(StepStatus::Advanced { .. })));
    }

    #[test]
    fn elapsed_time_advances_by_step_minutes() {
        let mut engine = ScriptedEngine::treatment_train().with_step_minutes(15.0);
        engine.step().unwrap();
        let status = engine.step().unwrap();
        assert!((status.elapsed_days() - 30.0 / 1440.0).abs() < 1e-12);
    }

    #[test]
    fn negative_step_code_is_an_error() {
        let mut engine = ScriptedEngine::treatment_train().with_step_codes([-303]);
        let err = engine.step().unwrap_err();
        assert_eq!(err.code(), Some(-303));
    }

    #[test]
    fn open_and_close_track_state() {
        let mut engine = ScriptedEngine::treatment_train().fail_on(EngineOp::Close, 5);
        engine.open(&ModelFiles::default()).unwrap();
        engine.start(false).unwrap();
        assert!(engine.is_open() && engine.is_started());
        engine.end().unwrap();
        assert!(engine.close().is_err());
        assert!(!engine.is_open());
        assert_eq!(engine.calls_of(EngineOp::Close), 1);
    }

    #[test]
    fn set_value_is_visible_to_peek() {
        let mut engine = ScriptedEngine::treatment_train();
        engine.set_value(Property::GageRainfall, 0, 1.25);
        assert_eq!(engine.peek(Property::GageRainfall, 0), 1.25);
        assert!((engine.peek(Property::LinkFlow, 2) - 410.2).abs() < 1e-9);
    }
}
