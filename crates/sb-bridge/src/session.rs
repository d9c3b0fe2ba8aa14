//! Lifecycle state machine.
//!
//! A [`Session`] owns the engine and moves between two states:
//!
//! | Call       | From          | To            |
//! |------------|---------------|---------------|
//! | initialize | Uninitialized | Running, or Uninitialized on failure |
//! | initialize | Running       | cleanup first, then as above |
//! | calculate  | Running       | Running; Uninitialized once the engine finishes or fails |
//! | cleanup    | either        | Uninitialized |
//!
//! Every failure path after the engine was opened closes it again before
//! returning, so an Uninitialized session never holds engine resources.

use crate::config::{BridgeConfig, ConfigError};
use crate::elements::{ElementSet, ResolvedElements};
use crate::error::{BridgeError, BridgeResult};
use crate::error_channel::ErrorChannel;
use sb_core::{INPUT_COUNT, OUTPUT_COUNT, as_days, as_minutes, days, s};
use sb_engine::{Engine, EngineError, EngineOp, Property, StepStatus};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Running,
}

/// Scalars passed by the host to each Calculate call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepInputs {
    /// Host elapsed time in seconds. Only compared against engine time.
    pub host_elapsed_s: f64,
    /// External forcing (rainfall intensity) applied before stepping.
    pub forcing: f64,
}

impl StepInputs {
    pub fn from_slice(inputs: &[f64]) -> BridgeResult<Self> {
        match inputs {
            [host_elapsed_s, forcing, ..] => Ok(Self {
                host_elapsed_s: *host_elapsed_s,
                forcing: *forcing,
            }),
            _ => Err(BridgeError::MissingInputs {
                expected: INPUT_COUNT,
                got: inputs.len(),
            }),
        }
    }
}

/// Values read back after a continuing step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutputs {
    /// Subcatchment runoff.
    pub discharge: f64,
    /// Bioswale, detention, retention volumes.
    pub volumes: [f64; 3],
    /// Flows through the three links, in train order.
    pub flows: [f64; 3],
}

impl StepOutputs {
    /// Host slot order: discharge, three volumes, three flows.
    pub fn to_array(&self) -> [f64; OUTPUT_COUNT] {
        let [v1, v2, v3] = self.volumes;
        let [f1, f2, f3] = self.flows;
        [self.discharge, v1, v2, v3, f1, f2, f3]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CalculateOutcome {
    /// The engine advanced; outputs are fresh.
    Advanced(StepOutputs),
    /// The engine reached its horizon and was shut down. No outputs.
    Completed,
}

#[derive(Clone, Copy, Debug)]
struct Running {
    elements: ResolvedElements,
    last_engine_days: Option<f64>,
}

/// One bridge session: engine, configuration, resolved elements and the
/// error channel.
///
/// Callers must not drive a session from more than one thread at a time.
pub struct Session<E: Engine> {
    engine: E,
    config: BridgeConfig,
    config_error: Option<String>,
    elements: ElementSet,
    running: Option<Running>,
    errors: ErrorChannel,
}

impl<E: Engine> Session<E> {
    pub fn new(engine: E, config: BridgeConfig) -> Self {
        let elements = ElementSet::from_names(&config.elements);
        Self {
            engine,
            config,
            config_error: None,
            elements,
            running: None,
            errors: ErrorChannel::new(),
        }
    }

    /// Session on default configuration that fails every Initialize with
    /// `error`. Reporting and Cleanup keep working.
    pub fn with_config_error(engine: E, error: &ConfigError) -> Self {
        let mut session = Self::new(engine, BridgeConfig::default());
        session.config_error = Some(error.to_string());
        session
    }

    pub fn state(&self) -> SessionState {
        if self.running.is_some() {
            SessionState::Running
        } else {
            SessionState::Uninitialized
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn elements(&self) -> &ElementSet {
        &self.elements
    }

    pub fn error_channel(&self) -> &ErrorChannel {
        &self.errors
    }

    pub(crate) fn error_channel_mut(&mut self) -> &mut ErrorChannel {
        &mut self.errors
    }

    /// Engine elapsed time after the last continuing step (days).
    pub fn last_engine_time(&self) -> Option<f64> {
        self.running.and_then(|r| r.last_engine_days)
    }

    /// Open the model, start the engine and resolve the elements.
    ///
    /// A running session is cleaned up first. If that cleanup fails its error
    /// is returned and no new model is opened.
    pub fn initialize(&mut self) -> BridgeResult<()> {
        if self.running.is_some() {
            debug!("engine already running, cleaning up first");
            self.teardown()?;
        }
        if let Some(what) = &self.config_error {
            return Err(BridgeError::Config(what.clone()));
        }

        let files = self.config.model.clone();
        info!(input = %files.input.display(), engine = self.engine.name(), "initializing");
        validate_input_path(&files.input)?;

        if let Err(source) = self.engine.open(&files) {
            let message = self.engine_message(&source);
            if let Err(close) = self.engine.close() {
                warn!(error = %close, "close after failed open also failed");
            }
            return Err(BridgeError::EngineOpen { source, message });
        }

        if let Err(source) = self.engine.start(self.config.save_results) {
            let message = self.engine_message(&source);
            if let Err(close) = self.engine.close() {
                // The start failure is the one reported.
                warn!(error = %close, "close after failed start also failed");
            }
            return Err(BridgeError::EngineStart { source, message });
        }

        let elements = match self.elements.resolve(&self.engine) {
            Ok(elements) => elements,
            Err(err) => {
                self.release_after_failure();
                return Err(err);
            }
        };

        self.running = Some(Running {
            elements,
            last_engine_days: None,
        });
        info!("engine running");
        Ok(())
    }

    /// Apply the forcing, take one engine step and read the outputs.
    pub fn calculate(&mut self, inputs: StepInputs) -> BridgeResult<CalculateOutcome> {
        let Some(Running {
            elements,
            last_engine_days,
        }) = self.running
        else {
            return Err(BridgeError::NotRunning);
        };

        let host_days = as_days(s(inputs.host_elapsed_s));
        debug!(
            host_s = inputs.host_elapsed_s,
            host_days,
            forcing = inputs.forcing,
            "calculate"
        );

        self.engine
            .set_value(Property::GageRainfall, self.config.rain_gage, inputs.forcing);

        let status = match self.engine.step() {
            Ok(status) => status,
            Err(source) => {
                let message = self.engine_message(&source);
                self.release_after_failure();
                return Err(BridgeError::EngineStep { source, message });
            }
        };

        let engine_days = status.elapsed_days();
        let advance_min = last_engine_days.map_or(0.0, |last| as_minutes(days(engine_days - last)));
        debug!(
            engine_days,
            advance_min,
            drift_min = as_minutes(days(engine_days - host_days)),
            "time sync"
        );

        match status {
            StepStatus::Finished { .. } => {
                info!(engine_days, "simulation horizon reached, shutting down");
                self.teardown()?;
                Ok(CalculateOutcome::Completed)
            }
            StepStatus::Advanced { .. } => {
                if let Some(running) = self.running.as_mut() {
                    running.last_engine_days = Some(engine_days);
                }
                let outputs = self.read_outputs(&elements);
                debug!(?outputs, "step outputs");
                Ok(CalculateOutcome::Advanced(outputs))
            }
        }
    }

    /// End and close the engine if running. A no-op otherwise.
    pub fn cleanup(&mut self) -> BridgeResult<()> {
        if self.running.is_none() {
            debug!("not running, nothing to clean up");
            return Ok(());
        }
        self.teardown()?;
        info!("cleanup complete");
        Ok(())
    }

    fn read_outputs(&self, elements: &ResolvedElements) -> StepOutputs {
        let engine = &self.engine;
        StepOutputs {
            discharge: engine.value(Property::SubcatchRunoff, elements.subcatchment),
            volumes: elements.storage.map(|i| engine.value(Property::NodeVolume, i)),
            flows: elements.links.map(|i| engine.value(Property::LinkFlow, i)),
        }
    }

    /// End then close, always both, and forget the resolved elements.
    /// Reports the end failure ahead of a close failure.
    fn teardown(&mut self) -> BridgeResult<()> {
        self.running = None;
        self.elements.reset();

        let ended = self.engine.end().err().map(|source| {
            let message = self.engine_message(&source);
            (EngineOp::End, source, message)
        });
        let closed = self.engine.close().err().map(|source| {
            let message = self.engine_message(&source);
            (EngineOp::Close, source, message)
        });

        match (ended, closed) {
            (None, None) => Ok(()),
            (Some((op, source, message)), closed) => {
                if let Some((_, close, _)) = closed {
                    warn!(error = %close, "close failed after end failure");
                }
                Err(BridgeError::EngineCleanup {
                    op,
                    source,
                    message,
                })
            }
            (None, Some((op, source, message))) => Err(BridgeError::EngineCleanup {
                op,
                source,
                message,
            }),
        }
    }

    /// Teardown on a path that already has an error to report.
    fn release_after_failure(&mut self) {
        if let Err(err) = self.teardown() {
            warn!(error = %err, "teardown after failure also failed");
        }
    }

    fn engine_message(&mut self, err: &EngineError) -> String {
        let text = match err {
            EngineError::Call { .. } => self.engine.last_error(),
            _ => String::new(),
        };
        if text.is_empty() {
            err.to_string()
        } else {
            text
        }
    }
}

impl<E: Engine> Drop for Session<E> {
    fn drop(&mut self) {
        if self.running.is_some() {
            self.release_after_failure();
        }
    }
}

/// Check that the model path is non-empty and names an existing file.
pub fn validate_input_path(path: &Path) -> BridgeResult<()> {
    if path.as_os_str().is_empty() {
        return Err(BridgeError::InputPathMissing);
    }
    match std::fs::metadata(path) {
        Err(_) => Err(BridgeError::InputPathNotFound {
            path: path.to_path_buf(),
        }),
        Ok(meta) if meta.is_dir() => Err(BridgeError::InputPathIsDirectory {
            path: path.to_path_buf(),
        }),
        Ok(_) => Ok(()),
    }
}
