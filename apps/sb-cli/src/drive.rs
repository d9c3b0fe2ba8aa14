//! Host-side realization driver.
//!
//! Plays the host's role against a [`Session`]: one Initialize, one Calculate
//! per rainfall value, Cleanup at the end.

use crate::error::{CliError, CliResult};
use sb_bridge::{CalculateOutcome, Session, StepInputs, StepOutputs};
use sb_engine::Engine;
use std::io::Write;
use std::path::Path;

const COLUMNS: [&str; 8] = [
    "time_s",
    "discharge",
    "vol_bioswale",
    "vol_detention",
    "vol_retention",
    "q_bioswale_detention",
    "q_detention_retention",
    "q_retention_outfall",
];

/// How a realization ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finish {
    /// Every rainfall value was consumed.
    SeriesExhausted { steps: usize },
    /// The engine reached its horizon first.
    EngineCompleted { steps: usize },
}

/// One value per non-blank line. `#` starts a comment.
pub fn parse_rainfall(content: &str) -> CliResult<Vec<f64>> {
    let mut series = Vec::new();
    for (i, raw) in content.lines().enumerate() {
        let text = raw.split('#').next().unwrap_or_default().trim();
        if text.is_empty() {
            continue;
        }
        let value = text.parse::<f64>().map_err(|_| CliError::RainfallParse {
            line: i + 1,
            text: text.to_string(),
        })?;
        series.push(value);
    }
    Ok(series)
}

pub fn load_rainfall(path: &Path) -> CliResult<Vec<f64>> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::RainfallRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rainfall(&content)
}

/// Run one realization, writing a row per continuing step to `out`.
pub fn run_realization<E: Engine, W: Write>(
    session: &mut Session<E>,
    rainfall: &[f64],
    dt_s: f64,
    json: bool,
    out: &mut W,
) -> CliResult<Finish> {
    session.initialize()?;
    if !json {
        writeln!(out, "{}", COLUMNS.join("\t"))?;
    }

    for (step, forcing) in rainfall.iter().enumerate() {
        let time_s = step as f64 * dt_s;
        let inputs = StepInputs {
            host_elapsed_s: time_s,
            forcing: *forcing,
        };
        match session.calculate(inputs)? {
            CalculateOutcome::Advanced(outputs) => write_row(out, time_s, &outputs, json)?,
            CalculateOutcome::Completed => {
                tracing::info!(step, "engine finished before the rainfall series");
                return Ok(Finish::EngineCompleted { steps: step });
            }
        }
    }

    session.cleanup()?;
    Ok(Finish::SeriesExhausted {
        steps: rainfall.len(),
    })
}

fn write_row<W: Write>(out: &mut W, time_s: f64, outputs: &StepOutputs, json: bool) -> CliResult<()> {
    let values = outputs.to_array();
    if json {
        let mut row = serde_json::Map::new();
        row.insert(COLUMNS[0].into(), time_s.into());
        for (name, value) in COLUMNS[1..].iter().zip(values) {
            row.insert((*name).into(), value.into());
        }
        serde_json::to_writer(&mut *out, &row)?;
        writeln!(out)?;
    } else {
        let cells: Vec<String> = std::iter::once(time_s)
            .chain(values)
            .map(|v| format!("{v:.6}"))
            .collect();
        writeln!(out, "{}", cells.join("\t"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_bridge::{BridgeConfig, BridgeError, SessionState};
    use sb_engine::testing::ScriptedEngine;
    use sb_engine::{EngineOp, Property};

    fn session(engine: ScriptedEngine, tag: &str) -> Session<ScriptedEngine> {
        let input = std::env::temp_dir().join(format!("sb_cli_{tag}.inp"));
        std::fs::write(&input, "[TITLE]\n").unwrap();
        let mut config = BridgeConfig::default();
        config.model.input = input;
        config.logging.file = None;
        Session::new(engine, config)
    }

    #[test]
    fn rainfall_skips_comments_and_blanks() {
        let series = parse_rainfall("# mm/hr\n0.0\n\n 1.5  # peak\n0.25\n").unwrap();
        assert_eq!(series, vec![0.0, 1.5, 0.25]);
    }

    #[test]
    fn rainfall_reports_bad_line() {
        let err = parse_rainfall("0.0\nheavy\n").unwrap_err();
        assert!(matches!(err, CliError::RainfallParse { line: 2, .. }));
    }

    #[test]
    fn table_has_one_row_per_step() {
        let mut s = session(ScriptedEngine::treatment_train(), "table");
        let mut out = Vec::new();

        let finish = run_realization(&mut s, &[0.0, 1.0, 2.0], 300.0, false, &mut out).unwrap();

        assert_eq!(finish, Finish::SeriesExhausted { steps: 3 });
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("time_s\tdischarge"));
        assert!(lines[3].starts_with("600.000000\t205.000000"));
        assert_eq!(s.state(), SessionState::Uninitialized);
        assert_eq!(s.engine().calls_of(EngineOp::Close), 1);
        assert_eq!(s.engine().peek(Property::GageRainfall, 0), 2.0);
    }

    #[test]
    fn json_rows_carry_named_fields() {
        let mut s = session(ScriptedEngine::treatment_train(), "json");
        let mut out = Vec::new();

        run_realization(&mut s, &[0.5], 60.0, true, &mut out).unwrap();

        let row: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(row["time_s"], 0.0);
        assert_eq!(row["discharge"], 205.0);
        assert_eq!(row["q_retention_outfall"], 410.2);
    }

    #[test]
    fn engine_completion_stops_early() {
        let engine = ScriptedEngine::treatment_train().with_step_codes([0, 1]);
        let mut s = session(engine, "early");
        let mut out = Vec::new();

        let finish = run_realization(&mut s, &[0.0; 5], 300.0, true, &mut out).unwrap();

        assert_eq!(finish, Finish::EngineCompleted { steps: 1 });
        assert_eq!(s.engine().calls_of(EngineOp::Step), 2);
        assert!(!s.engine().is_open());
    }

    #[test]
    fn initialize_failure_is_returned() {
        let engine = ScriptedEngine::treatment_train().fail_on(EngineOp::Open, 200);
        let mut s = session(engine, "open_fails");
        let mut out = Vec::new();

        let err = run_realization(&mut s, &[0.0], 300.0, false, &mut out).unwrap_err();

        assert!(matches!(err, CliError::Bridge(BridgeError::EngineOpen { .. })));
        assert!(out.is_empty());
    }
}
