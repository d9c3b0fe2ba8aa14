//! Bridge configuration.
//!
//! Every key has a default matching the treatment-train model, so an absent or
//! partial file is valid.
//!
//! ```yaml
//! model:
//!   input: model.inp
//!   report: model.rpt
//!   output: model.out
//! elements:
//!   subcatchment: S1
//!   storage: [ST1, ST2, ST3]
//!   outfall: J2
//!   links: [C1, C2, C3]
//! rain_gage: 0
//! save_results: true
//! logging:
//!   level: info
//!   file: bridge_debug.log
//! ```

use sb_engine::ModelFiles;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "SWMM_BRIDGE_CONFIG";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {what}")]
    Invalid { what: String },
}

/// Names of the elements exchanged with the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementNames {
    /// Subcatchment whose runoff is reported as discharge.
    pub subcatchment: String,
    /// Bioswale, detention and retention storage nodes.
    pub storage: [String; 3],
    pub outfall: String,
    /// Bioswale→detention, detention→retention, retention→outfall.
    pub links: [String; 3],
}

impl Default for ElementNames {
    fn default() -> Self {
        Self {
            subcatchment: "S1".into(),
            storage: ["ST1".into(), "ST2".into(), "ST3".into()],
            outfall: "J2".into(),
            links: ["C1".into(), "C2".into(), "C3".into()],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of off, error, warn, info, debug, trace.
    pub level: String,
    /// Log file, truncated on first use. `None` logs to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: Some(PathBuf::from("bridge_debug.log")),
        }
    }
}

impl LogConfig {
    pub fn level_filter(&self) -> ConfigResult<LevelFilter> {
        self.level.parse().map_err(|_| ConfigError::Invalid {
            what: format!("unknown log level '{}'", self.level),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub model: ModelFiles,
    pub elements: ElementNames,
    /// Gage index receiving the forcing scalar.
    pub rain_gage: usize,
    /// Passed to the engine's start call.
    pub save_results: bool,
    pub logging: LogConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            model: ModelFiles::default(),
            elements: ElementNames::default(),
            rain_gage: 0,
            save_results: true,
            logging: LogConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: BridgeConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load from the file named by `SWMM_BRIDGE_CONFIG`, or defaults when unset.
    pub fn from_env() -> ConfigResult<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let names = &self.elements;
        let all = std::iter::once(&names.subcatchment)
            .chain(names.storage.iter())
            .chain(std::iter::once(&names.outfall))
            .chain(names.links.iter());
        for name in all {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    what: "element names must not be empty".into(),
                });
            }
        }
        self.logging.level_filter()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_treatment_train() {
        let config = BridgeConfig::default();
        assert_eq!(config.model.input, PathBuf::from("model.inp"));
        assert_eq!(config.elements.storage[1], "ST2");
        assert_eq!(config.elements.links[2], "C3");
        assert_eq!(config.rain_gage, 0);
        assert!(config.save_results);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = BridgeConfig::from_yaml_str(
            "model:\n  input: pond.inp\nelements:\n  outfall: OUT1\n",
        )
        .unwrap();
        assert_eq!(config.model.input, PathBuf::from("pond.inp"));
        assert_eq!(config.model.report, PathBuf::from("model.rpt"));
        assert_eq!(config.elements.outfall, "OUT1");
        assert_eq!(config.elements.subcatchment, "S1");
    }

    #[test]
    fn empty_element_name_rejected() {
        let err = BridgeConfig::from_yaml_str("elements:\n  subcatchment: \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn unknown_log_level_rejected() {
        let err = BridgeConfig::from_yaml_str("logging:\n  level: chatty\n").unwrap_err();
        assert!(err.to_string().contains("chatty"));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = BridgeConfig::from_yaml_str("elements: [").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn yaml_round_trip() {
        let mut config = BridgeConfig::default();
        config.rain_gage = 2;
        config.logging.file = None;
        let text = config.to_yaml().unwrap();
        assert_eq!(BridgeConfig::from_yaml_str(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_reports_path() {
        let path = std::env::temp_dir().join("sb_bridge_no_such_config.yaml");
        let err = BridgeConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("sb_bridge_no_such_config.yaml"));
    }
}
