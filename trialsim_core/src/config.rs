//! Configuration file support for trialsim.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/trialsim/config.toml`.
//! Every section is optional; command-line flags override file values.

use crate::catalog::{build_default_catalog, ProtocolSpec};
use crate::{Arm, Error, ProtocolCatalog, Result, RunParams};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub run: RunConfig,

    /// Raw protocol tables keyed by arm name, replacing catalog entries
    #[serde(default)]
    pub protocols: BTreeMap<String, ProtocolSpec>,
}

/// Output location configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// Default run parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_weeks")]
    pub weeks: u32,

    #[serde(default = "default_participants")]
    pub participants: usize,

    #[serde(default = "default_arms")]
    pub arms: Vec<String>,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default)]
    pub energy_matched: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            weeks: default_weeks(),
            participants: default_participants(),
            arms: default_arms(),
            seed: default_seed(),
            energy_matched: false,
        }
    }
}

// Default value functions
fn default_output_dir() -> PathBuf {
    match dirs::data_local_dir() {
        Some(base) => base.join("trialsim"),
        None => PathBuf::from("data"),
    }
}

fn default_weeks() -> u32 {
    8
}

fn default_participants() -> usize {
    100
}

fn default_arms() -> Vec<String> {
    Arm::ALL.iter().map(|a| a.as_str().to_string()).collect()
}

fn default_seed() -> u64 {
    42
}

impl RunConfig {
    /// Resolve arm names into validated run parameters
    pub fn to_params(&self) -> Result<RunParams> {
        let arms = self
            .arms
            .iter()
            .map(|name| name.parse::<Arm>())
            .collect::<Result<Vec<_>>>()?;

        let params = RunParams {
            weeks: self.weeks,
            participants: self.participants,
            arms,
            seed: self.seed,
            energy_matched: self.energy_matched,
        };
        params.validate()?;
        Ok(params)
    }
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let Some(config_path) = Self::default_config_path() else {
            tracing::info!("No config directory available, using defaults");
            return Ok(Self::default());
        };

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("trialsim").join("config.toml"))
    }

    /// Built-in catalog with this config's protocol overrides applied
    pub fn catalog(&self) -> Result<ProtocolCatalog> {
        build_default_catalog().with_overrides(&self.protocols)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionType;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.run.weeks, 8);
        assert_eq!(config.run.participants, 100);
        assert_eq!(config.run.seed, 42);
        assert_eq!(config.run.arms.len(), 4);
        assert!(config.protocols.is_empty());
    }

    #[test]
    fn test_default_run_matches_params_default() {
        let params = Config::default().run.to_params().unwrap();
        assert_eq!(params, RunParams::default());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.run.seed = 7;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.run.seed, 7);
        assert_eq!(loaded.run.arms, config.run.arms);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[run]
weeks = 12
arms = ["control", "sit"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.run.weeks, 12);
        assert_eq!(config.run.participants, 100); // default

        let params = config.run.to_params().unwrap();
        assert_eq!(params.arms, vec![Arm::Control, Arm::SprintInterval]);
    }

    #[test]
    fn test_unknown_arm_in_config() {
        let config: Config = toml::from_str("[run]\narms = [\"spin\"]\n").unwrap();
        assert!(config.run.to_params().unwrap_err().is_config());
    }

    #[test]
    fn test_protocol_override_tables() {
        let toml_str = r#"
[protocols.sprint-interval]
session_type = "sit"
session_energy_cost = 200.0
excess_post_exercise_energy = 50.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let catalog = config.catalog().unwrap();
        let sit = catalog.protocol_for(Arm::SprintInterval);
        assert_eq!(sit.session_type, SessionType::SprintInterval);
        assert_eq!(sit.session_energy_cost, Some(200.0));
        assert_eq!(sit.excess_post_exercise_energy, Some(50.0));
        assert_eq!(sit.compensation_fraction, None);
    }

    #[test]
    fn test_protocol_without_session_type() {
        let toml_str = r#"
[protocols.low-intensity]
session_energy_cost = 200.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let err = config.catalog().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("session_type"));
    }

    #[test]
    fn test_mixed_protocol_override_rejected() {
        let toml_str = r#"
[protocols.mixed]
session_type = "mixed"
session_energy_cost = 900.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let err = config.catalog().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("mixed arm"));
    }
}
