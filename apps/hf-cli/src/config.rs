//! Experiment configuration loaded from YAML.

use std::collections::BTreeMap;
use std::path::Path;

use clap::ValueEnum;
use hf_engine::InterfaceKind;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// How the model is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    /// The instance steps itself with its fixed-step solver.
    #[default]
    CoSimulation,
    /// The CLI integrates with forward Euler and handles events.
    ModelExchange,
}

impl From<RunKind> for InterfaceKind {
    fn from(kind: RunKind) -> Self {
        match kind {
            RunKind::CoSimulation => InterfaceKind::CoSimulation,
            RunKind::ModelExchange => InterfaceKind::ModelExchange,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub model: String,
    pub kind: RunKind,
    /// Communication step (co-simulation) or host step (model exchange).
    pub step_size: f64,
    pub stop_time: f64,
    pub debug_logging: bool,
    /// Start overrides by variable name, applied in initialization mode.
    pub parameters: BTreeMap<String, f64>,
    pub inputs: BTreeMap<String, f64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            model: "oscillator".to_string(),
            kind: RunKind::default(),
            step_size: 0.01,
            stop_time: 1.0,
            debug_logging: false,
            parameters: BTreeMap::new(),
            inputs: BTreeMap::new(),
        }
    }
}

impl ExperimentConfig {
    pub fn from_yaml(text: &str) -> CliResult<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn validate(&self) -> CliResult<()> {
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(CliError::InvalidConfig {
                what: format!("step_size must be positive, got {}", self.step_size),
            });
        }
        if !(self.stop_time.is_finite() && self.stop_time >= 0.0) {
            return Err(CliError::InvalidConfig {
                what: format!("stop_time must be non-negative, got {}", self.stop_time),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = ExperimentConfig::from_yaml("model: bouncing_ball\n").unwrap();
        assert_eq!(config.model, "bouncing_ball");
        assert_eq!(config.kind, RunKind::CoSimulation);
        assert_eq!(config.step_size, 0.01);
    }

    #[test]
    fn full_config_parses() {
        let yaml = r#"
model: oscillator
kind: model_exchange
step_size: 0.001
stop_time: 2.0
debug_logging: true
parameters:
  zeta: 0.1
inputs:
  force: 0.5
"#;
        let config = ExperimentConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.kind, RunKind::ModelExchange);
        assert_eq!(config.parameters["zeta"], 0.1);
        assert_eq!(config.inputs["force"], 0.5);
        assert!(config.debug_logging);
    }

    #[test]
    fn rejects_non_positive_step() {
        let err = ExperimentConfig::from_yaml("step_size: 0.0\n").unwrap_err();
        assert!(matches!(err, CliError::InvalidConfig { .. }));
    }
}
