// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of GridCell.

//! TOML configuration for backtest runs.

use crate::error::BacktestError;
use anyhow::{Context, Result};
use gridcell_strategy::StrategyConfig;
use gridcell_types::{BatterySpec, FcasCallModel};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What to do when charge and discharge are both still positive after
/// power-pool normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutualExclusionPolicy {
    /// Warn and zero both energy slots
    #[default]
    ZeroBoth,
    /// Abort the run with an error
    Strict,
}

/// How capacity fades when the battery moves energy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationPolicy {
    /// `c_max *= 1 - deg` for every interval with a charge or discharge
    #[default]
    PerAction,
    /// `deg` scaled by the share of a full-power 5-minute interval actually
    /// moved, capped at one
    Throughput,
}

/// Engine behaviour shared by every strategy in a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seed for FCAS call draws
    #[serde(default)]
    pub seed: u64,

    /// State of charge at the start of the run (MWh)
    #[serde(default)]
    pub initial_soc_mwh: f64,

    #[serde(default)]
    pub mutual_exclusion: MutualExclusionPolicy,

    #[serde(default)]
    pub degradation: DegradationPolicy,

    /// FCAS call probabilities
    #[serde(default)]
    pub fcas: FcasCallModel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            initial_soc_mwh: 0.0,
            mutual_exclusion: MutualExclusionPolicy::default(),
            degradation: DegradationPolicy::default(),
            fcas: FcasCallModel::default(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_initial_soc(mut self, initial_soc_mwh: f64) -> Self {
        self.initial_soc_mwh = initial_soc_mwh;
        self
    }

    /// Check the configuration against the battery it will drive
    pub fn validate(&self, battery: &BatterySpec) -> Result<(), BacktestError> {
        if !self.fcas.is_valid() {
            return Err(BacktestError::Config(format!(
                "FCAS call probabilities must lie in [0, 1], got {:?}",
                self.fcas.call_probability
            )));
        }
        if !(0.0..=battery.e_max).contains(&self.initial_soc_mwh) {
            return Err(BacktestError::Config(format!(
                "Initial SOC {} MWh outside [0, {}]",
                self.initial_soc_mwh, battery.e_max
            )));
        }
        Ok(())
    }
}

/// Root of a run configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub battery: BatterySpec,

    /// Strategies to backtest against the same input
    pub strategies: Vec<StrategyConfig>,
}

impl RunConfig {
    /// Load run configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid run config: {}", path.display()))
    }

    /// Parse and validate a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RunConfig = toml::from_str(content).context("Failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.battery.validate().context("Invalid [battery] section")?;
        self.engine
            .validate(&self.battery)
            .context("Invalid [engine] section")?;
        if self.strategies.is_empty() {
            anyhow::bail!("At least one [[strategies]] entry is required");
        }
        Ok(())
    }

    /// Generate example run config as TOML string
    #[must_use]
    pub fn example_toml() -> String {
        r#"# GridCell - Backtest Run Configuration Example

[engine]
seed = 42
initial_soc_mwh = 0.0
mutual_exclusion = "zero_both"   # zero_both or strict
degradation = "per_action"       # per_action or throughput

[engine.fcas]
# RAISE6SEC, RAISE60SEC, RAISE5MIN, LOWER6SEC, LOWER60SEC, LOWER5MIN
call_probability = [0.05, 0.05, 0.05, 0.05, 0.05, 0.05]

[battery]
p_max = 50.0      # MW
e_max = 50.0      # MWh
deg = 0.0         # capacity loss per action
eta_chg = 0.90
eta_dchg = 0.95

[[strategies]]
type = "idle"

[[strategies]]
type = "naive_baseline"
charge_limit = 30.0
discharge_limit = 150.0

[[strategies]]
type = "quantile_picker"
charge_quantile = 0.10
discharge_quantile = 0.90

[[strategies]]
type = "dynamic_programming"
gamma = 0.0
horizon = 288
n_soc = 100

[[strategies]]
type = "convex_fcas"
gamma = 0.5
horizon = 288
"#
        .to_owned()
    }
}
