// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of GridCell.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use crate::baseline::{ForecastBaseline, IdleStrategy, NaiveBaseline};
use crate::context::Strategy;
use crate::convex::ConvexFcas;
use crate::dynamic::{DEFAULT_SOC_LEVELS, DynamicProgramming};
use crate::error::StrategyError;
use crate::quantile::{DEFAULT_CHARGE_QUANTILE, DEFAULT_DISCHARGE_QUANTILE, QuantilePicker};
use gridcell_types::FcasCallModel;
use serde::{Deserialize, Serialize};

/// Declarative strategy selection, e.g. one `[[strategies]]` table in a run
/// configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    Idle,

    NaiveBaseline {
        charge_limit: f64,
        discharge_limit: f64,
    },

    ForecastBaseline {
        charge_limit: f64,
        discharge_limit: f64,
    },

    QuantilePicker {
        #[serde(default = "default_charge_quantile")]
        charge_quantile: f64,
        #[serde(default = "default_discharge_quantile")]
        discharge_quantile: f64,
    },

    DynamicProgramming {
        #[serde(default)]
        gamma: f64,
        #[serde(default = "default_horizon")]
        horizon: usize,
        #[serde(default = "default_soc_levels")]
        n_soc: usize,
    },

    ConvexFcas {
        #[serde(default)]
        gamma: f64,
        #[serde(default = "default_horizon")]
        horizon: usize,
        #[serde(default)]
        fcas: FcasCallModel,
    },
}

fn default_charge_quantile() -> f64 {
    DEFAULT_CHARGE_QUANTILE
}

fn default_discharge_quantile() -> f64 {
    DEFAULT_DISCHARGE_QUANTILE
}

fn default_horizon() -> usize {
    crate::dynamic::DEFAULT_HORIZON
}

fn default_soc_levels() -> usize {
    DEFAULT_SOC_LEVELS
}

impl StrategyConfig {
    /// Instantiate the configured strategy, validating its parameters
    pub fn build(&self) -> Result<Box<dyn Strategy>, StrategyError> {
        Ok(match *self {
            StrategyConfig::Idle => Box::new(IdleStrategy),
            StrategyConfig::NaiveBaseline {
                charge_limit,
                discharge_limit,
            } => Box::new(NaiveBaseline::new(charge_limit, discharge_limit)?),
            StrategyConfig::ForecastBaseline {
                charge_limit,
                discharge_limit,
            } => Box::new(ForecastBaseline::new(charge_limit, discharge_limit)?),
            StrategyConfig::QuantilePicker {
                charge_quantile,
                discharge_quantile,
            } => Box::new(QuantilePicker::new(charge_quantile, discharge_quantile)?),
            StrategyConfig::DynamicProgramming {
                gamma,
                horizon,
                n_soc,
            } => Box::new(DynamicProgramming::new(gamma, horizon, n_soc)?),
            StrategyConfig::ConvexFcas {
                gamma,
                horizon,
                fcas,
            } => Box::new(ConvexFcas::new(gamma, horizon, fcas)?),
        })
    }

    /// Tag used in configuration files
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyConfig::Idle => "idle",
            StrategyConfig::NaiveBaseline { .. } => "naive_baseline",
            StrategyConfig::ForecastBaseline { .. } => "forecast_baseline",
            StrategyConfig::QuantilePicker { .. } => "quantile_picker",
            StrategyConfig::DynamicProgramming { .. } => "dynamic_programming",
            StrategyConfig::ConvexFcas { .. } => "convex_fcas",
        }
    }
}
