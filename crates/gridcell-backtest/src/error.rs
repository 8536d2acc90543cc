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

use gridcell_strategy::StrategyError;
use gridcell_types::{InputError, SpecError};
use thiserror::Error;

/// Errors that stop a backtest before or during the run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BacktestError {
    #[error("Invalid battery: {0}")]
    Spec(#[from] SpecError),

    #[error("Invalid input data: {0}")]
    Input(#[from] InputError),

    #[error("Invalid engine configuration: {0}")]
    Config(String),

    #[error("Strategy '{strategy}' failed at interval {interval}: {source}")]
    Strategy {
        strategy: String,
        interval: usize,
        #[source]
        source: StrategyError,
    },

    #[error(
        "Strategy '{strategy}' requested charge ({charge}) and discharge ({discharge}) together at interval {interval}"
    )]
    SimultaneousChargeDischarge {
        strategy: String,
        interval: usize,
        charge: f64,
        discharge: f64,
    },
}
