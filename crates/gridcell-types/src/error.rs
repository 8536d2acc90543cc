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

use crate::markets::Market;
use thiserror::Error;

/// Invalid battery configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecError {
    #[error("Power rating must be positive, got {0} MW")]
    InvalidPower(f64),

    #[error("Energy capacity must be positive, got {0} MWh")]
    InvalidCapacity(f64),

    #[error("Degradation rate must lie in [0, 1), got {0}")]
    InvalidDegradation(f64),

    #[error("{name} efficiency must lie in (0, 1], got {value}")]
    InvalidEfficiency { name: &'static str, value: f64 },

    #[error(
        "Charging and discharging efficiencies must differ for optimisation, got {eta_chg} and {eta_dchg}"
    )]
    DegenerateEfficiencies { eta_chg: f64, eta_dchg: f64 },
}

/// Malformed backtest input arrays
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Input series is empty")]
    Empty,

    #[error("Interval length must be positive and finite, got {0} h")]
    InvalidInterval(f64),

    #[error("Forecast horizon must be at least one step")]
    EmptyHorizon,

    #[error("Length mismatch: {forecast} forecast rows, {realised} realised rows, {timestamps} timestamps")]
    LengthMismatch {
        forecast: usize,
        realised: usize,
        timestamps: usize,
    },

    #[error("Realised {market:?} price at interval {interval} is not finite: {value}")]
    NonFiniteRealised {
        interval: usize,
        market: Market,
        value: f64,
    },

    #[error("Forecast buffer holds {actual} values, expected {expected}")]
    ForecastShape { expected: usize, actual: usize },

    #[error("Timestamp gap at interval {index}: expected {expected_secs}s cadence, got {actual_secs}s")]
    IrregularCadence {
        index: usize,
        expected_secs: i64,
        actual_secs: i64,
    },
}
