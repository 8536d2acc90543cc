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

//! Shared data model for GridCell battery backtests.
//!
//! - [`BatterySpec`]: physical/economic battery configuration
//! - [`BacktestInputData`]: forecast tensor, realised prices and timestamps
//! - [`ActionVector`]: one interval's multi-market dispatch decision
//! - [`BacktestResults`]: the output trajectory of a run

pub mod action;
pub mod battery;
pub mod error;
pub mod input;
pub mod markets;
pub mod results;

pub use action::ActionVector;
pub use battery::{BatterySpec, ensure_distinct_efficiencies};
pub use error::{InputError, SpecError};
pub use input::{BacktestInputData, DEFAULT_DT_H, ForecastWindow, PriceRow, TruncatedWindow};
pub use markets::{
    ActionSlot, FIVE_MINUTES_H, FcasCallModel, Market, N_ACTIONS, N_MARKETS, PoolSide, Region,
};
pub use results::BacktestResults;
