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

//! Battery dispatch strategies.
//!
//! Every strategy implements [`Strategy`]: given a [`DecisionContext`] it
//! returns the fraction of `p_max` to commit to each action slot for the next
//! dispatch interval.
//!
//! - [`IdleStrategy`], [`NaiveBaseline`], [`ForecastBaseline`]: threshold rules
//! - [`QuantilePicker`]: trades the tails of the forecast distribution
//! - [`DynamicProgramming`]: energy-only search over a discretized SOC grid
//! - [`ConvexFcas`]: receding-horizon LP over energy and all FCAS markets

mod baseline;
mod config;
mod context;
mod convex;
mod dynamic;
mod error;
mod quantile;

pub use baseline::{ForecastBaseline, IdleStrategy, NaiveBaseline, ThresholdRule};
pub use config::StrategyConfig;
pub use context::{DecisionContext, Strategy};
pub use convex::ConvexFcas;
pub use dynamic::{DEFAULT_HORIZON, DEFAULT_SOC_LEVELS, DynamicProgramming};
pub use error::StrategyError;
pub use quantile::{QuantilePicker, quantile};
