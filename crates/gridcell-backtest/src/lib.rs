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

//! Battery backtest engine.
//!
//! Drives a [`Strategy`](gridcell_strategy::Strategy) through a
//! [`BacktestInputData`](gridcell_types::BacktestInputData) series, one dispatch
//! interval at a time, and records the resulting
//! [`BacktestResults`](gridcell_types::BacktestResults).

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod feasibility;
pub mod parallel;

pub use config::{DegradationPolicy, EngineConfig, MutualExclusionPolicy, RunConfig};
pub use engine::{BacktestEngine, run_backtest};
pub use error::BacktestError;
pub use feasibility::FeasibilityReport;
pub use parallel::ParallelRunner;
