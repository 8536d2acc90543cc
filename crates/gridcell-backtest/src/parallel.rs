// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of GridCell.

use crate::engine::BacktestEngine;
use crate::error::BacktestError;
use gridcell_strategy::{Strategy, StrategyConfig};
use gridcell_types::{BacktestInputData, BacktestResults};
use rayon::prelude::*;

/// Backtests independent strategies against the same input in parallel.
///
/// Runs share nothing mutable: each owns its strategy and seeds its own
/// RNG from the engine config, so results match sequential runs exactly.
#[derive(Debug, Clone)]
pub struct ParallelRunner {
    engine: BacktestEngine,
}

impl ParallelRunner {
    #[must_use]
    pub fn new(engine: BacktestEngine) -> Self {
        Self { engine }
    }

    /// Run all strategies in parallel, results in input order
    pub fn run_all(
        &self,
        data: &BacktestInputData,
        strategies: Vec<Box<dyn Strategy>>,
    ) -> Vec<Result<BacktestResults, BacktestError>> {
        strategies
            .into_par_iter()
            .map(|mut strategy| self.engine.run(data, &mut strategy))
            .collect()
    }

    /// Build every configured strategy, then run them all.
    ///
    /// Fails before any simulation if a strategy cannot be built.
    pub fn run_configs(
        &self,
        data: &BacktestInputData,
        configs: &[StrategyConfig],
    ) -> Result<Vec<Result<BacktestResults, BacktestError>>, BacktestError> {
        let strategies = configs
            .iter()
            .map(|config| {
                config.build().map_err(|source| BacktestError::Strategy {
                    strategy: config.kind().to_owned(),
                    interval: 0,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.run_all(data, strategies))
    }
}
