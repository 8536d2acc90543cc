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

//! The backtest loop.
//!
//! For every dispatch interval the engine:
//! - Queries the strategy with the forecast window and last realised prices
//! - Makes the action feasible (clamp, pools, mutual exclusion, headroom)
//! - Applies wear, draws FCAS calls and moves SOC, or rejects the interval
//! - Books revenue and records the new battery state

use crate::config::EngineConfig;
use crate::dispatch::{degraded_capacity, draw_calls, energy_delta, interval_revenue};
use crate::error::BacktestError;
use crate::feasibility::{HeadroomState, SimultaneousDispatch, enforce};
use gridcell_strategy::{DecisionContext, Strategy};
use gridcell_types::{
    ActionVector, BacktestInputData, BacktestResults, BatterySpec, N_ACTIONS, N_MARKETS, PriceRow,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

/// SOC overshoot tolerated as floating-point noise (MWh)
const SOC_EPSILON: f64 = 1e-9;

/// Price row handed to strategies before any interval has been realised
const NO_PRICE: PriceRow = [f64::NAN; N_MARKETS];

/// Battery state carried between intervals
#[derive(Debug, Clone, Copy, PartialEq)]
struct BatteryState {
    /// Stored energy (MWh)
    c_soc: f64,
    /// Usable capacity (MWh)
    c_max: f64,
}

/// Outcome of a single interval
#[derive(Debug, Clone, PartialEq)]
struct IntervalOutcome {
    state: BatteryState,
    action_mw: ActionVector,
    revenue: [f64; N_ACTIONS],
    rejected: bool,
}

/// Simulates one battery against one input series
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    battery: BatterySpec,
    config: EngineConfig,
}

impl BacktestEngine {
    /// Create an engine, validating the battery and configuration
    pub fn new(battery: BatterySpec, config: EngineConfig) -> Result<Self, BacktestError> {
        battery.validate()?;
        config.validate(&battery)?;
        Ok(Self { battery, config })
    }


    /// Run `strategy` over every interval of `data`.
    ///
    /// Range, feasibility and solver trouble are logged and never abort the
    /// run. Errors are returned only for strategy configuration errors and,
    /// under the strict policy, simultaneous charge and discharge.
    pub fn run<S: Strategy + ?Sized>(
        &self,
        data: &BacktestInputData,
        strategy: &mut S,
    ) -> Result<BacktestResults, BacktestError> {
        let name = strategy.name().to_owned();
        info!(
            strategy = %name,
            intervals = data.len(),
            horizon = data.horizon(),
            seed = self.config.seed,
            "Starting backtest"
        );

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut state = BatteryState {
            c_soc: self.config.initial_soc_mwh,
            c_max: self.battery.e_max,
        };
        let mut results = BacktestResults::with_capacity(name.clone(), data.len());

        for t in 0..data.len() {
            let outcome = self.step(data, t, state, strategy, &mut rng)?;
            state = outcome.state;
            results.record(
                &outcome.action_mw,
                state.c_soc,
                state.c_max,
                outcome.revenue,
                outcome.rejected,
            );
        }

        info!(
            strategy = %name,
            total_revenue = results.total_revenue(),
            rejected = results.rejected_intervals(),
            final_capacity = state.c_max,
            "Backtest complete"
        );
        Ok(results)
    }

    /// Advance the battery through interval `t`
    fn step<S: Strategy + ?Sized>(
        &self,
        data: &BacktestInputData,
        t: usize,
        state: BatteryState,
        strategy: &mut S,
        rng: &mut StdRng,
    ) -> Result<IntervalOutcome, BacktestError> {
        let dt = data.dt();
        let (Some(forecast), Some(prices)) = (data.forecast_at(t), data.realised_at(t)) else {
            return Ok(IntervalOutcome::idle(state));
        };
        let last_price = t
            .checked_sub(1)
            .and_then(|prev| data.realised_at(prev))
            .unwrap_or(&NO_PRICE);

        let ctx = DecisionContext {
            forecast,
            c_soc: state.c_soc,
            c_max: state.c_max,
            p_max: self.battery.p_max,
            eta_chg: self.battery.eta_chg,
            eta_dchg: self.battery.eta_dchg,
            last_price,
            dt,
        };
        let mut action = strategy
            .action(&ctx)
            .map_err(|source| BacktestError::Strategy {
                strategy: strategy.name().to_owned(),
                interval: t,
                source,
            })?;

        let headroom = HeadroomState {
            c_soc: state.c_soc,
            c_max: state.c_max,
            p_max: self.battery.p_max,
            dt,
        };
        let report = enforce(&mut action, self.config.mutual_exclusion, &headroom).map_err(
            |SimultaneousDispatch { charge, discharge }| BacktestError::SimultaneousChargeDischarge {
                strategy: strategy.name().to_owned(),
                interval: t,
                charge,
                discharge,
            },
        )?;
        if report.range_violations > 0 {
            warn!(
                interval = t,
                violations = report.range_violations,
                "Action components outside [0, 1] were clamped"
            );
        }
        if !report.scaled_pools.is_empty() {
            warn!(
                interval = t,
                sides = ?report.scaled_pools,
                "Power pool over-committed, scaled down"
            );
        }
        if let Some((charge, discharge)) = report.simultaneous {
            warn!(
                interval = t,
                charge,
                discharge,
                "Simultaneous charge and discharge, zeroing both"
            );
        }
        if !report.headroom_zeroed.is_empty() {
            debug!(interval = t, slots = ?report.headroom_zeroed, "FCAS commitments zeroed");
        }

        let new_c_max = degraded_capacity(
            state.c_max,
            &action,
            &self.battery,
            self.config.degradation,
            dt,
        );
        let called = draw_calls(&action, &self.config.fcas, rng);
        let proposed = state.c_soc + energy_delta(&action, &called, &self.battery, dt);

        let Some(c_soc) = within_bounds(proposed, new_c_max) else {
            warn!(
                interval = t,
                proposed_soc = proposed,
                c_max = new_c_max,
                "SOC bound breached, rejecting interval"
            );
            return Ok(IntervalOutcome {
                rejected: true,
                ..IntervalOutcome::idle(state)
            });
        };

        let action_mw = ActionVector(action.0.map(|fraction| fraction * self.battery.p_max));
        Ok(IntervalOutcome {
            state: BatteryState {
                c_soc,
                c_max: new_c_max,
            },
            revenue: interval_revenue(&action_mw, prices, dt),
            action_mw,
            rejected: false,
        })
    }
}

impl IntervalOutcome {
    fn idle(state: BatteryState) -> Self {
        Self {
            state,
            action_mw: ActionVector::zero(),
            revenue: [0.0; N_ACTIONS],
            rejected: false,
        }
    }
}

/// Snap tiny overshoots onto the bounds, `None` for a real breach
fn within_bounds(soc: f64, c_max: f64) -> Option<f64> {
    if !soc.is_finite() || soc < -SOC_EPSILON || soc > c_max + SOC_EPSILON {
        return None;
    }
    Some(soc.clamp(0.0, c_max))
}

/// Convenience for a single run with a freshly built engine
pub fn run_backtest<S: Strategy + ?Sized>(
    battery: BatterySpec,
    config: EngineConfig,
    data: &BacktestInputData,
    strategy: &mut S,
) -> Result<BacktestResults, BacktestError> {
    BacktestEngine::new(battery, config)?.run(data, strategy)
}
