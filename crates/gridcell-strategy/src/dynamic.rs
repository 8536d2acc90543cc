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

//! Energy-only horizon search over a discretized SOC grid.
//!
//! `value(t, i)` is the minimum net cost from step `t` to the end of the
//! forecast, starting at grid level `i`. Each step may idle, charge one
//! full-power interval (moving up `step_chg` levels) or discharge one
//! full-power interval (moving down `step_dchg` levels). Values are computed
//! lazily top-down and memoized, so only states reachable from the current
//! SOC are ever evaluated.

use crate::context::{DecisionContext, Strategy};
use crate::error::StrategyError;
use gridcell_types::{ActionVector, Market};
use tracing::debug;

/// Default SOC grid resolution
pub const DEFAULT_SOC_LEVELS: usize = 100;

/// Default optimisation horizon: one day of 5-minute intervals
pub const DEFAULT_HORIZON: usize = 12 * 24;

/// Relative cost difference below which two moves count as equal
const TIE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct DynamicProgramming {
    gamma: f64,
    horizon: usize,
    n_soc: usize,
    memo: Vec<Option<f64>>,
}

impl DynamicProgramming {
    /// # Arguments
    /// * `gamma` - Penalty ($/MWh) added to every charge or discharge step
    /// * `horizon` - Maximum number of forecast steps to search
    /// * `n_soc` - Number of SOC grid levels (at least 2)
    pub fn new(gamma: f64, horizon: usize, n_soc: usize) -> Result<Self, StrategyError> {
        if !gamma.is_finite() {
            return Err(StrategyError::invalid("gamma", "must be finite"));
        }
        if horizon == 0 {
            return Err(StrategyError::invalid("horizon", "must be positive"));
        }
        if n_soc < 2 {
            return Err(StrategyError::invalid("n_soc", "need at least two levels"));
        }
        Ok(Self {
            gamma,
            horizon,
            n_soc,
            memo: Vec::new(),
        })
    }
}

impl Default for DynamicProgramming {
    fn default() -> Self {
        Self {
            gamma: 0.0,
            horizon: DEFAULT_HORIZON,
            n_soc: DEFAULT_SOC_LEVELS,
            memo: Vec::new(),
        }
    }
}

impl Strategy for DynamicProgramming {
    fn name(&self) -> &str {
        "Dynamic-Programming"
    }

    fn action(&mut self, ctx: &DecisionContext<'_>) -> Result<ActionVector, StrategyError> {
        let window = ctx.forecast.truncated(self.horizon);
        let prices = window.market(Market::Energy);
        if prices.is_empty() || prices.iter().any(|p| !p.is_finite()) {
            return Ok(ActionVector::zero());
        }
        if !(ctx.c_max > 0.0 && ctx.p_max > 0.0) {
            return Ok(ActionVector::zero());
        }

        let soc_step = ctx.c_max / (self.n_soc - 1) as f64;
        let grid = SocGrid {
            levels: self.n_soc,
            step_chg: ((ctx.dt * ctx.eta_chg * ctx.p_max / soc_step).round() as usize).max(1),
            step_dchg: ((ctx.dt * ctx.eta_dchg * ctx.p_max / soc_step).round() as usize).max(1),
        };
        let start = ((ctx.c_soc / soc_step).round().max(0.0) as usize).min(self.n_soc - 1);

        let mut search = Search::new(
            prices,
            grid,
            self.gamma,
            ctx.p_max * ctx.dt,
            &mut self.memo,
        );
        let choice = search.first_move(start);
        debug!(
            strategy = "Dynamic-Programming",
            start_level = start,
            ?choice,
            "DP decision"
        );

        Ok(match choice {
            Move::Idle => ActionVector::zero(),
            Move::Charge => ActionVector::from_signed_energy(1.0),
            Move::Discharge => ActionVector::from_signed_energy(-1.0),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Idle,
    Charge,
    Discharge,
}

#[derive(Debug, Clone, Copy)]
struct SocGrid {
    levels: usize,
    step_chg: usize,
    step_dchg: usize,
}

impl SocGrid {
    fn charged(&self, i: usize) -> Option<usize> {
        let j = i + self.step_chg;
        (j < self.levels).then_some(j)
    }

    fn discharged(&self, i: usize) -> Option<usize> {
        i.checked_sub(self.step_dchg)
    }
}

struct Search<'a> {
    prices: &'a [f64],
    grid: SocGrid,
    gamma: f64,
    /// MWh moved by one full-power interval
    energy_per_step: f64,
    memo: &'a mut Vec<Option<f64>>,
}

impl<'a> Search<'a> {
    fn new(
        prices: &'a [f64],
        grid: SocGrid,
        gamma: f64,
        energy_per_step: f64,
        memo: &'a mut Vec<Option<f64>>,
    ) -> Self {
        memo.clear();
        memo.resize(prices.len() * grid.levels, None);
        Self {
            prices,
            grid,
            gamma,
            energy_per_step,
            memo,
        }
    }

    fn charge_cost(&self, t: usize) -> f64 {
        (self.prices[t] + self.gamma) * self.energy_per_step
    }

    fn discharge_cost(&self, t: usize) -> f64 {
        (-self.prices[t] + self.gamma) * self.energy_per_step
    }

    /// Minimum cost from step `t` onwards starting at level `i`
    fn value(&mut self, t: usize, i: usize) -> f64 {
        if t == self.prices.len() {
            return 0.0;
        }
        let slot = t * self.grid.levels + i;
        if let Some(cached) = self.memo[slot] {
            return cached;
        }

        let mut best = self.value(t + 1, i);
        if let Some(j) = self.grid.charged(i) {
            best = best.min(self.charge_cost(t) + self.value(t + 1, j));
        }
        if let Some(j) = self.grid.discharged(i) {
            best = best.min(self.discharge_cost(t) + self.value(t + 1, j));
        }

        self.memo[slot] = Some(best);
        best
    }

    /// Compare the three options at step 0 against the memoized values from
    /// step 1. Among moves of equal total cost the one earning most right
    /// now wins, so a flat tail never postpones a sale forever.
    fn first_move(&mut self, start: usize) -> Move {
        let mut choice = Move::Idle;
        let mut best_total = self.value(1, start);
        let mut best_now = 0.0;

        let options = [
            (Move::Charge, self.grid.charged(start)),
            (Move::Discharge, self.grid.discharged(start)),
        ];
        for (candidate, next) in options {
            let Some(j) = next else {
                continue;
            };
            let now = match candidate {
                Move::Charge => self.charge_cost(0),
                Move::Discharge => self.discharge_cost(0),
                Move::Idle => 0.0,
            };
            let total = now + self.value(1, j);
            let tolerance = TIE_TOLERANCE * (1.0 + best_total.abs().max(total.abs()));
            let cheaper = total < best_total - tolerance;
            let tied_but_earlier = total <= best_total + tolerance && now < best_now;
            if cheaper || tied_but_earlier {
                choice = candidate;
                best_total = total;
                best_now = now;
            }
        }
        choice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcell_types::{ActionSlot, ForecastWindow, N_MARKETS};

    fn decide(strategy: &mut DynamicProgramming, energy: &[f64], c_soc: f64) -> ActionVector {
        let mut values = vec![0.0; N_MARKETS * energy.len()];
        values[..energy.len()].copy_from_slice(energy);
        let last = [f64::NAN; N_MARKETS];
        let ctx = DecisionContext {
            forecast: ForecastWindow::new(&values, energy.len()).unwrap(),
            c_soc,
            c_max: 10.0,
            p_max: 1.0,
            eta_chg: 1.0,
            eta_dchg: 1.0,
            last_price: &last,
            dt: 5.0 / 60.0,
        };
        strategy.action(&ctx).unwrap()
    }

    #[test]
    fn test_charges_before_price_spike() {
        let mut strategy = DynamicProgramming::new(0.0, 12, 101).unwrap();
        let action = decide(&mut strategy, &[10.0, 1000.0], 0.0);
        assert_eq!(action[ActionSlot::Charge], 1.0);
        assert_eq!(action[ActionSlot::Discharge], 0.0);
    }

    #[test]
    fn test_discharges_into_spike_when_full() {
        let mut strategy = DynamicProgramming::new(0.0, 12, 101).unwrap();
        let action = decide(&mut strategy, &[1000.0, 10.0], 10.0);
        assert_eq!(action[ActionSlot::Discharge], 1.0);
    }

    #[test]
    fn test_gamma_suppresses_thin_spreads() {
        let mut strategy = DynamicProgramming::new(100.0, 12, 101).unwrap();
        let action = decide(&mut strategy, &[10.0, 60.0], 0.0);
        assert!(action.is_zero());
    }

    #[test]
    fn test_horizon_truncates_forecast() {
        // The spike sits beyond the one-step horizon, so charging only costs
        let mut strategy = DynamicProgramming::new(0.0, 1, 101).unwrap();
        let action = decide(&mut strategy, &[10.0, 1000.0], 0.0);
        assert!(action.is_zero());
    }

    #[test]
    fn test_nan_forecast_idles() {
        let mut strategy = DynamicProgramming::default();
        assert!(decide(&mut strategy, &[10.0, f64::NAN], 0.0).is_zero());
    }

    #[test]
    fn test_infinite_forecast_idles() {
        let mut strategy = DynamicProgramming::new(0.0, 40, 101).unwrap();
        let mut energy = vec![50.0; 40];
        energy[39] = f64::INFINITY;
        assert!(decide(&mut strategy, &energy, 5.0).is_zero());

        energy[39] = f64::NEG_INFINITY;
        assert!(decide(&mut strategy, &energy, 5.0).is_zero());
    }

    #[test]
    fn test_flat_tail_sells_now() {
        // One step of stored energy and a flat price: selling now or later
        // costs the same, selling now must win
        let mut strategy = DynamicProgramming::new(0.0, 12, 101).unwrap();
        let action = decide(&mut strategy, &[300.0, 300.0, 300.0], 0.1);
        assert_eq!(action[ActionSlot::Discharge], 1.0);
    }

    #[test]
    fn test_flat_cheap_tail_still_waits_to_charge() {
        let mut strategy = DynamicProgramming::new(0.0, 12, 101).unwrap();
        assert!(decide(&mut strategy, &[20.0, 20.0, 20.0], 0.0).is_zero());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(DynamicProgramming::new(0.0, 0, 100).is_err());
        assert!(DynamicProgramming::new(0.0, 10, 1).is_err());
        assert!(DynamicProgramming::new(f64::NAN, 10, 100).is_err());
    }
}
