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

//! Threshold strategies that need no optimisation.

use crate::context::{DecisionContext, Strategy};
use crate::error::StrategyError;
use gridcell_types::ActionVector;

/// Never commits to any market
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleStrategy;

impl Strategy for IdleStrategy {
    fn name(&self) -> &str {
        "Idle"
    }

    fn action(&mut self, _ctx: &DecisionContext<'_>) -> Result<ActionVector, StrategyError> {
        Ok(ActionVector::zero())
    }
}

/// Price thresholds shared by the baseline strategies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRule {
    /// Charge when the reference price is below this ($/MWh)
    pub charge_limit: f64,

    /// Discharge when the reference price is above this ($/MWh)
    pub discharge_limit: f64,
}

impl ThresholdRule {
    pub fn new(charge_limit: f64, discharge_limit: f64) -> Result<Self, StrategyError> {
        if !(charge_limit.is_finite() && discharge_limit.is_finite()) {
            return Err(StrategyError::invalid(
                "charge_limit/discharge_limit",
                "limits must be finite",
            ));
        }
        Ok(Self {
            charge_limit,
            discharge_limit,
        })
    }

    /// Signed energy decision for a reference price.
    ///
    /// Below 50% SOC only charging is considered, at or above 50% only
    /// discharging. A NaN price never triggers anything.
    #[must_use]
    pub fn decide(&self, ctx: &DecisionContext<'_>, price: f64) -> f64 {
        if ctx.below_half_charge() {
            if price < self.charge_limit && ctx.c_soc < ctx.c_max {
                return 1.0;
            }
        } else if price > self.discharge_limit && ctx.c_soc > 0.0 {
            return -1.0;
        }
        0.0
    }
}

/// Threshold rule driven by the previous interval's realised price
#[derive(Debug, Clone, Copy)]
pub struct NaiveBaseline {
    rule: ThresholdRule,
}

impl NaiveBaseline {
    pub fn new(charge_limit: f64, discharge_limit: f64) -> Result<Self, StrategyError> {
        Ok(Self {
            rule: ThresholdRule::new(charge_limit, discharge_limit)?,
        })
    }
}

impl Strategy for NaiveBaseline {
    fn name(&self) -> &str {
        "Naive-Baseline"
    }

    fn action(&mut self, ctx: &DecisionContext<'_>) -> Result<ActionVector, StrategyError> {
        let signed = self.rule.decide(ctx, ctx.last_energy_price());
        Ok(ActionVector::from_signed_energy(signed))
    }
}

/// Same rule as [`NaiveBaseline`], but looks at the first forecast step
/// instead of the last realised price
#[derive(Debug, Clone, Copy)]
pub struct ForecastBaseline {
    rule: ThresholdRule,
}

impl ForecastBaseline {
    pub fn new(charge_limit: f64, discharge_limit: f64) -> Result<Self, StrategyError> {
        Ok(Self {
            rule: ThresholdRule::new(charge_limit, discharge_limit)?,
        })
    }
}

impl Strategy for ForecastBaseline {
    fn name(&self) -> &str {
        "Forecast-Baseline"
    }

    fn action(&mut self, ctx: &DecisionContext<'_>) -> Result<ActionVector, StrategyError> {
        let signed = self.rule.decide(ctx, ctx.next_energy_forecast());
        Ok(ActionVector::from_signed_energy(signed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcell_types::{ActionSlot, ForecastWindow, N_MARKETS};

    fn ctx<'a>(
        forecast: &'a [f64],
        last_price: &'a [f64; N_MARKETS],
        c_soc: f64,
    ) -> DecisionContext<'a> {
        DecisionContext {
            forecast: ForecastWindow::new(forecast, forecast.len() / N_MARKETS).unwrap(),
            c_soc,
            c_max: 10.0,
            p_max: 5.0,
            eta_chg: 0.9,
            eta_dchg: 0.95,
            last_price,
            dt: 5.0 / 60.0,
        }
    }

    #[test]
    fn test_idle_is_zero() {
        let forecast = [50.0; N_MARKETS];
        let last = [50.0; N_MARKETS];
        let action = IdleStrategy.action(&ctx(&forecast, &last, 3.0)).unwrap();
        assert!(action.is_zero());
    }

    #[test]
    fn test_naive_charges_when_low_and_cheap() {
        let forecast = [500.0; N_MARKETS];
        let last = [10.0; N_MARKETS];
        let mut strategy = NaiveBaseline::new(20.0, 100.0).unwrap();

        let action = strategy.action(&ctx(&forecast, &last, 2.0)).unwrap();
        assert_eq!(action[ActionSlot::Charge], 1.0);

        // Above half charge a cheap price does nothing
        let action = strategy.action(&ctx(&forecast, &last, 6.0)).unwrap();
        assert!(action.is_zero());
    }

    #[test]
    fn test_naive_discharges_when_high_and_expensive() {
        let forecast = [0.0; N_MARKETS];
        let last = [300.0; N_MARKETS];
        let mut strategy = NaiveBaseline::new(20.0, 100.0).unwrap();

        let action = strategy.action(&ctx(&forecast, &last, 8.0)).unwrap();
        assert_eq!(action[ActionSlot::Discharge], 1.0);
    }

    #[test]
    fn test_naive_ignores_missing_last_price() {
        let forecast = [0.0; N_MARKETS];
        let last = [f64::NAN; N_MARKETS];
        let mut strategy = NaiveBaseline::new(20.0, 100.0).unwrap();

        assert!(strategy.action(&ctx(&forecast, &last, 2.0)).unwrap().is_zero());
        assert!(strategy.action(&ctx(&forecast, &last, 8.0)).unwrap().is_zero());
    }

    #[test]
    fn test_forecast_baseline_uses_first_step() {
        // horizon 2, energy row = [5, 900]
        let mut forecast = [0.0; 2 * N_MARKETS];
        forecast[0] = 5.0;
        forecast[1] = 900.0;
        let last = [1000.0; N_MARKETS];
        let mut strategy = ForecastBaseline::new(20.0, 100.0).unwrap();

        let action = strategy.action(&ctx(&forecast, &last, 1.0)).unwrap();
        assert_eq!(action[ActionSlot::Charge], 1.0);
    }

    #[test]
    fn test_rejects_non_finite_limits() {
        assert!(NaiveBaseline::new(f64::NAN, 100.0).is_err());
        assert!(ForecastBaseline::new(0.0, f64::INFINITY).is_err());
    }
}
