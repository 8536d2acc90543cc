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

use crate::context::{DecisionContext, Strategy};
use crate::error::StrategyError;
use gridcell_types::ActionVector;

pub const DEFAULT_CHARGE_QUANTILE: f64 = 0.10;
pub const DEFAULT_DISCHARGE_QUANTILE: f64 = 0.90;

/// Charges when the upcoming price sits in the cheap tail of the forecast
/// distribution and discharges when it sits in the expensive tail
#[derive(Debug, Clone)]
pub struct QuantilePicker {
    charge_quantile: f64,
    discharge_quantile: f64,
    sorted: Vec<f64>,
}

impl QuantilePicker {
    pub fn new(charge_quantile: f64, discharge_quantile: f64) -> Result<Self, StrategyError> {
        for (name, q) in [
            ("charge_quantile", charge_quantile),
            ("discharge_quantile", discharge_quantile),
        ] {
            if !(0.0..=1.0).contains(&q) {
                return Err(StrategyError::invalid(name, format!("{q} is not in [0, 1]")));
            }
        }
        if charge_quantile > discharge_quantile {
            return Err(StrategyError::invalid(
                "charge_quantile",
                "must not exceed discharge_quantile",
            ));
        }
        Ok(Self {
            charge_quantile,
            discharge_quantile,
            sorted: Vec::new(),
        })
    }
}

impl Default for QuantilePicker {
    fn default() -> Self {
        Self {
            charge_quantile: DEFAULT_CHARGE_QUANTILE,
            discharge_quantile: DEFAULT_DISCHARGE_QUANTILE,
            sorted: Vec::new(),
        }
    }
}

impl Strategy for QuantilePicker {
    fn name(&self) -> &str {
        "Quantile-Picker"
    }

    fn action(&mut self, ctx: &DecisionContext<'_>) -> Result<ActionVector, StrategyError> {
        let prices = ctx.forecast.energy();
        if prices.iter().any(|p| p.is_nan()) {
            return Ok(ActionVector::zero());
        }

        self.sorted.clear();
        self.sorted.extend_from_slice(prices);
        self.sorted.sort_by(f64::total_cmp);

        let charge_threshold = quantile(&self.sorted, self.charge_quantile);
        let discharge_threshold = quantile(&self.sorted, self.discharge_quantile);
        let next = ctx.next_energy_forecast();

        let signed = if next < charge_threshold && ctx.c_soc < ctx.c_max {
            1.0
        } else if next > discharge_threshold && ctx.c_soc > 0.0 {
            -1.0
        } else {
            0.0
        };
        Ok(ActionVector::from_signed_energy(signed))
    }
}

/// Quantile of an ascending slice with linear interpolation between the two
/// nearest ranks. Empty input yields NaN.
#[must_use]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return f64::NAN;
    };
    let rank = q.clamp(0.0, 1.0) * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcell_types::{ActionSlot, ForecastWindow, Market, N_MARKETS};

    fn window(energy: &[f64]) -> Vec<f64> {
        let mut values = vec![0.0; N_MARKETS * energy.len()];
        values[Market::Energy.index()..energy.len()].copy_from_slice(energy);
        values
    }

    fn decide(strategy: &mut QuantilePicker, energy: &[f64], c_soc: f64) -> ActionVector {
        let values = window(energy);
        let last = [0.0; N_MARKETS];
        let ctx = DecisionContext {
            forecast: ForecastWindow::new(&values, energy.len()).unwrap(),
            c_soc,
            c_max: 10.0,
            p_max: 1.0,
            eta_chg: 0.9,
            eta_dchg: 0.95,
            last_price: &last,
            dt: 5.0 / 60.0,
        };
        strategy.action(&ctx).unwrap()
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 1.0), 5.0);
        assert_eq!(quantile(&sorted, 0.5), 3.0);
        assert!((quantile(&sorted, 0.1) - 1.4).abs() < 1e-12);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_charges_on_cheap_first_step() {
        let mut strategy = QuantilePicker::default();
        let action = decide(&mut strategy, &[-5.0, 40.0, 50.0, 60.0, 70.0, 80.0], 2.0);
        assert_eq!(action[ActionSlot::Charge], 1.0);
    }

    #[test]
    fn test_discharges_on_expensive_first_step() {
        let mut strategy = QuantilePicker::default();
        let action = decide(&mut strategy, &[900.0, 40.0, 50.0, 60.0, 70.0, 80.0], 2.0);
        assert_eq!(action[ActionSlot::Discharge], 1.0);

        // Nothing to discharge from an empty battery
        let action = decide(&mut strategy, &[900.0, 40.0, 50.0, 60.0, 70.0, 80.0], 0.0);
        assert!(action.is_zero());
    }

    #[test]
    fn test_flat_or_nan_forecast_idles() {
        let mut strategy = QuantilePicker::default();
        assert!(decide(&mut strategy, &[50.0; 6], 2.0).is_zero());
        assert!(decide(&mut strategy, &[f64::NAN, 1.0, 2.0], 2.0).is_zero());
    }

    #[test]
    fn test_rejects_bad_quantiles() {
        assert!(QuantilePicker::new(-0.1, 0.9).is_err());
        assert!(QuantilePicker::new(0.8, 0.2).is_err());
        assert!(QuantilePicker::new(0.2, 0.8).is_ok());
    }
}
