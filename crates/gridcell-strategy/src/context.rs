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

use crate::error::StrategyError;
use gridcell_types::{ActionVector, ForecastWindow, Market, PriceRow};

/// Everything a strategy may look at when deciding one interval
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    /// `(7, horizon)` forward price paths published for this interval
    pub forecast: ForecastWindow<'a>,

    /// Current state of charge (MWh)
    pub c_soc: f64,

    /// Current usable capacity (MWh)
    pub c_max: f64,

    /// Power rating (MW)
    pub p_max: f64,

    /// Charging efficiency
    pub eta_chg: f64,

    /// Discharging efficiency
    pub eta_dchg: f64,

    /// Realised prices of the previous interval (NaN on the first interval)
    pub last_price: &'a PriceRow,

    /// Interval duration (hours)
    pub dt: f64,
}

impl DecisionContext<'_> {
    /// Previous interval's realised energy price
    #[must_use]
    pub fn last_energy_price(&self) -> f64 {
        self.last_price[Market::Energy.index()]
    }

    /// First step of the energy forecast, i.e. the price expected for this
    /// interval
    #[must_use]
    pub fn next_energy_forecast(&self) -> f64 {
        self.forecast.energy().first().copied().unwrap_or(f64::NAN)
    }

    /// True below half of the current capacity
    #[must_use]
    pub fn below_half_charge(&self) -> bool {
        self.c_soc < self.c_max / 2.0
    }
}

/// A battery dispatch policy.
///
/// Given the battery state and a forecast window, returns the fraction of
/// `p_max` to commit to each of the eight action slots for the next
/// interval. The backtest engine clamps and normalizes whatever comes back,
/// so a strategy only has to be roughly right about the power pools.
///
/// Implementations may cache solver state between calls but must never
/// remember battery SOC or capacity; those always arrive through the
/// [`DecisionContext`].
pub trait Strategy: Send {
    /// Get the name of this strategy
    fn name(&self) -> &str;

    /// Decide the action for the next dispatch interval.
    ///
    /// Returns `Err` only for configuration errors that make the strategy
    /// meaningless. Numeric trouble yields [`ActionVector::zero`].
    fn action(&mut self, ctx: &DecisionContext<'_>) -> Result<ActionVector, StrategyError>;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn action(&mut self, ctx: &DecisionContext<'_>) -> Result<ActionVector, StrategyError> {
        (**self).action(ctx)
    }
}
