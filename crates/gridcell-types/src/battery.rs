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

use crate::error::SpecError;
use serde::{Deserialize, Serialize};

/// Physical and economic configuration of one battery.
///
/// Constructed once per backtest run and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatterySpec {
    /// Max charge/discharge power rating (MW)
    pub p_max: f64,

    /// Usable energy capacity (MWh)
    pub e_max: f64,

    /// Fractional capacity loss per qualifying action, in [0, 1)
    #[serde(default)]
    pub deg: f64,

    /// Charging efficiency, in (0, 1]
    pub eta_chg: f64,

    /// Discharging efficiency, in (0, 1]
    pub eta_dchg: f64,
}

impl Default for BatterySpec {
    fn default() -> Self {
        Self {
            p_max: 50.0,
            e_max: 50.0,
            deg: 0.0,
            eta_chg: 0.90,
            eta_dchg: 0.95,
        }
    }
}

impl BatterySpec {
    /// Create a validated battery specification
    pub fn new(
        p_max: f64,
        e_max: f64,
        deg: f64,
        eta_chg: f64,
        eta_dchg: f64,
    ) -> Result<Self, SpecError> {
        let spec = Self {
            p_max,
            e_max,
            deg,
            eta_chg,
            eta_dchg,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Construct from the industry-standard power + duration description.
    ///
    /// `duration` is how long the battery can discharge at full power (hours),
    /// so `e_max = p_max * duration`.
    pub fn from_power_and_duration(
        p_max: f64,
        duration: f64,
        deg: f64,
        eta_chg: f64,
        eta_dchg: f64,
    ) -> Result<Self, SpecError> {
        Self::new(p_max, p_max * duration, deg, eta_chg, eta_dchg)
    }

    /// Discharge duration at full power (hours)
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.e_max / self.p_max
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        if !(self.p_max.is_finite() && self.p_max > 0.0) {
            return Err(SpecError::InvalidPower(self.p_max));
        }
        if !(self.e_max.is_finite() && self.e_max > 0.0) {
            return Err(SpecError::InvalidCapacity(self.e_max));
        }
        if !(0.0..1.0).contains(&self.deg) {
            return Err(SpecError::InvalidDegradation(self.deg));
        }
        for (name, value) in [("Charging", self.eta_chg), ("Discharging", self.eta_dchg)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(SpecError::InvalidEfficiency { name, value });
            }
        }
        Ok(())
    }

    /// Optimisation strategies need a unique arbitrage direction, which
    /// equal efficiencies do not provide.
    pub fn ensure_distinct_efficiencies(&self) -> Result<(), SpecError> {
        ensure_distinct_efficiencies(self.eta_chg, self.eta_dchg)
    }
}

#[expect(clippy::float_cmp)]
pub fn ensure_distinct_efficiencies(eta_chg: f64, eta_dchg: f64) -> Result<(), SpecError> {
    if eta_chg == eta_dchg {
        return Err(SpecError::DegenerateEfficiencies { eta_chg, eta_dchg });
    }
    Ok(())
}
