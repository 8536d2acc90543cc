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

//! Market and action-slot definitions.
//!
//! Price arrays are indexed by [`Market`] (7 columns), action and revenue
//! arrays by [`ActionSlot`] (8 columns). The energy market is split into a
//! charge and a discharge slot so every slot carries a non-negative MW amount.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of price columns (energy + six FCAS markets)
pub const N_MARKETS: usize = 7;

/// Number of action columns (charge, discharge + six FCAS markets)
pub const N_ACTIONS: usize = 8;

/// Length of the reference dispatch interval used by throughput-scaled
/// degradation (hours)
pub const FIVE_MINUTES_H: f64 = 5.0 / 60.0;

/// Default probability that an FCAS market is called within one interval
pub const DEFAULT_FCAS_CALL_PROBABILITY: f64 = 0.05;

/// Price columns, in the fixed order of the realised/forecast arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    Energy,
    Raise6Sec,
    Raise60Sec,
    Raise5Min,
    Lower6Sec,
    Lower60Sec,
    Lower5Min,
}

impl Market {
    pub const ALL: [Market; N_MARKETS] = [
        Market::Energy,
        Market::Raise6Sec,
        Market::Raise60Sec,
        Market::Raise5Min,
        Market::Lower6Sec,
        Market::Lower60Sec,
        Market::Lower5Min,
    ];

    /// The six ancillary markets, in price-column order
    pub const FCAS: [Market; 6] = [
        Market::Raise6Sec,
        Market::Raise60Sec,
        Market::Raise5Min,
        Market::Lower6Sec,
        Market::Lower60Sec,
        Market::Lower5Min,
    ];

    /// Column of this market in a 7-wide price array
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn is_fcas(self) -> bool {
        !matches!(self, Market::Energy)
    }

    /// Position of this market inside [`Market::FCAS`]
    #[must_use]
    pub const fn fcas_index(self) -> Option<usize> {
        match self {
            Market::Energy => None,
            other => Some(other as usize - 1),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Market::Energy => "ENERGY",
            Market::Raise6Sec => "RAISE6SEC",
            Market::Raise60Sec => "RAISE60SEC",
            Market::Raise5Min => "RAISE5MIN",
            Market::Lower6Sec => "LOWER6SEC",
            Market::Lower60Sec => "LOWER60SEC",
            Market::Lower5Min => "LOWER5MIN",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which half of the `p_max` power pool a slot draws on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolSide {
    /// Energy flows into the battery (charge, lower-class FCAS)
    Charge,
    /// Energy flows out of the battery (discharge, raise-class FCAS)
    Discharge,
}

impl PoolSide {
    /// Sign of the SOC change caused by this side
    #[must_use]
    pub const fn soc_sign(self) -> f64 {
        match self {
            PoolSide::Charge => 1.0,
            PoolSide::Discharge => -1.0,
        }
    }
}

/// Action columns, in the fixed order of action and revenue arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSlot {
    Charge,
    Discharge,
    Raise6Sec,
    Raise60Sec,
    Raise5Min,
    Lower6Sec,
    Lower60Sec,
    Lower5Min,
}

impl ActionSlot {
    pub const ALL: [ActionSlot; N_ACTIONS] = [
        ActionSlot::Charge,
        ActionSlot::Discharge,
        ActionSlot::Raise6Sec,
        ActionSlot::Raise60Sec,
        ActionSlot::Raise5Min,
        ActionSlot::Lower6Sec,
        ActionSlot::Lower60Sec,
        ActionSlot::Lower5Min,
    ];

    /// Slots sharing the charge-side half of the power pool
    pub const CHARGE_SIDE: [ActionSlot; 4] = [
        ActionSlot::Charge,
        ActionSlot::Lower6Sec,
        ActionSlot::Lower60Sec,
        ActionSlot::Lower5Min,
    ];

    /// Slots sharing the discharge-side half of the power pool
    pub const DISCHARGE_SIDE: [ActionSlot; 4] = [
        ActionSlot::Discharge,
        ActionSlot::Raise6Sec,
        ActionSlot::Raise60Sec,
        ActionSlot::Raise5Min,
    ];

    /// The six FCAS slots, in action-column order
    pub const FCAS: [ActionSlot; 6] = [
        ActionSlot::Raise6Sec,
        ActionSlot::Raise60Sec,
        ActionSlot::Raise5Min,
        ActionSlot::Lower6Sec,
        ActionSlot::Lower60Sec,
        ActionSlot::Lower5Min,
    ];

    /// Column of this slot in an 8-wide action array
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Price column that pays for this slot
    #[must_use]
    pub const fn market(self) -> Market {
        match self {
            ActionSlot::Charge | ActionSlot::Discharge => Market::Energy,
            ActionSlot::Raise6Sec => Market::Raise6Sec,
            ActionSlot::Raise60Sec => Market::Raise60Sec,
            ActionSlot::Raise5Min => Market::Raise5Min,
            ActionSlot::Lower6Sec => Market::Lower6Sec,
            ActionSlot::Lower60Sec => Market::Lower60Sec,
            ActionSlot::Lower5Min => Market::Lower5Min,
        }
    }

    #[must_use]
    pub const fn side(self) -> PoolSide {
        match self {
            ActionSlot::Charge
            | ActionSlot::Lower6Sec
            | ActionSlot::Lower60Sec
            | ActionSlot::Lower5Min => PoolSide::Charge,
            ActionSlot::Discharge
            | ActionSlot::Raise6Sec
            | ActionSlot::Raise60Sec
            | ActionSlot::Raise5Min => PoolSide::Discharge,
        }
    }

    #[must_use]
    pub const fn is_fcas(self) -> bool {
        self.market().is_fcas()
    }

    /// How long the battery must sustain a full response for this slot (hours).
    ///
    /// Energy slots respond for the whole dispatch interval `dt`.
    #[must_use]
    pub fn response_duration_h(self, dt: f64) -> f64 {
        match self {
            ActionSlot::Charge | ActionSlot::Discharge => dt,
            ActionSlot::Raise6Sec | ActionSlot::Lower6Sec => 6.0 / 3600.0,
            ActionSlot::Raise60Sec | ActionSlot::Lower60Sec => 60.0 / 3600.0,
            ActionSlot::Raise5Min | ActionSlot::Lower5Min => FIVE_MINUTES_H,
        }
    }
}

/// Per-interval call probabilities of the six FCAS markets.
///
/// Events are independent across markets and intervals. The energy market
/// is always "called".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FcasCallModel {
    /// Probabilities in [`Market::FCAS`] order
    #[serde(default = "default_call_probabilities")]
    pub call_probability: [f64; 6],
}

fn default_call_probabilities() -> [f64; 6] {
    [DEFAULT_FCAS_CALL_PROBABILITY; 6]
}

impl Default for FcasCallModel {
    fn default() -> Self {
        Self {
            call_probability: default_call_probabilities(),
        }
    }
}

impl FcasCallModel {
    /// Same probability for every FCAS market
    #[must_use]
    pub fn uniform(probability: f64) -> Self {
        Self {
            call_probability: [probability; 6],
        }
    }

    /// Probability that `slot` is dispatched in one interval
    #[must_use]
    pub fn probability(&self, slot: ActionSlot) -> f64 {
        match slot.market().fcas_index() {
            Some(i) => self.call_probability[i],
            None => 1.0,
        }
    }

    /// Expected MWh moved per MW committed to `slot` over one interval,
    /// before efficiency losses
    #[must_use]
    pub fn expected_energy_weight(&self, slot: ActionSlot, dt: f64) -> f64 {
        self.probability(slot) * slot.response_duration_h(dt)
    }

    /// True if every probability lies in [0, 1]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.call_probability
            .iter()
            .all(|p| p.is_finite() && (0.0..=1.0).contains(p))
    }
}

/// NEM pricing region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "NSW1")]
    Nsw,
    #[serde(rename = "QLD1")]
    Qld,
    #[serde(rename = "VIC1")]
    Vic,
    #[serde(rename = "SA1")]
    Sa,
    #[serde(rename = "TAS1")]
    Tas,
}

impl Region {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Region::Nsw => "NSW1",
            Region::Qld => "QLD1",
            Region::Vic => "VIC1",
            Region::Sa => "SA1",
            Region::Tas => "TAS1",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
