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

use crate::markets::{ActionSlot, N_ACTIONS, PoolSide};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Pool sums within this much of 1 count as already normalized
const POOL_TOLERANCE: f64 = 1e-12;

/// One interval's dispatch decision.
///
/// Each component is a fraction of `p_max` committed to the corresponding
/// [`ActionSlot`]. Strategies produce these; the backtest engine clamps and
/// normalizes them before anything is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionVector(pub [f64; N_ACTIONS]);

impl ActionVector {
    /// The idle action
    #[must_use]
    pub const fn zero() -> Self {
        Self([0.0; N_ACTIONS])
    }

    /// Widen a signed energy-only decision into the 8-slot schema.
    ///
    /// Positive values charge, negative values discharge. The magnitude is
    /// capped at 1 and non-finite input yields the idle action.
    #[must_use]
    pub fn from_signed_energy(fraction: f64) -> Self {
        let mut action = Self::zero();
        if !fraction.is_finite() {
            return action;
        }
        if fraction > 0.0 {
            action[ActionSlot::Charge] = fraction.min(1.0);
        } else if fraction < 0.0 {
            action[ActionSlot::Discharge] = (-fraction).min(1.0);
        }
        action
    }

    #[must_use]
    pub fn as_array(&self) -> &[f64; N_ACTIONS] {
        &self.0
    }

    /// Net energy decision: charge minus discharge fraction
    #[must_use]
    pub fn signed_energy(&self) -> f64 {
        self[ActionSlot::Charge] - self[ActionSlot::Discharge]
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// True if charge or discharge is non-zero
    #[must_use]
    pub fn moves_energy(&self) -> bool {
        self[ActionSlot::Charge] != 0.0 || self[ActionSlot::Discharge] != 0.0
    }

    /// Sum of the fractions drawing on one half of the power pool
    #[must_use]
    pub fn pool_sum(&self, side: PoolSide) -> f64 {
        pool_slots(side).iter().map(|slot| self[*slot]).sum()
    }

    /// Clip every component to [0, 1]. Non-finite components become 0.
    ///
    /// Returns the number of components that were out of range.
    pub fn clamp_unit(&mut self) -> usize {
        let mut violations = 0;
        for value in &mut self.0 {
            if !value.is_finite() {
                *value = 0.0;
                violations += 1;
            } else if *value < 0.0 || *value > 1.0 {
                *value = value.clamp(0.0, 1.0);
                violations += 1;
            }
        }
        violations
    }

    /// Scale each half of the power pool down proportionally so its sum is at
    /// most 1. A group already within the pool is left untouched.
    ///
    /// Returns the sides that had to be rescaled.
    pub fn normalize_pools(&mut self) -> Vec<PoolSide> {
        let mut scaled = Vec::new();
        for side in [PoolSide::Discharge, PoolSide::Charge] {
            let total = self.pool_sum(side);
            if total > 1.0 + POOL_TOLERANCE {
                for slot in pool_slots(side) {
                    self[*slot] /= total;
                }
                scaled.push(side);
            }
        }
        scaled
    }

    /// Zero every component smaller than `tolerance`
    pub fn snap_below(&mut self, tolerance: f64) {
        for value in &mut self.0 {
            if value.abs() < tolerance {
                *value = 0.0;
            }
        }
    }
}

fn pool_slots(side: PoolSide) -> &'static [ActionSlot; 4] {
    match side {
        PoolSide::Charge => &ActionSlot::CHARGE_SIDE,
        PoolSide::Discharge => &ActionSlot::DISCHARGE_SIDE,
    }
}

impl Index<ActionSlot> for ActionVector {
    type Output = f64;

    fn index(&self, slot: ActionSlot) -> &f64 {
        &self.0[slot.index()]
    }
}

impl IndexMut<ActionSlot> for ActionVector {
    fn index_mut(&mut self, slot: ActionSlot) -> &mut f64 {
        &mut self.0[slot.index()]
    }
}

impl From<[f64; N_ACTIONS]> for ActionVector {
    fn from(values: [f64; N_ACTIONS]) -> Self {
        Self(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_energy_widening() {
        let charge = ActionVector::from_signed_energy(0.4);
        assert_eq!(charge[ActionSlot::Charge], 0.4);
        assert_eq!(charge[ActionSlot::Discharge], 0.0);

        let discharge = ActionVector::from_signed_energy(-2.0);
        assert_eq!(discharge[ActionSlot::Discharge], 1.0);
        assert_eq!(discharge.signed_energy(), -1.0);

        assert!(ActionVector::from_signed_energy(f64::NAN).is_zero());
        assert!(ActionVector::from_signed_energy(0.0).is_zero());
    }

    #[test]
    fn test_clamp_unit_counts_violations() {
        let mut action = ActionVector([-0.5, 1.5, 0.2, f64::NAN, 0.0, 1.0, 0.3, 0.0]);
        assert_eq!(action.clamp_unit(), 3);
        assert_eq!(action.0, [0.0, 1.0, 0.2, 0.0, 0.0, 1.0, 0.3, 0.0]);
    }

    #[test]
    fn test_normalize_scales_overfull_pool_to_one() {
        // discharge side: 0.6 + 0.6 + 0.3 + 0.0 = 1.5
        let mut action = ActionVector([0.2, 0.6, 0.6, 0.3, 0.0, 0.1, 0.1, 0.1]);
        let scaled = action.normalize_pools();

        assert_eq!(scaled, vec![PoolSide::Discharge]);
        assert!((action.pool_sum(PoolSide::Discharge) - 1.0).abs() < 1e-12);
        assert!((action[ActionSlot::Discharge] - 0.4).abs() < 1e-12);
        assert!((action[ActionSlot::Raise60Sec] - 0.2).abs() < 1e-12);
        // charge side untouched
        assert_eq!(action[ActionSlot::Charge], 0.2);
        assert_eq!(action[ActionSlot::Lower5Min], 0.1);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut action = ActionVector([0.5, 0.0, 0.25, 0.25, 0.5, 0.25, 0.25, 0.0]);
        let before = action;
        assert!(action.normalize_pools().is_empty());
        assert_eq!(action, before);

        let mut overfull = ActionVector([1.0; N_ACTIONS]);
        overfull.normalize_pools();
        let once = overfull;
        assert!(overfull.normalize_pools().is_empty());
        assert_eq!(overfull, once);
    }

    #[test]
    fn test_snap_below_tolerance() {
        let mut action = ActionVector([1e-9, 0.5, 0.0, 2e-5, 0.0, 0.0, 0.0, 0.0]);
        action.snap_below(1e-4);
        assert_eq!(action[ActionSlot::Charge], 0.0);
        assert_eq!(action[ActionSlot::Raise60Sec], 0.0);
        assert_eq!(action[ActionSlot::Discharge], 0.5);
    }
}
