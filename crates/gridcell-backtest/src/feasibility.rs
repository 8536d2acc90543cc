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

//! Turning a raw strategy output into a dispatchable action.
//!
//! Stages run in a fixed order: range clamp, power-pool normalization,
//! energy mutual exclusion, FCAS headroom. Pool sharing is resolved before
//! anything is zeroed, and everything is zeroed before randomness is drawn.

use crate::config::MutualExclusionPolicy;
use gridcell_types::{ActionSlot, ActionVector, PoolSide};
use tracing::debug;

/// Battery state the headroom check runs against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadroomState {
    pub c_soc: f64,
    pub c_max: f64,
    pub p_max: f64,
    pub dt: f64,
}

/// What the pipeline had to fix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeasibilityReport {
    /// Components outside [0, 1] or non-finite
    pub range_violations: usize,

    /// Pool sides that were scaled down
    pub scaled_pools: Vec<PoolSide>,

    /// Charge and discharge fractions when both were positive
    pub simultaneous: Option<(f64, f64)>,

    /// FCAS slots zeroed for lack of energy or headroom
    pub headroom_zeroed: Vec<ActionSlot>,
}

/// Energy-market mutual exclusion outcome for the [`MutualExclusionPolicy::Strict`]
/// policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimultaneousDispatch {
    pub charge: f64,
    pub discharge: f64,
}

/// Run every stage on `action` in place.
///
/// Only fails under [`MutualExclusionPolicy::Strict`] when charge and
/// discharge are both positive.
pub fn enforce(
    action: &mut ActionVector,
    policy: MutualExclusionPolicy,
    state: &HeadroomState,
) -> Result<FeasibilityReport, SimultaneousDispatch> {
    let mut report = FeasibilityReport {
        range_violations: action.clamp_unit(),
        scaled_pools: action.normalize_pools(),
        ..FeasibilityReport::default()
    };

    let charge = action[ActionSlot::Charge];
    let discharge = action[ActionSlot::Discharge];
    if charge > 0.0 && discharge > 0.0 {
        match policy {
            MutualExclusionPolicy::Strict => {
                return Err(SimultaneousDispatch { charge, discharge });
            }
            MutualExclusionPolicy::ZeroBoth => {
                action[ActionSlot::Charge] = 0.0;
                action[ActionSlot::Discharge] = 0.0;
                report.simultaneous = Some((charge, discharge));
            }
        }
    }

    report.headroom_zeroed = zero_infeasible_fcas(action, state);
    Ok(report)
}

/// Zero raise-class commitments the current SOC cannot sustain for a full
/// response, and lower-class commitments the remaining headroom cannot absorb
pub fn zero_infeasible_fcas(action: &mut ActionVector, state: &HeadroomState) -> Vec<ActionSlot> {
    let headroom = state.c_max - state.c_soc;
    let mut zeroed = Vec::new();

    for slot in ActionSlot::FCAS {
        let fraction = action[slot];
        if fraction <= 0.0 {
            continue;
        }
        let required = fraction * state.p_max * slot.response_duration_h(state.dt);
        let available = match slot.side() {
            PoolSide::Discharge => state.c_soc,
            PoolSide::Charge => headroom,
        };
        if required > available {
            debug!(
                ?slot,
                required_mwh = required,
                available_mwh = available,
                "Zeroing FCAS commitment"
            );
            action[slot] = 0.0;
            zeroed.push(slot);
        }
    }
    zeroed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(c_soc: f64) -> HeadroomState {
        HeadroomState {
            c_soc,
            c_max: 10.0,
            p_max: 60.0,
            dt: 5.0 / 60.0,
        }
    }

    #[test]
    fn test_clean_action_passes_through() {
        let mut action = ActionVector([0.5, 0.0, 0.0, 0.0, 0.0, 0.1, 0.1, 0.1]);
        let before = action;
        let report = enforce(&mut action, MutualExclusionPolicy::ZeroBoth, &state(5.0)).unwrap();
        assert_eq!(report, FeasibilityReport::default());
        assert_eq!(action, before);
    }

    #[test]
    fn test_clamp_then_normalize() {
        let mut action = ActionVector([0.0, 2.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let report = enforce(&mut action, MutualExclusionPolicy::ZeroBoth, &state(5.0)).unwrap();

        assert_eq!(report.range_violations, 1);
        assert_eq!(report.scaled_pools, vec![PoolSide::Discharge]);
        assert_eq!(action[ActionSlot::Discharge], 0.5);
        assert_eq!(action[ActionSlot::Raise6Sec], 0.5);
    }

    #[test]
    fn test_mutual_exclusion_policies() {
        let raw = ActionVector([0.3, 0.4, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        let mut action = raw;
        let report = enforce(&mut action, MutualExclusionPolicy::ZeroBoth, &state(5.0)).unwrap();
        assert_eq!(report.simultaneous, Some((0.3, 0.4)));
        assert!(action.is_zero());

        let mut action = raw;
        let err = enforce(&mut action, MutualExclusionPolicy::Strict, &state(5.0)).unwrap_err();
        assert_eq!(
            err,
            SimultaneousDispatch {
                charge: 0.3,
                discharge: 0.4
            }
        );
    }

    #[test]
    fn test_raise_needs_stored_energy() {
        // 1.0 * 60 MW * 5 min = 5 MWh needed, only 4 stored
        let mut action = ActionVector([0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        let zeroed = zero_infeasible_fcas(&mut action, &state(4.0));
        assert_eq!(zeroed, vec![ActionSlot::Raise5Min]);
        assert!(action.is_zero());

        // 6-second response needs only 0.1 MWh
        let mut action = ActionVector([0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(zero_infeasible_fcas(&mut action, &state(4.0)).is_empty());
    }

    #[test]
    fn test_lower_needs_headroom() {
        let mut action = ActionVector([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0]);
        // 1 MWh for 60 s fits in 2 MWh of headroom, 5 MWh for 5 min does not
        let zeroed = zero_infeasible_fcas(&mut action, &state(8.0));
        assert_eq!(zeroed, vec![ActionSlot::Lower5Min]);
        assert_eq!(action[ActionSlot::Lower60Sec], 1.0);
    }
}
