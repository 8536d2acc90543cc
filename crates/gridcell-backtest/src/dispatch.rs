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

//! Physical and economic outcome of one feasible action.

use crate::config::DegradationPolicy;
use gridcell_types::{
    ActionSlot, ActionVector, BatterySpec, FIVE_MINUTES_H, FcasCallModel, N_ACTIONS, PoolSide,
    PriceRow,
};
use rand::Rng;

/// Capacity after this interval's wear
#[must_use]
pub fn degraded_capacity(
    c_max: f64,
    action: &ActionVector,
    battery: &BatterySpec,
    policy: DegradationPolicy,
    dt: f64,
) -> f64 {
    if !action.moves_energy() {
        return c_max;
    }
    let rate = match policy {
        DegradationPolicy::PerAction => battery.deg,
        DegradationPolicy::Throughput => {
            let moved = action[ActionSlot::Charge] + action[ActionSlot::Discharge];
            battery.deg * (moved * dt / FIVE_MINUTES_H).min(1.0)
        }
    };
    c_max * (1.0 - rate)
}

/// Which slots actually delivered energy this interval.
///
/// Energy slots are always called. Each FCAS slot with a non-zero
/// commitment draws one Bernoulli event; uncommitted slots consume no
/// randomness.
pub fn draw_calls<R: Rng + ?Sized>(
    action: &ActionVector,
    model: &FcasCallModel,
    rng: &mut R,
) -> [bool; N_ACTIONS] {
    let mut called = [false; N_ACTIONS];
    for slot in ActionSlot::ALL {
        if action[slot] <= 0.0 {
            continue;
        }
        called[slot.index()] = if slot.is_fcas() {
            rng.gen_bool(model.probability(slot))
        } else {
            true
        };
    }
    called
}

/// Signed SOC change (MWh) from the slots that were called
#[must_use]
pub fn energy_delta(
    action: &ActionVector,
    called: &[bool; N_ACTIONS],
    battery: &BatterySpec,
    dt: f64,
) -> f64 {
    ActionSlot::ALL
        .iter()
        .filter(|slot| called[slot.index()])
        .map(|&slot| {
            let side = slot.side();
            let eta = match side {
                PoolSide::Charge => battery.eta_chg,
                PoolSide::Discharge => battery.eta_dchg,
            };
            side.soc_sign() * action[slot] * battery.p_max * eta * slot.response_duration_h(dt)
        })
        .sum()
}

/// Revenue per action slot ($ for the interval).
///
/// Energy pays `∓ MW × price × dt`; FCAS pays availability, whether or not
/// the market was called.
#[must_use]
pub fn interval_revenue(
    action_mw: &ActionVector,
    prices: &PriceRow,
    dt: f64,
) -> [f64; N_ACTIONS] {
    let mut revenue = [0.0; N_ACTIONS];
    for slot in ActionSlot::ALL {
        let mw = action_mw[slot];
        if mw == 0.0 {
            continue;
        }
        let sign = if slot == ActionSlot::Charge { -1.0 } else { 1.0 };
        revenue[slot.index()] = sign * mw * prices[slot.market().index()] * dt;
    }
    revenue
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const DT: f64 = 5.0 / 60.0;

    fn battery(deg: f64) -> BatterySpec {
        BatterySpec::new(50.0, 50.0, deg, 0.9, 0.95).unwrap()
    }

    #[test]
    fn test_per_action_degradation() {
        let spec = battery(0.01);
        let charge = ActionVector::from_signed_energy(0.1);
        let c = degraded_capacity(50.0, &charge, &spec, DegradationPolicy::PerAction, DT);
        assert!((c - 49.5).abs() < 1e-12);

        // FCAS-only commitment causes no wear
        let mut fcas = ActionVector::zero();
        fcas[ActionSlot::Raise6Sec] = 1.0;
        assert_eq!(
            degraded_capacity(50.0, &fcas, &spec, DegradationPolicy::PerAction, DT),
            50.0
        );
    }

    #[test]
    fn test_throughput_degradation_scales_and_caps() {
        let spec = battery(0.01);
        let half = ActionVector::from_signed_energy(0.5);
        let c = degraded_capacity(50.0, &half, &spec, DegradationPolicy::Throughput, DT);
        assert!((c - 50.0 * (1.0 - 0.005)).abs() < 1e-12);

        // A 30-minute interval at full power is capped at one full step
        let full = ActionVector::from_signed_energy(1.0);
        let c = degraded_capacity(50.0, &full, &spec, DegradationPolicy::Throughput, 0.5);
        assert!((c - 49.5).abs() < 1e-12);
    }

    #[test]
    fn test_uncommitted_slots_draw_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut reference = StdRng::seed_from_u64(7);
        let called = draw_calls(&ActionVector::zero(), &FcasCallModel::default(), &mut rng);
        assert!(called.iter().all(|c| !c));
        assert_eq!(rng.r#gen::<u64>(), reference.r#gen::<u64>());
    }

    #[test]
    fn test_certain_and_impossible_calls() {
        let mut rng = StdRng::seed_from_u64(1);
        let action = ActionVector([0.5, 0.0, 0.2, 0.0, 0.0, 0.0, 0.0, 0.3]);

        let always = draw_calls(&action, &FcasCallModel::uniform(1.0), &mut rng);
        assert_eq!(always, [true, false, true, false, false, false, false, true]);

        let never = draw_calls(&action, &FcasCallModel::uniform(0.0), &mut rng);
        assert_eq!(never, [true, false, false, false, false, false, false, false]);
    }

    #[test]
    fn test_energy_delta_signs_and_efficiency() {
        let spec = battery(0.0);
        let all_called = [true; N_ACTIONS];

        let charge = ActionVector::from_signed_energy(1.0);
        let delta = energy_delta(&charge, &all_called, &spec, DT);
        assert!((delta - 50.0 * 0.9 * DT).abs() < 1e-12);

        let discharge = ActionVector::from_signed_energy(-1.0);
        let delta = energy_delta(&discharge, &all_called, &spec, DT);
        assert!((delta + 50.0 * 0.95 * DT).abs() < 1e-12);

        let mut raise = ActionVector::zero();
        raise[ActionSlot::Raise60Sec] = 1.0;
        let mut not_called = [true; N_ACTIONS];
        not_called[ActionSlot::Raise60Sec.index()] = false;
        assert_eq!(energy_delta(&raise, &not_called, &spec, DT), 0.0);
        let delta = energy_delta(&raise, &all_called, &spec, DT);
        assert!((delta + 50.0 * 0.95 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_revenue_sign_convention() {
        let prices = [100.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0];

        let charge = ActionVector([50.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let r = interval_revenue(&charge, &prices, DT);
        assert!(r[0] < 0.0);
        assert!((r[0] + 50.0 * 100.0 * DT).abs() < 1e-9);

        let mixed = ActionVector([0.0, 25.0, 0.0, 0.0, 25.0, 0.0, 0.0, 10.0]);
        let r = interval_revenue(&mixed, &prices, DT);
        assert!((r[1] - 25.0 * 100.0 * DT).abs() < 1e-9);
        assert!((r[4] - 25.0 * 30.0 * DT).abs() < 1e-9);
        assert!((r[7] - 10.0 * 60.0 * DT).abs() < 1e-9);
    }
}
