// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of GridCell.

use crate::action::ActionVector;
use crate::markets::{ActionSlot, N_ACTIONS};
use serde::{Deserialize, Serialize};

/// Output trajectory of one backtest run.
///
/// Every vector has one entry per dispatch interval. Actions are the MW
/// actually committed after feasibility checks; `c_soc` and `c_max` are the
/// battery state at the end of the interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResults {
    /// Name of the strategy that produced the run
    pub strategy: String,

    /// Committed MW per action slot
    pub actions: Vec<[f64; N_ACTIONS]>,

    /// State of charge (MWh)
    pub c_soc: Vec<f64>,

    /// Remaining usable capacity (MWh)
    pub c_max: Vec<f64>,

    /// Revenue per action slot ($ per interval)
    pub revenue: Vec<[f64; N_ACTIONS]>,

    /// True where the whole interval's dispatch was rejected
    pub rejected: Vec<bool>,
}

impl BacktestResults {
    /// Pre-allocate an empty trajectory for `n` intervals
    #[must_use]
    pub fn with_capacity(strategy: impl Into<String>, n: usize) -> Self {
        Self {
            strategy: strategy.into(),
            actions: Vec::with_capacity(n),
            c_soc: Vec::with_capacity(n),
            c_max: Vec::with_capacity(n),
            revenue: Vec::with_capacity(n),
            rejected: Vec::with_capacity(n),
        }
    }

    /// Append one interval
    pub fn record(
        &mut self,
        action_mw: &ActionVector,
        c_soc: f64,
        c_max: f64,
        revenue: [f64; N_ACTIONS],
        rejected: bool,
    ) {
        self.actions.push(*action_mw.as_array());
        self.c_soc.push(c_soc);
        self.c_max.push(c_max);
        self.revenue.push(revenue);
        self.rejected.push(rejected);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.c_soc.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.c_soc.is_empty()
    }

    #[must_use]
    pub fn total_revenue(&self) -> f64 {
        self.revenue.iter().flatten().sum()
    }

    /// Energy-market revenue (charge + discharge slots)
    #[must_use]
    pub fn energy_revenue(&self) -> f64 {
        self.slot_revenue(ActionSlot::Charge) + self.slot_revenue(ActionSlot::Discharge)
    }

    /// Availability payments across the six FCAS markets
    #[must_use]
    pub fn fcas_revenue(&self) -> f64 {
        ActionSlot::FCAS
            .iter()
            .map(|slot| self.slot_revenue(*slot))
            .sum()
    }

    #[must_use]
    pub fn slot_revenue(&self, slot: ActionSlot) -> f64 {
        self.revenue.iter().map(|row| row[slot.index()]).sum()
    }

    #[must_use]
    pub fn charging_intervals(&self) -> usize {
        self.count_where(|row| row[ActionSlot::Charge.index()] > 0.0)
    }

    #[must_use]
    pub fn discharging_intervals(&self) -> usize {
        self.count_where(|row| row[ActionSlot::Discharge.index()] > 0.0)
    }

    /// Intervals with no commitment in any market
    #[must_use]
    pub fn idle_intervals(&self) -> usize {
        self.count_where(|row| row.iter().all(|v| *v == 0.0))
    }

    #[must_use]
    pub fn rejected_intervals(&self) -> usize {
        self.rejected.iter().filter(|r| **r).count()
    }

    #[must_use]
    pub fn final_capacity(&self) -> Option<f64> {
        self.c_max.last().copied()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn count_where(&self, predicate: impl Fn(&[f64; N_ACTIONS]) -> bool) -> usize {
        self.actions.iter().filter(|row| predicate(row)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BacktestResults {
        let mut results = BacktestResults::with_capacity("test", 3);
        let mut charge = ActionVector::zero();
        charge[ActionSlot::Charge] = 50.0;
        results.record(&charge, 4.0, 50.0, [-10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], false);

        let mut mixed = ActionVector::zero();
        mixed[ActionSlot::Discharge] = 25.0;
        mixed[ActionSlot::Raise5Min] = 25.0;
        results.record(&mixed, 2.0, 50.0, [0.0, 30.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0], false);

        results.record(&ActionVector::zero(), 2.0, 50.0, [0.0; N_ACTIONS], true);
        results
    }

    #[test]
    fn test_revenue_breakdown() {
        let results = sample();
        assert_eq!(results.total_revenue(), 25.0);
        assert_eq!(results.energy_revenue(), 20.0);
        assert_eq!(results.fcas_revenue(), 5.0);
    }

    #[test]
    fn test_activity_counts() {
        let results = sample();
        assert_eq!(results.len(), 3);
        assert_eq!(results.charging_intervals(), 1);
        assert_eq!(results.discharging_intervals(), 1);
        assert_eq!(results.idle_intervals(), 1);
        assert_eq!(results.rejected_intervals(), 1);
        assert_eq!(results.final_capacity(), Some(50.0));
    }

    #[test]
    fn test_json_export_contains_strategy() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"strategy\": \"test\""));
    }
}
