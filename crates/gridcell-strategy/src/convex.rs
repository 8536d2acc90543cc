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

//! Receding-horizon linear program over energy and all six FCAS markets.
//!
//! Decision variables are `p[t, k]`, the MW allocated to action slot `k` at
//! step `t`, followed by the expected SOC trajectory `soc[t]`:
//!
//! ```text
//! minimise   dt * Σ_t ( price_e[t] * (p_chg - p_dchg) - Σ_fcas price_m[t] * p_m )
//!            + gamma * dt * Σ p
//! subject to soc[t] = soc[t-1] + Σ_k sign_k * eta_k * prob_k * dur_k * p[t, k]
//!            0 <= soc[t] <= c_max
//!            Σ discharge-side p[t, ·] <= p_max
//!            Σ charge-side p[t, ·]    <= p_max
//!            p >= 0
//! ```
//!
//! FCAS slots move SOC by their expected energy (call probability times
//! response duration), since the optimisation has to be deterministic. Only
//! the first step is returned to the engine.

use crate::context::{DecisionContext, Strategy};
use crate::dynamic::DEFAULT_HORIZON;
use crate::error::StrategyError;
use clarabel::algebra::CscMatrix;
use clarabel::solver::{DefaultSettings, DefaultSolver, IPSolver, SolverStatus, SupportedConeT};
use gridcell_types::{
    ActionSlot, ActionVector, FcasCallModel, N_ACTIONS, PoolSide, ensure_distinct_efficiencies,
};
use tracing::{debug, warn};

/// Allocations below this fraction of `p_max` are solver noise
pub const TOLERANCE: f64 = 1e-4;

#[derive(Debug)]
pub struct ConvexFcas {
    gamma: f64,
    horizon: usize,
    call_model: FcasCallModel,
    template: Option<LpTemplate>,
}

impl ConvexFcas {
    /// # Arguments
    /// * `gamma` - Penalty ($/MWh) on every allocated MW, discourages
    ///   simultaneous charge/discharge and idle FCAS bids
    /// * `horizon` - Maximum number of forecast steps to optimise over
    /// * `call_model` - FCAS call probabilities used for the expected SOC path
    pub fn new(
        gamma: f64,
        horizon: usize,
        call_model: FcasCallModel,
    ) -> Result<Self, StrategyError> {
        if !gamma.is_finite() {
            return Err(StrategyError::invalid("gamma", "must be finite"));
        }
        if horizon == 0 {
            return Err(StrategyError::invalid("horizon", "must be positive"));
        }
        if !call_model.is_valid() {
            return Err(StrategyError::invalid(
                "call_probability",
                "probabilities must lie in [0, 1]",
            ));
        }
        Ok(Self {
            gamma,
            horizon,
            call_model,
            template: None,
        })
    }

    /// Solve the horizon program and return the first step in MW
    fn solve(&mut self, ctx: &DecisionContext<'_>, steps: usize) -> Option<[f64; N_ACTIONS]> {
        self.refresh_template(ctx, steps);
        let template = self.template.as_ref()?;
        let layout = template.layout;

        let window = ctx.forecast.truncated(steps);
        let mut q = vec![0.0; layout.n_vars()];
        for t in 0..steps {
            for slot in ActionSlot::ALL {
                let price = window.market(slot.market())[t];
                let cost_sign = if slot == ActionSlot::Charge { 1.0 } else { -1.0 };
                q[layout.p(t, slot)] = cost_sign * ctx.dt * price + self.gamma * ctx.dt;
            }
        }

        let mut b = vec![0.0; layout.n_rows()];
        b[layout.dynamics_row(0)] = ctx.c_soc;
        for t in 0..steps {
            b[layout.soc_upper_row(t)] = ctx.c_max;
            b[layout.pool_row(PoolSide::Discharge, t)] = ctx.p_max;
            b[layout.pool_row(PoolSide::Charge, t)] = ctx.p_max;
        }

        let settings = DefaultSettings::<f64> {
            verbose: false,
            ..DefaultSettings::default()
        };
        let mut solver = DefaultSolver::new(
            &template.p,
            &q,
            &template.a,
            &b,
            &template.cones,
            settings,
        );
        solver.solve();

        match solver.solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {
                let mut first = [0.0; N_ACTIONS];
                for slot in ActionSlot::ALL {
                    first[slot.index()] = solver.solution.x[layout.p(0, slot)];
                }
                Some(first)
            }
            status => {
                warn!(
                    strategy = "Convex-FCAS",
                    ?status,
                    steps,
                    "Solver did not converge, defaulting to no action"
                );
                None
            }
        }
    }

    /// Rebuild the constraint matrix when the horizon width, efficiencies
    /// or interval length changed
    fn refresh_template(&mut self, ctx: &DecisionContext<'_>, steps: usize) {
        let fresh = self
            .template
            .as_ref()
            .is_some_and(|t| t.matches(steps, ctx.eta_chg, ctx.eta_dchg, ctx.dt));
        if !fresh {
            debug!(steps, "Building LP template");
            self.template = Some(LpTemplate::build(
                steps,
                ctx.eta_chg,
                ctx.eta_dchg,
                ctx.dt,
                &self.call_model,
            ));
        }
    }
}

impl Default for ConvexFcas {
    fn default() -> Self {
        Self {
            gamma: 0.0,
            horizon: DEFAULT_HORIZON,
            call_model: FcasCallModel::default(),
            template: None,
        }
    }
}

impl Strategy for ConvexFcas {
    fn name(&self) -> &str {
        "Convex-FCAS"
    }

    fn action(&mut self, ctx: &DecisionContext<'_>) -> Result<ActionVector, StrategyError> {
        ensure_distinct_efficiencies(ctx.eta_chg, ctx.eta_dchg)?;

        let steps = self.horizon.min(ctx.forecast.horizon());
        if ctx.forecast.truncated(steps).has_nan() || !(ctx.p_max > 0.0 && ctx.c_max > 0.0) {
            return Ok(ActionVector::zero());
        }

        let Some(first_mw) = self.solve(ctx, steps) else {
            return Ok(ActionVector::zero());
        };

        let mut action = ActionVector(first_mw.map(|mw| mw / ctx.p_max));
        action.snap_below(TOLERANCE);
        net_energy_legs(&mut action);
        action.clamp_unit();
        action.normalize_pools();
        Ok(action)
    }
}

/// With `gamma = 0` the program is indifferent to simultaneous charge and
/// discharge. Keep only the net leg so the engine never sees both.
fn net_energy_legs(action: &mut ActionVector) {
    let charge = action[ActionSlot::Charge];
    let discharge = action[ActionSlot::Discharge];
    if charge > 0.0 && discharge > 0.0 {
        if charge >= discharge {
            action[ActionSlot::Charge] = charge - discharge;
            action[ActionSlot::Discharge] = 0.0;
        } else {
            action[ActionSlot::Charge] = 0.0;
            action[ActionSlot::Discharge] = discharge - charge;
        }
    }
}

/// Variable and constraint-row indexing for a given number of steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    steps: usize,
}

impl Layout {
    fn n_alloc(self) -> usize {
        self.steps * N_ACTIONS
    }

    fn n_vars(self) -> usize {
        self.n_alloc() + self.steps
    }

    fn p(self, t: usize, slot: ActionSlot) -> usize {
        t * N_ACTIONS + slot.index()
    }

    fn soc(self, t: usize) -> usize {
        self.n_alloc() + t
    }

    // Equality rows come first (zero cone), everything after is `Ax <= b`.

    fn dynamics_row(self, t: usize) -> usize {
        t
    }

    fn alloc_nonneg_row(self, t: usize, slot: ActionSlot) -> usize {
        self.steps + self.p(t, slot)
    }

    fn soc_lower_row(self, t: usize) -> usize {
        self.steps + self.n_alloc() + t
    }

    fn soc_upper_row(self, t: usize) -> usize {
        2 * self.steps + self.n_alloc() + t
    }

    fn pool_row(self, side: PoolSide, t: usize) -> usize {
        let offset = match side {
            PoolSide::Discharge => 3,
            PoolSide::Charge => 4,
        };
        offset * self.steps + self.n_alloc() + t
    }

    fn n_rows(self) -> usize {
        5 * self.steps + self.n_alloc()
    }
}

/// Constraint structure that only changes with the horizon width,
/// efficiencies or interval length
#[derive(Debug)]
struct LpTemplate {
    layout: Layout,
    eta_chg: f64,
    eta_dchg: f64,
    dt: f64,
    p: CscMatrix<f64>,
    a: CscMatrix<f64>,
    cones: Vec<SupportedConeT<f64>>,
}

impl LpTemplate {
    #[expect(clippy::float_cmp)]
    fn matches(&self, steps: usize, eta_chg: f64, eta_dchg: f64, dt: f64) -> bool {
        self.layout.steps == steps
            && self.eta_chg == eta_chg
            && self.eta_dchg == eta_dchg
            && self.dt == dt
    }

    fn build(
        steps: usize,
        eta_chg: f64,
        eta_dchg: f64,
        dt: f64,
        call_model: &FcasCallModel,
    ) -> Self {
        let layout = Layout { steps };
        let mut a = Triplets::default();

        let soc_coefficient = |slot: ActionSlot| {
            let eta = match slot.side() {
                PoolSide::Charge => eta_chg,
                PoolSide::Discharge => eta_dchg,
            };
            slot.side().soc_sign() * eta * call_model.expected_energy_weight(slot, dt)
        };

        for t in 0..steps {
            let row = layout.dynamics_row(t);
            a.push(row, layout.soc(t), 1.0);
            if t > 0 {
                a.push(row, layout.soc(t - 1), -1.0);
            }
            for slot in ActionSlot::ALL {
                let coefficient = soc_coefficient(slot);
                if coefficient != 0.0 {
                    a.push(row, layout.p(t, slot), -coefficient);
                }
            }
        }

        for t in 0..steps {
            for slot in ActionSlot::ALL {
                a.push(layout.alloc_nonneg_row(t, slot), layout.p(t, slot), -1.0);
            }
            a.push(layout.soc_lower_row(t), layout.soc(t), -1.0);
            a.push(layout.soc_upper_row(t), layout.soc(t), 1.0);
            for slot in ActionSlot::DISCHARGE_SIDE {
                a.push(layout.pool_row(PoolSide::Discharge, t), layout.p(t, slot), 1.0);
            }
            for slot in ActionSlot::CHARGE_SIDE {
                a.push(layout.pool_row(PoolSide::Charge, t), layout.p(t, slot), 1.0);
            }
        }

        let n = layout.n_vars();
        Self {
            layout,
            eta_chg,
            eta_dchg,
            dt,
            p: CscMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new()),
            a: a.into_csc(layout.n_rows(), n),
            cones: vec![
                SupportedConeT::ZeroConeT(steps),
                SupportedConeT::NonnegativeConeT(layout.n_rows() - steps),
            ],
        }
    }
}

/// Coordinate-format builder for a sparse matrix
#[derive(Debug, Default)]
struct Triplets {
    entries: Vec<(usize, usize, f64)>,
}

impl Triplets {
    fn push(&mut self, row: usize, col: usize, value: f64) {
        self.entries.push((row, col, value));
    }

    /// Compressed sparse column form. Entries must not repeat a position.
    fn into_csc(mut self, m: usize, n: usize) -> CscMatrix<f64> {
        self.entries.sort_unstable_by_key(|&(row, col, _)| (col, row));

        let mut colptr = vec![0; n + 1];
        let mut rowval = Vec::with_capacity(self.entries.len());
        let mut nzval = Vec::with_capacity(self.entries.len());
        for (row, col, value) in self.entries {
            colptr[col + 1] += 1;
            rowval.push(row);
            nzval.push(value);
        }
        for col in 0..n {
            colptr[col + 1] += colptr[col];
        }
        CscMatrix::new(m, n, colptr, rowval, nzval)
    }
}
