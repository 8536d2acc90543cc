// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of GridCell.

//! Contract checks shared by every strategy, driven through the public API

use chrono::{Duration, TimeZone, Utc};
use gridcell_strategy::{
    ConvexFcas, DecisionContext, DynamicProgramming, Strategy, StrategyConfig,
};
use gridcell_types::{
    ActionSlot, BacktestInputData, BatterySpec, DEFAULT_DT_H, FcasCallModel, N_MARKETS, PoolSide,
    PriceRow,
};

fn input(prices: &[[f64; N_MARKETS]], horizon: usize) -> BacktestInputData {
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let timestamps = (0..prices.len())
        .map(|i| start + Duration::minutes(5 * i as i64))
        .collect();
    BacktestInputData::from_perfect_foresight(prices.to_vec(), timestamps, DEFAULT_DT_H, horizon)
        .unwrap()
}

fn daily_profile(n: usize) -> Vec<PriceRow> {
    (0..n)
        .map(|i| {
            let phase = i as f64 / n as f64 * std::f64::consts::TAU;
            let energy = 80.0 + 70.0 * phase.sin();
            [energy, 12.0, 8.0, 5.0, 3.0, 2.0, 6.0]
        })
        .collect()
}

fn context<'a>(
    data: &'a BacktestInputData,
    t: usize,
    c_soc: f64,
    spec: &BatterySpec,
    last_price: &'a PriceRow,
) -> DecisionContext<'a> {
    DecisionContext {
        forecast: data.forecast_at(t).unwrap(),
        c_soc,
        c_max: spec.e_max,
        p_max: spec.p_max,
        eta_chg: spec.eta_chg,
        eta_dchg: spec.eta_dchg,
        last_price,
        dt: data.dt(),
    }
}

#[test]
fn test_dp_charges_on_trivial_path() {
    let data = input(&[[10.0; N_MARKETS], [1000.0; N_MARKETS]], 2);
    let spec = BatterySpec::new(1.0, 10.0, 0.0, 1.0, 1.0).unwrap();
    let last = [f64::NAN; N_MARKETS];

    let mut dp = DynamicProgramming::new(0.0, 2, 101).unwrap();
    let action = dp.action(&context(&data, 0, 0.0, &spec, &last)).unwrap();

    assert_eq!(action[ActionSlot::Charge], 1.0);
}

#[test]
fn test_every_strategy_returns_unit_fractions() {
    let prices = daily_profile(24);
    let data = input(&prices, 12);
    let spec = BatterySpec::default();

    let configs = [
        StrategyConfig::Idle,
        StrategyConfig::NaiveBaseline {
            charge_limit: 40.0,
            discharge_limit: 120.0,
        },
        StrategyConfig::ForecastBaseline {
            charge_limit: 40.0,
            discharge_limit: 120.0,
        },
        StrategyConfig::QuantilePicker {
            charge_quantile: 0.1,
            discharge_quantile: 0.9,
        },
        StrategyConfig::DynamicProgramming {
            gamma: 0.0,
            horizon: 12,
            n_soc: 51,
        },
        StrategyConfig::ConvexFcas {
            gamma: 0.5,
            horizon: 12,
            fcas: FcasCallModel::default(),
        },
    ];

    for config in configs {
        let mut strategy = config.build().unwrap();
        for (t, last) in prices.iter().enumerate().take(6) {
            for c_soc in [0.0, 25.0, 50.0] {
                let action = strategy
                    .action(&context(&data, t, c_soc, &spec, last))
                    .unwrap();
                assert!(
                    action.0.iter().all(|v| (0.0..=1.0).contains(v)),
                    "{} returned {action:?}",
                    strategy.name()
                );
            }
        }
    }
}

#[test]
fn test_convex_output_survives_renormalization() {
    let prices = daily_profile(36);
    let data = input(&prices, 18);
    let spec = BatterySpec::default();
    let mut strategy = ConvexFcas::new(0.2, 18, FcasCallModel::default()).unwrap();

    for t in 0..4 {
        let mut action = strategy
            .action(&context(&data, t, 20.0, &spec, &prices[t]))
            .unwrap();
        assert!(action.pool_sum(PoolSide::Discharge) <= 1.0 + 1e-9);
        assert!(action.pool_sum(PoolSide::Charge) <= 1.0 + 1e-9);
        assert!(!(action[ActionSlot::Charge] > 0.0 && action[ActionSlot::Discharge] > 0.0));

        let before = action;
        assert!(action.normalize_pools().is_empty());
        assert_eq!(action, before);
    }
}
