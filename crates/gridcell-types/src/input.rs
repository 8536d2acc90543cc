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

//! Time-indexed price inputs for one region and time window.

use crate::error::InputError;
use crate::markets::{Market, N_MARKETS, Region};
use chrono::{DateTime, Utc};

/// Default dispatch interval: 5 minutes (hours)
pub const DEFAULT_DT_H: f64 = 5.0 / 60.0;

/// Realised prices for one interval, one column per [`Market`] ($/MWh)
pub type PriceRow = [f64; N_MARKETS];

/// Forecast and realised prices for a backtest window.
///
/// The forecast is a dense `(timesteps, 7, horizon)` tensor stored row-major:
/// for every interval there is one forward price path per market. Immutable
/// once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestInputData {
    forecast: Vec<f64>,
    horizon: usize,
    realised: Vec<PriceRow>,
    timestamps: Vec<DateTime<Utc>>,
    dt: f64,
    region: Option<Region>,
}

impl BacktestInputData {
    /// Build input data from a flat `(timesteps, 7, horizon)` forecast buffer.
    ///
    /// Fails if the arrays disagree on length, the timestamps do not follow
    /// a fixed `dt` cadence, or a realised price is not finite.
    pub fn new(
        forecast: Vec<f64>,
        horizon: usize,
        realised: Vec<PriceRow>,
        timestamps: Vec<DateTime<Utc>>,
        dt: f64,
    ) -> Result<Self, InputError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(InputError::InvalidInterval(dt));
        }
        if horizon == 0 {
            return Err(InputError::EmptyHorizon);
        }
        if realised.is_empty() {
            return Err(InputError::Empty);
        }
        let stride = N_MARKETS * horizon;
        if forecast.len() % stride != 0 {
            return Err(InputError::ForecastShape {
                expected: realised.len() * stride,
                actual: forecast.len(),
            });
        }
        let forecast_rows = forecast.len() / stride;
        if forecast_rows != realised.len() || realised.len() != timestamps.len() {
            return Err(InputError::LengthMismatch {
                forecast: forecast_rows,
                realised: realised.len(),
                timestamps: timestamps.len(),
            });
        }
        check_cadence(&timestamps, dt)?;
        check_realised(&realised)?;

        Ok(Self {
            forecast,
            horizon,
            realised,
            timestamps,
            dt,
            region: None,
        })
    }

    /// Build input data from one `[market][step]` forecast matrix per interval
    pub fn from_windows(
        windows: &[[Vec<f64>; N_MARKETS]],
        realised: Vec<PriceRow>,
        timestamps: Vec<DateTime<Utc>>,
        dt: f64,
    ) -> Result<Self, InputError> {
        let horizon = windows.first().map_or(0, |w| w[0].len());
        let mut forecast = Vec::with_capacity(windows.len() * N_MARKETS * horizon);
        for window in windows {
            for row in window {
                if row.len() != horizon {
                    return Err(InputError::ForecastShape {
                        expected: horizon,
                        actual: row.len(),
                    });
                }
                forecast.extend_from_slice(row);
            }
        }
        Self::new(forecast, horizon, realised, timestamps, dt)
    }

    /// Use the realised prices as their own forecast.
    ///
    /// `forecast[t, m, h] = realised[t + h, m]`; steps past the end of the
    /// series repeat the final realised row. This gives optimisers perfect
    /// insight into upcoming prices and bounds achievable performance.
    pub fn from_perfect_foresight(
        realised: Vec<PriceRow>,
        timestamps: Vec<DateTime<Utc>>,
        dt: f64,
        horizon: usize,
    ) -> Result<Self, InputError> {
        let n = realised.len();
        let mut forecast = Vec::with_capacity(n * N_MARKETS * horizon);
        for t in 0..n {
            for market in 0..N_MARKETS {
                for h in 0..horizon {
                    let source = (t + h).min(n.saturating_sub(1));
                    forecast.push(realised.get(source).map_or(f64::NAN, |row| row[market]));
                }
            }
        }
        Self::new(forecast, horizon, realised, timestamps, dt)
    }

    /// Tag the data with its pricing region
    #[must_use]
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Number of dispatch intervals
    #[must_use]
    pub fn len(&self) -> usize {
        self.realised.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.realised.is_empty()
    }

    /// Forecast steps available at every interval
    #[must_use]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Interval duration (hours)
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    #[must_use]
    pub fn region(&self) -> Option<Region> {
        self.region
    }

    #[must_use]
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    #[must_use]
    pub fn realised(&self) -> &[PriceRow] {
        &self.realised
    }

    /// Realised prices for interval `t`
    #[must_use]
    pub fn realised_at(&self, t: usize) -> Option<&PriceRow> {
        self.realised.get(t)
    }

    /// Forward-looking price paths published at interval `t`
    #[must_use]
    pub fn forecast_at(&self, t: usize) -> Option<ForecastWindow<'_>> {
        let stride = N_MARKETS * self.horizon;
        let start = t.checked_mul(stride)?;
        let values = self.forecast.get(start..start + stride)?;
        Some(ForecastWindow {
            values,
            horizon: self.horizon,
        })
    }
}

fn check_realised(realised: &[PriceRow]) -> Result<(), InputError> {
    for (interval, row) in realised.iter().enumerate() {
        for market in Market::ALL {
            let value = row[market.index()];
            if !value.is_finite() {
                return Err(InputError::NonFiniteRealised {
                    interval,
                    market,
                    value,
                });
            }
        }
    }
    Ok(())
}

fn check_cadence(timestamps: &[DateTime<Utc>], dt: f64) -> Result<(), InputError> {
    let expected_secs = (dt * 3600.0).round() as i64;
    for (index, pair) in timestamps.windows(2).enumerate() {
        let actual_secs = (pair[1] - pair[0]).num_seconds();
        if actual_secs != expected_secs {
            return Err(InputError::IrregularCadence {
                index: index + 1,
                expected_secs,
                actual_secs,
            });
        }
    }
    Ok(())
}

/// Borrowed `(7, horizon)` view of one interval's forecast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastWindow<'a> {
    values: &'a [f64],
    horizon: usize,
}

impl<'a> ForecastWindow<'a> {
    /// Wrap a row-major `(7, horizon)` buffer.
    ///
    /// Returns `None` when the buffer length is not `7 * horizon`.
    #[must_use]
    pub fn new(values: &'a [f64], horizon: usize) -> Option<Self> {
        (horizon > 0 && values.len() == N_MARKETS * horizon).then_some(Self { values, horizon })
    }

    #[must_use]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Price path for one market
    #[must_use]
    pub fn market(&self, market: Market) -> &'a [f64] {
        let start = market.index() * self.horizon;
        &self.values[start..start + self.horizon]
    }

    /// Energy-market price path, the `(horizon,)` view used by energy-only
    /// strategies
    #[must_use]
    pub fn energy(&self) -> &'a [f64] {
        self.market(Market::Energy)
    }

    #[must_use]
    pub fn has_nan(&self) -> bool {
        self.values.iter().any(|v| v.is_nan())
    }

    /// Restrict every market's path to its first `steps` entries
    #[must_use]
    pub fn truncated(&self, steps: usize) -> TruncatedWindow<'a> {
        TruncatedWindow {
            window: *self,
            steps: steps.min(self.horizon),
        }
    }
}

/// A [`ForecastWindow`] limited to a shorter optimisation horizon
#[derive(Debug, Clone, Copy)]
pub struct TruncatedWindow<'a> {
    window: ForecastWindow<'a>,
    steps: usize,
}

impl<'a> TruncatedWindow<'a> {
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[must_use]
    pub fn market(&self, market: Market) -> &'a [f64] {
        &self.window.market(market)[..self.steps]
    }

    #[must_use]
    pub fn has_nan(&self) -> bool {
        Market::ALL
            .iter()
            .any(|m| self.market(*m).iter().any(|v| v.is_nan()))
    }
}
