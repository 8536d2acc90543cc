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

use gridcell_types::SpecError;
use thiserror::Error;

/// Fatal strategy errors.
///
/// Numeric edge cases (NaN forecasts, solver failures) are never reported
/// here; strategies fall back to the idle action for those.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error("Battery configuration unusable by strategy: {0}")]
    Spec(#[from] SpecError),

    #[error("Invalid strategy parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl StrategyError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
