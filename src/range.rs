/*
 * This file is part of Noisectl.
 *
 * Copyright (C) 2026 Noisectl contributors
 *
 * Noisectl is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Noisectl is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Noisectl. If not, see <https://www.gnu.org/licenses/>.
 */

//! The observed min/max range used to normalize raw readings.

use serde::{Deserialize, Serialize};

/// Normalization bounds for raw noise readings.
///
/// Invariant: `low <= high`. A degenerate range (`high == low`) is legal
/// and makes normalization collapse to zero rather than divide by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRange {
    pub low: f64,
    pub high: f64,
}

impl CalibrationRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high: high.max(low) }
    }

    pub fn span(&self) -> f64 {
        self.high - self.low
    }
}

/// Tracks the live normalization range.
///
/// With auto-calibration on, bounds learn outward from the signal and
/// never narrow again until an explicit `set_range`.
#[derive(Debug, Clone)]
pub struct RangeCalibrator {
    range: CalibrationRange,
    seeded: bool,
}

impl RangeCalibrator {
    pub fn new(low: f64, high: f64) -> Self {
        Self {
            range: CalibrationRange::new(low, high),
            seeded: false,
        }
    }

    /// Feed one raw reading. Only widens bounds, and only when
    /// auto-calibration is enabled and the reading is positive.
    pub fn observe(&mut self, raw: i64, auto_calibrate: bool) {
        if !auto_calibrate || raw <= 0 {
            return;
        }
        let v = raw as f64;
        if !self.seeded {
            // First live sample pins both bounds to the signal.
            self.range = CalibrationRange { low: v, high: v };
            self.seeded = true;
        } else {
            self.range.low = self.range.low.min(v);
            self.range.high = self.range.high.max(v);
        }
    }

    pub fn range(&self) -> CalibrationRange {
        self.range
    }

    /// Explicit write from manual thresholds or a completed calibration
    /// run. Re-arms seeding so the next auto-calibrated sample starts a
    /// fresh observation.
    pub fn set_range(&mut self, low: f64, high: f64) {
        self.range = CalibrationRange::new(low, high);
        self.seeded = false;
    }
}
