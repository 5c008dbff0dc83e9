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

//! Conversion of a smoothed raw reading into the 0-100 control value and
//! the final volume command.

use crate::range::CalibrationRange;

pub const MIN_SENSITIVITY: f64 = 1.0;
pub const MAX_SENSITIVITY: f64 = 5.0;
pub const DEFAULT_SENSITIVITY: f64 = 3.0;

/// Clamp to the calibration range, normalize to 0-100, then apply the
/// sensitivity curve `(n/100)^(1/sensitivity) * 100`.
///
/// Sensitivity 1.0 is linear; higher values exaggerate small deviations
/// above the floor. Output is always in `[0, 100]`; a degenerate or
/// invalid range yields 0.
pub fn process_noise(smoothed: f64, range: CalibrationRange, sensitivity: f64) -> f64 {
    let span = range.span();
    // NaN span fails this comparison too, so bad bounds fall through to 0.
    if !(span > 0.0) || !smoothed.is_finite() {
        return 0.0;
    }

    let clamped = smoothed.clamp(range.low, range.high);
    let normalized = (clamped - range.low) / span * 100.0;

    let sensitivity = sensitivity.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY);
    let enhanced = (normalized / 100.0).powf(1.0 / sensitivity) * 100.0;
    if enhanced.is_finite() {
        enhanced.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Map a processed value onto a volume command, capped at `max_volume`.
pub fn map_volume(processed: f64, max_volume: u8) -> u8 {
    if !processed.is_finite() || processed <= 0.0 {
        return 0;
    }
    let level = processed.round().clamp(0.0, 100.0) as u8;
    level.min(max_volume)
}
