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

//! The guided two-phase calibration procedure.
//!
//! Five seconds of ambient quiet, five seconds of deliberate loudness.
//! Observed bounds get a 10% outward margin and the alert threshold is
//! re-derived at 80% of the adjusted span. Nothing is committed until
//! the run completes; cancellation discards all partial state.

use std::time::Instant;

pub const QUIET_PHASE_SECS: f64 = 5.0;
pub const TOTAL_SECS: f64 = 10.0;
pub const RANGE_MARGIN: f64 = 0.1;
pub const THRESHOLD_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPhase {
    Idle,
    Quiet,
    Loud,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationOutcome {
    Calibrated { low: f64, high: f64, threshold: f64 },
    /// Bounds never left their sentinels: no usable samples arrived.
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationTick {
    Idle,
    Progress { phase: CalibrationPhase, percent: f64 },
    Finished(CalibrationOutcome),
}

/// Timed calibration state machine, driven by `tick` from the caller's
/// clock. Owns its own sentinel bounds so a cancelled or failed run
/// leaves the live range untouched.
#[derive(Debug, Clone)]
pub struct Calibrator {
    phase: CalibrationPhase,
    started: Option<Instant>,
    low: f64,
    high: f64,
}

impl Calibrator {
    pub fn new() -> Self {
        Self {
            phase: CalibrationPhase::Idle,
            started: None,
            low: f64::INFINITY,
            high: 0.0,
        }
    }

    pub fn begin(&mut self, now: Instant) {
        self.phase = CalibrationPhase::Quiet;
        self.started = Some(now);
        self.low = f64::INFINITY;
        self.high = 0.0;
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, CalibrationPhase::Quiet | CalibrationPhase::Loud)
    }

    /// Record one raw reading. Ignored unless a run is in progress.
    pub fn feed(&mut self, raw: i64) {
        if !self.is_running() {
            return;
        }
        let v = raw as f64;
        self.low = self.low.min(v);
        self.high = self.high.max(v);
    }

    /// Advance the procedure. Returns the progress to report, or the
    /// final outcome once the ten seconds have elapsed.
    pub fn tick(&mut self, now: Instant) -> CalibrationTick {
        let Some(started) = self.started else {
            return CalibrationTick::Idle;
        };
        if !self.is_running() {
            return CalibrationTick::Idle;
        }

        let elapsed = now.duration_since(started).as_secs_f64();
        if elapsed < QUIET_PHASE_SECS {
            self.phase = CalibrationPhase::Quiet;
            CalibrationTick::Progress {
                phase: self.phase,
                percent: elapsed * 10.0,
            }
        } else if elapsed < TOTAL_SECS {
            self.phase = CalibrationPhase::Loud;
            CalibrationTick::Progress {
                phase: self.phase,
                percent: 50.0 + (elapsed - QUIET_PHASE_SECS) * 10.0,
            }
        } else {
            CalibrationTick::Finished(self.finish())
        }
    }

    pub fn cancel(&mut self) {
        self.phase = CalibrationPhase::Idle;
        self.started = None;
        self.low = f64::INFINITY;
        self.high = 0.0;
    }

    fn finish(&mut self) -> CalibrationOutcome {
        self.started = None;
        if self.low.is_finite() && self.high > 0.0 {
            self.phase = CalibrationPhase::Done;
            let low = (self.low - self.low * RANGE_MARGIN).max(0.0);
            let high = self.high + self.high * RANGE_MARGIN;
            let threshold = low + (high - low) * THRESHOLD_FRACTION;
            CalibrationOutcome::Calibrated { low, high, threshold }
        } else {
            self.phase = CalibrationPhase::Failed;
            CalibrationOutcome::InsufficientData
        }
    }
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new()
    }
}
