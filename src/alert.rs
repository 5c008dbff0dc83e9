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

//! Sustained-threshold alert detection with debounce.
//!
//! A breach must persist for the configured sustain duration before the
//! alert fires; a brief spike that dips back below the threshold resets
//! the pending timer. The `Entered` edge is reported exactly once per
//! episode, `Exited` only if the episode actually reached `Active`.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Clear,
    /// Threshold first exceeded at this instant; not yet sustained.
    Pending(Instant),
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTransition {
    None,
    Entered,
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertDecision {
    /// True while the alert episode is active, the `Entered` cycle
    /// included.
    pub alerting: bool,
    pub transition: AlertTransition,
}

#[derive(Debug, Clone)]
pub struct AlertMonitor {
    state: AlertState,
}

impl AlertMonitor {
    pub fn new() -> Self {
        Self { state: AlertState::Clear }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn evaluate(
        &mut self,
        processed: f64,
        threshold: f64,
        sustain: Duration,
        now: Instant,
        enabled: bool,
    ) -> AlertDecision {
        if !enabled {
            self.state = AlertState::Clear;
            return AlertDecision { alerting: false, transition: AlertTransition::None };
        }

        if processed > threshold {
            match self.state {
                AlertState::Clear => {
                    self.state = AlertState::Pending(now);
                    AlertDecision { alerting: false, transition: AlertTransition::None }
                }
                AlertState::Pending(since) => {
                    if now.duration_since(since) > sustain {
                        self.state = AlertState::Active;
                        AlertDecision { alerting: true, transition: AlertTransition::Entered }
                    } else {
                        AlertDecision { alerting: false, transition: AlertTransition::None }
                    }
                }
                AlertState::Active => {
                    AlertDecision { alerting: true, transition: AlertTransition::None }
                }
            }
        } else {
            let was_active = self.state == AlertState::Active;
            self.state = AlertState::Clear;
            AlertDecision {
                alerting: false,
                transition: if was_active { AlertTransition::Exited } else { AlertTransition::None },
            }
        }
    }
}

impl Default for AlertMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 80.0;
    const SUSTAIN: Duration = Duration::from_secs(3);

    fn at(base: Instant, secs_x10: u64) -> Instant {
        base + Duration::from_millis(secs_x10 * 100)
    }

    #[test]
    fn test_single_entered_edge_after_sustain() {
        let t0 = Instant::now();
        let mut m = AlertMonitor::new();

        let d = m.evaluate(85.0, THRESHOLD, SUSTAIN, at(t0, 0), true);
        assert_eq!(d.transition, AlertTransition::None);
        assert!(!d.alerting);

        // 3.1s after the breach began: sustained, fires once
        let d = m.evaluate(85.0, THRESHOLD, SUSTAIN, at(t0, 31), true);
        assert_eq!(d.transition, AlertTransition::Entered);
        assert!(d.alerting);

        // Still above threshold: no repeated Entered
        let d = m.evaluate(90.0, THRESHOLD, SUSTAIN, at(t0, 40), true);
        assert_eq!(d.transition, AlertTransition::None);
        assert!(d.alerting);
    }

    #[test]
    fn test_exit_reported_once_after_active() {
        let t0 = Instant::now();
        let mut m = AlertMonitor::new();
        m.evaluate(85.0, THRESHOLD, SUSTAIN, at(t0, 0), true);
        m.evaluate(85.0, THRESHOLD, SUSTAIN, at(t0, 31), true);

        let d = m.evaluate(79.0, THRESHOLD, SUSTAIN, at(t0, 40), true);
        assert_eq!(d.transition, AlertTransition::Exited);
        assert!(!d.alerting);

        let d = m.evaluate(79.0, THRESHOLD, SUSTAIN, at(t0, 41), true);
        assert_eq!(d.transition, AlertTransition::None);
    }

    #[test]
    fn test_dip_resets_pending_timer() {
        let t0 = Instant::now();
        let mut m = AlertMonitor::new();

        m.evaluate(85.0, THRESHOLD, SUSTAIN, at(t0, 0), true);
        // Dip at t=1 before reaching Active: silent reset, no Exited
        let d = m.evaluate(79.0, THRESHOLD, SUSTAIN, at(t0, 10), true);
        assert_eq!(d.transition, AlertTransition::None);
        assert_eq!(m.state(), AlertState::Clear);

        // Breach again at t=1.5; sustain counts from here, so t=3.1 from
        // the first onset must not fire
        m.evaluate(85.0, THRESHOLD, SUSTAIN, at(t0, 15), true);
        let d = m.evaluate(85.0, THRESHOLD, SUSTAIN, at(t0, 31), true);
        assert_eq!(d.transition, AlertTransition::None);
        assert!(!d.alerting);

        // 3.1s after the new onset it does fire
        let d = m.evaluate(85.0, THRESHOLD, SUSTAIN, at(t0, 47), true);
        assert_eq!(d.transition, AlertTransition::Entered);
    }

    #[test]
    fn test_exact_sustain_boundary_does_not_fire() {
        let t0 = Instant::now();
        let mut m = AlertMonitor::new();
        m.evaluate(85.0, THRESHOLD, SUSTAIN, at(t0, 0), true);
        // Exactly 3.0s elapsed: strictly-greater rule, still pending
        let d = m.evaluate(85.0, THRESHOLD, SUSTAIN, at(t0, 30), true);
        assert_eq!(d.transition, AlertTransition::None);
    }

    #[test]
    fn test_value_at_threshold_is_not_a_breach() {
        let t0 = Instant::now();
        let mut m = AlertMonitor::new();
        let d = m.evaluate(80.0, THRESHOLD, SUSTAIN, t0, true);
        assert_eq!(m.state(), AlertState::Clear);
        assert_eq!(d.transition, AlertTransition::None);
    }

    #[test]
    fn test_disabled_forces_clear_without_transition() {
        let t0 = Instant::now();
        let mut m = AlertMonitor::new();
        m.evaluate(85.0, THRESHOLD, SUSTAIN, at(t0, 0), true);
        m.evaluate(85.0, THRESHOLD, SUSTAIN, at(t0, 31), true);
        assert_eq!(m.state(), AlertState::Active);

        let d = m.evaluate(85.0, THRESHOLD, SUSTAIN, at(t0, 40), false);
        assert_eq!(d.transition, AlertTransition::None);
        assert!(!d.alerting);
        assert_eq!(m.state(), AlertState::Clear);
    }
}
