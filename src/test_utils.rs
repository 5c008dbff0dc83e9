/*
 * Test utilities and mock helpers for Noisectl
 *
 * This module provides common test fixtures and helper functions
 * that can be used across different test modules.
 */

#[cfg(test)]
pub mod test_utils {
    use crate::config::Settings;
    use crate::history::{now_unix, Sample};

    /// Settings with a fixed 0..100 range and linear sensitivity so the
    /// pipeline passes values through unchanged.
    pub fn passthrough_settings() -> Settings {
        Settings {
            sensitivity: 1.0,
            min_threshold: 0.0,
            max_threshold: 100.0,
            auto_calibrate: false,
            ..Settings::default()
        }
    }

    pub fn sample_at(raw: i64, processed: f64, volume: u8) -> Sample {
        Sample { unix_ts: now_unix(), raw, processed, volume }
    }

    /// Ramp of samples with monotonically increasing raw readings.
    pub fn sample_ramp(count: usize) -> Vec<Sample> {
        (0..count)
            .map(|i| {
                let raw = (i as i64 + 1) * 10;
                sample_at(raw, raw as f64, raw.min(100) as u8)
            })
            .collect()
    }
}
