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

//! Bounded, time-ordered store of recent samples for display and export.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_CAPACITY: usize = 100;

/// One accepted reading after a full pipeline pass. Immutable once
/// recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Wall-clock seconds since the Unix epoch.
    pub unix_ts: f64,
    pub raw: i64,
    pub processed: f64,
    pub volume: u8,
}

pub fn now_unix() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// FIFO buffer of the most recent samples, oldest evicted first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<Sample>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<Sample> {
        self.entries.back().copied()
    }

    /// Ordered copy for export or plotting; not a live view.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.entries.iter().copied().collect()
    }

    /// Mean raw value over the newest `n` entries, 0 when empty. Used
    /// for the live readout during calibration.
    pub fn recent_raw_mean(&self, n: usize) -> f64 {
        if self.entries.is_empty() || n == 0 {
            return 0.0;
        }
        let take = n.min(self.entries.len());
        let sum: i64 = self.entries.iter().rev().take(take).map(|s| s.raw).sum();
        sum as f64 / take as f64
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
