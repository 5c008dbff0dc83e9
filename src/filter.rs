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

//! Moving-average smoothing over the raw noise readings.

use std::collections::VecDeque;

pub const DEFAULT_WINDOW: usize = 5;

/// Sliding-window mean over the last `window` raw readings.
///
/// During startup the window is simply shorter; the mean is always taken
/// over whatever values are present.
#[derive(Debug, Clone)]
pub struct SmoothingFilter {
    window: usize,
    values: VecDeque<i64>,
}

impl SmoothingFilter {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            values: VecDeque::with_capacity(window.max(1)),
        }
    }

    /// Push a raw reading and return the mean of the current window.
    pub fn push(&mut self, raw: i64) -> f64 {
        if self.values.len() == self.window {
            self.values.pop_front();
        }
        self.values.push_back(raw);
        let sum: i64 = self.values.iter().sum();
        sum as f64 / self.values.len() as f64
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl Default for SmoothingFilter {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
