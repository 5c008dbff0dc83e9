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

//! Noisectl - Ambient noise monitor for serial sound sensors
//!
//! This library reads noise levels from a serial-attached sensor,
//! smooths and normalizes them against a calibrated range, raises
//! sustained-noise alerts, and maps processed levels onto the system
//! output volume.

pub mod actuator;
pub mod alert;
pub mod calibrate;
pub mod config;
pub mod decode;
pub mod export;
pub mod filter;
pub mod history;
pub mod logger;
pub mod monitor;
pub mod preset;
pub mod process;
pub mod range;
pub mod stream;

#[cfg(test)]
pub mod test_utils;
