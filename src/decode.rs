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

//! Parsing of raw sensor lines into noise readings.
//!
//! Firmware emits either a bare decimal integer per line or a verbose
//! form like `"Raw Noise Level: 42 | Mapped Volume: 10"`. Anything else
//! is dropped silently; a garbled line must never abort acquisition.

const NOISE_MARKER: &str = "Noise Level:";

/// Extract a raw noise reading from one line of sensor output.
///
/// Returns `None` for malformed input instead of an error: single bad
/// lines are expected on a live serial link.
pub fn decode_line(line: &str) -> Option<i64> {
    let line = line.trim();

    if is_plain_number(line) {
        return line.parse().ok();
    }

    if line.contains(NOISE_MARKER) {
        // First |-delimited field carries "<label>: <value>"
        let field = line.split('|').next()?;
        let token = field.split(':').nth(1)?.trim();
        if is_plain_number(token) {
            return token.parse().ok();
        }
    }

    None
}

fn is_plain_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
