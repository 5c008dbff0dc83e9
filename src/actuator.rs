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

//! Actuator seams: system volume output and the audible alert cue.
//!
//! A failed volume write is logged and skipped by the caller; it must
//! never stop acquisition. The cue has no useful return value at all.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{anyhow, Context, Result};

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
pub trait VolumeActuator: Send {
    /// Set system output volume, `percent` in 0..=100.
    fn set_level(&mut self, percent: u8) -> Result<()>;
}

#[cfg_attr(test, automock)]
pub trait AlertCue: Send {
    fn play(&mut self);
}

/// Drives ALSA master volume through `amixer`.
#[derive(Debug, Default)]
pub struct AmixerVolume;

impl VolumeActuator for AmixerVolume {
    fn set_level(&mut self, percent: u8) -> Result<()> {
        let pct = percent.min(100);
        let out = Command::new("amixer")
            .args(["-q", "set", "Master", &format!("{}%", pct)])
            .output()
            .context("spawn amixer")?;
        if out.status.success() {
            Ok(())
        } else {
            Err(anyhow!(
                "amixer exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            ))
        }
    }
}

/// Plays a sound file via `aplay`, best effort. A missing player or
/// file keeps alerts silent, nothing more.
#[derive(Debug, Clone)]
pub struct AplayCue {
    path: PathBuf,
}

impl AplayCue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AlertCue for AplayCue {
    fn play(&mut self) {
        let _ = Command::new("aplay").arg("-q").arg(&self.path).spawn();
    }
}

/// Inert implementations for headless runs and tests.
#[derive(Debug, Default)]
pub struct NullActuator;

impl VolumeActuator for NullActuator {
    fn set_level(&mut self, _percent: u8) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NullCue;

impl AlertCue for NullCue {
    fn play(&mut self) {}
}
