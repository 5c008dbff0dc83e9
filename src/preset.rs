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

//! Named tuning presets ("office", "workshop", ...), stored as a JSON
//! list next to the config file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{config_dir, Settings};

/// The subset of settings a preset carries; connection and logging
/// options stay machine-local.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetSettings {
    pub sensitivity: f64,
    pub min_threshold: f64,
    pub max_threshold: f64,
    pub alert_threshold: f64,
    pub alert_duration: f64,
    pub default_volume: u8,
    pub max_volume: u8,
}

impl PresetSettings {
    pub fn capture(settings: &Settings) -> Self {
        Self {
            sensitivity: settings.sensitivity,
            min_threshold: settings.min_threshold,
            max_threshold: settings.max_threshold,
            alert_threshold: settings.alert_threshold,
            alert_duration: settings.alert_duration,
            default_volume: settings.default_volume,
            max_volume: settings.max_volume,
        }
    }

    pub fn apply_to(&self, settings: &mut Settings) {
        settings.sensitivity = self.sensitivity;
        settings.min_threshold = self.min_threshold;
        settings.max_threshold = self.max_threshold;
        settings.alert_threshold = self.alert_threshold;
        settings.alert_duration = self.alert_duration;
        settings.default_volume = self.default_volume;
        settings.max_volume = self.max_volume;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "date_created")]
    pub created: String,
    pub settings: PresetSettings,
}

impl Preset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, settings: &Settings) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            created: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            settings: PresetSettings::capture(settings),
        }
    }
}

#[derive(Error, Debug)]
pub enum PresetError {
    #[error("preset '{0}' already exists")]
    NameTaken(String),
    #[error("preset '{0}' not found")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub fn presets_path() -> PathBuf {
    config_dir().join("presets.json")
}

/// Load the preset list. A missing or unreadable file is an empty list;
/// the in-memory state stays authoritative either way.
pub fn load_presets_from(path: &Path) -> Vec<Preset> {
    let Ok(data) = fs::read_to_string(path) else {
        return Vec::new();
    };
    serde_json::from_str(&data).unwrap_or_default()
}

pub fn save_presets_to(path: &Path, presets: &[Preset]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let json = serde_json::to_string_pretty(presets).unwrap_or_else(|_| "[]".to_string());
    fs::write(path, json)
}

pub fn find_preset<'a>(presets: &'a [Preset], name: &str) -> Option<&'a Preset> {
    presets.iter().find(|p| p.name == name)
}

/// Insert or replace by name. Replacing requires `overwrite`; the caller
/// layer is responsible for confirming that with the user first.
pub fn upsert_preset(
    presets: &mut Vec<Preset>,
    preset: Preset,
    overwrite: bool,
) -> Result<(), PresetError> {
    match presets.iter_mut().find(|p| p.name == preset.name) {
        Some(existing) => {
            if !overwrite {
                return Err(PresetError::NameTaken(preset.name));
            }
            *existing = preset;
            Ok(())
        }
        None => {
            presets.push(preset);
            Ok(())
        }
    }
}

pub fn delete_preset(presets: &mut Vec<Preset>, name: &str) -> Result<(), PresetError> {
    let before = presets.len();
    presets.retain(|p| p.name != name);
    if presets.len() == before {
        return Err(PresetError::NotFound(name.to_string()));
    }
    Ok(())
}
