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

//! Persistent settings: connection parameters, pipeline tuning, alert
//! rules, and data-logging options.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::process::{MAX_SENSITIVITY, MIN_SENSITIVITY};

pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUD: u32 = 115_200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "com_port")]
    pub port: String,
    pub baud_rate: u32,
    pub sensitivity: f64,
    pub min_threshold: f64,
    pub max_threshold: f64,
    pub auto_calibrate: bool,
    pub alert_threshold: f64,
    /// Seconds a breach must persist before the alert fires.
    pub alert_duration: f64,
    pub alert_enabled: bool,
    pub sound_alert: bool,
    pub volume_control: bool,
    pub default_volume: u8,
    pub max_volume: u8,
    pub logging_enabled: bool,
    /// Seconds between CSV log rows.
    pub logging_interval: f64,
    pub log_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD,
            sensitivity: 3.0,
            min_threshold: 0.0,
            max_threshold: 3000.0,
            auto_calibrate: true,
            alert_threshold: 80.0,
            alert_duration: 3.0,
            alert_enabled: true,
            sound_alert: true,
            volume_control: true,
            default_volume: 50,
            max_volume: 100,
            logging_enabled: false,
            logging_interval: 5.0,
            log_file: "noise_log.csv".to_string(),
        }
    }
}

pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("noisectl");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home).join(".config").join("noisectl");
    }
    PathBuf::from(".")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

pub fn load_settings() -> Option<Settings> {
    load_settings_from(&config_path())
}

pub fn load_settings_from(path: &Path) -> Option<Settings> {
    let data = fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

pub fn save_settings(settings: &Settings) -> io::Result<()> {
    save_settings_to(&config_path(), settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let json = serde_json::to_string_pretty(settings).unwrap_or_else(|_| "{}".to_string());
    fs::write(path, json)
}

pub fn validate_settings(cfg: &Settings) -> Result<(), String> {
    if cfg.port.is_empty() {
        return Err("serial port must not be empty".into());
    }
    if cfg.baud_rate == 0 {
        return Err("baud rate must be positive".into());
    }
    if !(MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&cfg.sensitivity) {
        return Err(format!(
            "sensitivity must be in {:.1}..={:.1}",
            MIN_SENSITIVITY, MAX_SENSITIVITY
        ));
    }
    if !cfg.min_threshold.is_finite() || !cfg.max_threshold.is_finite() {
        return Err("thresholds must be finite".into());
    }
    if cfg.min_threshold > cfg.max_threshold {
        return Err("min_threshold > max_threshold".into());
    }
    if !(0.0..=100.0).contains(&cfg.alert_threshold) {
        return Err("alert_threshold must be in 0..=100".into());
    }
    if !(0.0..=60.0).contains(&cfg.alert_duration) {
        return Err("alert_duration must be in 0..=60 seconds".into());
    }
    if cfg.default_volume > 100 || cfg.max_volume > 100 {
        return Err("volume percentages must be in 0..=100".into());
    }
    if !(1.0..=3600.0).contains(&cfg.logging_interval) {
        return Err("logging_interval must be in 1..=3600 seconds".into());
    }
    if cfg.log_file.is_empty() {
        return Err("log_file must not be empty".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_firmware_conventions() {
        let s = Settings::default();
        assert_eq!(s.baud_rate, 115_200);
        assert_eq!(s.sensitivity, 3.0);
        assert_eq!(s.max_threshold, 3000.0);
        assert_eq!(s.alert_threshold, 80.0);
        assert_eq!(s.alert_duration, 3.0);
        assert_eq!(s.default_volume, 50);
        assert_eq!(s.max_volume, 100);
        assert!(validate_settings(&s).is_ok());
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut s = Settings::default();
        s.port = "/dev/ttyACM1".to_string();
        s.sensitivity = 4.5;
        s.logging_enabled = true;

        save_settings_to(&path, &s).unwrap();
        let loaded = load_settings_from(&path).unwrap();
        assert_eq!(loaded, s);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let partial = r#"{ "com_port": "COM3", "sensitivity": 2.0 }"#;
        let s: Settings = serde_json::from_str(partial).unwrap();
        assert_eq!(s.port, "COM3");
        assert_eq!(s.sensitivity, 2.0);
        assert_eq!(s.baud_rate, DEFAULT_BAUD);
        assert_eq!(s.max_threshold, 3000.0);
    }

    #[test]
    fn test_port_serializes_as_com_port() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains("\"com_port\""));
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_settings_from(&dir.path().join("nope.json")).is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_settings_from(&path).is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases: Vec<Box<dyn Fn(&mut Settings)>> = vec![
            Box::new(|s| s.port.clear()),
            Box::new(|s| s.baud_rate = 0),
            Box::new(|s| s.sensitivity = 0.5),
            Box::new(|s| s.sensitivity = 6.0),
            Box::new(|s| s.min_threshold = 5000.0),
            Box::new(|s| s.max_threshold = f64::NAN),
            Box::new(|s| s.alert_threshold = 101.0),
            Box::new(|s| s.alert_duration = -1.0),
            Box::new(|s| s.logging_interval = 0.1),
            Box::new(|s| s.log_file.clear()),
        ];
        for (i, mutate) in cases.iter().enumerate() {
            let mut s = Settings::default();
            mutate(&mut s);
            assert!(validate_settings(&s).is_err(), "case {} should fail", i);
        }
    }

    #[test]
    #[serial]
    fn test_config_path_respects_xdg() {
        env::set_var("XDG_CONFIG_HOME", "/custom/config");
        let path = config_path();
        assert!(path.to_string_lossy().contains("/custom/config/noisectl/config.json"));
        env::remove_var("XDG_CONFIG_HOME");
    }

    #[test]
    #[serial]
    fn test_config_path_falls_back_to_home() {
        env::remove_var("XDG_CONFIG_HOME");
        env::set_var("HOME", "/home/testuser");
        let path = config_path();
        assert!(path.to_string_lossy().contains("/home/testuser/.config/noisectl/config.json"));
    }
}
