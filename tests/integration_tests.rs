/*
 * Integration tests for Noisectl
 *
 * These tests verify the interaction between different modules
 * and test the application's behavior as a whole.
 */

use std::collections::VecDeque;
use std::path::Path;
use std::sync::mpsc::sync_channel;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use noisectl::actuator::{AlertCue, NullCue, VolumeActuator};
use noisectl::calibrate::{CalibrationOutcome, CalibrationTick, Calibrator};
use noisectl::config::{
    load_settings_from, save_settings_to, validate_settings, Settings,
};
use noisectl::decode::decode_line;
use noisectl::export::{export_history, CSV_HEADER};
use noisectl::filter::SmoothingFilter;
use noisectl::history::{now_unix, HistoryBuffer, Sample};
use noisectl::monitor::{start_monitor, MonitorEvent, SharedState};
use noisectl::preset::{load_presets_from, save_presets_to, upsert_preset, Preset};
use noisectl::process::{map_volume, process_noise};
use noisectl::range::RangeCalibrator;
use noisectl::stream::{SensorStream, StreamError};

// Test utilities

struct ScriptedStream {
    lines: VecDeque<String>,
}

impl ScriptedStream {
    fn new(lines: &[&str]) -> Self {
        Self { lines: lines.iter().map(|s| s.to_string()).collect() }
    }
}

impl SensorStream for ScriptedStream {
    fn read_line(&mut self, _timeout: Duration) -> Result<Option<String>, StreamError> {
        thread::sleep(Duration::from_millis(2));
        match self.lines.pop_front() {
            Some(line) => Ok(Some(line)),
            None => Err(StreamError::Closed),
        }
    }
}

struct RecordingActuator {
    levels: Arc<Mutex<Vec<u8>>>,
}

impl VolumeActuator for RecordingActuator {
    fn set_level(&mut self, percent: u8) -> anyhow::Result<()> {
        self.levels.lock().unwrap().push(percent);
        Ok(())
    }
}

struct CountingCue {
    plays: Arc<Mutex<usize>>,
}

impl AlertCue for CountingCue {
    fn play(&mut self) {
        *self.plays.lock().unwrap() += 1;
    }
}

fn passthrough_settings() -> Settings {
    Settings {
        sensitivity: 1.0,
        min_threshold: 0.0,
        max_threshold: 100.0,
        auto_calibrate: false,
        ..Settings::default()
    }
}

fn sample(raw: i64, processed: f64, volume: u8) -> Sample {
    Sample { unix_ts: now_unix(), raw, processed, volume }
}

#[test]
fn test_decode_smooth_process_chain() {
    let mut filter = SmoothingFilter::default();
    let mut calibrator = RangeCalibrator::new(0.0, 100.0);
    let mut last = 0.0;

    for line in ["Noise Level: 40 | Volume: 10", "60", "Noise Level: 80"] {
        let raw = decode_line(line).expect("decodable line");
        calibrator.observe(raw, false);
        let smoothed = filter.push(raw);
        last = process_noise(smoothed, calibrator.range(), 1.0);
    }

    // mean of 40, 60, 80 passed through linearly
    assert!((last - 60.0).abs() < 1e-9);
    assert_eq!(map_volume(last, 100), 60);
    assert_eq!(map_volume(last, 50), 50);
}

#[test]
fn test_settings_round_trip_and_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let mut settings = Settings::default();
    settings.port = "/dev/ttyACM3".to_string();
    settings.sensitivity = 4.5;
    settings.alert_threshold = 65.0;
    assert!(validate_settings(&settings).is_ok());

    save_settings_to(&path, &settings).unwrap();
    let loaded = load_settings_from(&path).expect("settings reload");
    assert_eq!(loaded.port, "/dev/ttyACM3");
    assert_eq!(loaded.sensitivity, 4.5);
    assert_eq!(loaded.alert_threshold, 65.0);

    settings.sensitivity = 9.0;
    assert!(validate_settings(&settings).is_err());
}

#[test]
fn test_preset_capture_store_and_apply() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presets.json");

    let mut settings = passthrough_settings();
    settings.alert_threshold = 72.0;
    let preset = Preset::new("library", "quiet room profile", &settings);

    let mut presets = Vec::new();
    upsert_preset(&mut presets, preset, false).unwrap();
    save_presets_to(&path, &presets).unwrap();

    let reloaded = load_presets_from(&path);
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].name, "library");

    let mut fresh = Settings::default();
    reloaded[0].settings.apply_to(&mut fresh);
    assert_eq!(fresh.alert_threshold, 72.0);
    assert_eq!(fresh.sensitivity, 1.0);
    // Connection details are not part of a preset
    assert_eq!(fresh.port, Settings::default().port);
}

#[test]
fn test_history_export_produces_readable_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.csv");

    let mut history = HistoryBuffer::default();
    for i in 1..=5 {
        history.push(sample(i * 10, (i * 10) as f64, (i * 10) as u8));
    }
    export_history(&path, &history.snapshot()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    for col in CSV_HEADER {
        assert!(header.contains(col.trim()), "missing column {}", col);
    }
    assert_eq!(lines.count(), 5);
    assert!(text.contains("50.00"));
}

#[test]
fn test_calibration_produces_margined_range_and_threshold() {
    let start = Instant::now();
    let mut cal = Calibrator::new();
    cal.begin(start);

    // Quiet phase readings
    for raw in [10, 10, 10] {
        cal.feed(raw);
    }
    // Loud phase readings
    match cal.tick(start + Duration::from_secs(6)) {
        CalibrationTick::Progress { phase, .. } => {
            assert_eq!(phase, noisectl::calibrate::CalibrationPhase::Loud)
        }
        other => panic!("unexpected tick: {:?}", other),
    }
    for raw in [90, 90, 90] {
        cal.feed(raw);
    }

    match cal.tick(start + Duration::from_secs(11)) {
        CalibrationTick::Finished(CalibrationOutcome::Calibrated { low, high, threshold }) => {
            assert_eq!(low, 9.0);
            assert_eq!(high, 99.0);
            assert_eq!(threshold, 81.0);
        }
        other => panic!("unexpected tick: {:?}", other),
    }
}

#[test]
fn test_monitor_session_records_alert_episode() {
    let mut settings = passthrough_settings();
    settings.alert_threshold = 50.0;
    settings.alert_duration = 0.0;
    settings.sound_alert = true;

    let shared = Arc::new(SharedState::new(settings));
    let levels = Arc::new(Mutex::new(Vec::new()));
    let plays = Arc::new(Mutex::new(0));
    let (tx, rx) = sync_channel(128);

    let handle = start_monitor(
        Box::new(ScriptedStream::new(&["85", "85", "0", "0", "0", "0"])),
        Box::new(RecordingActuator { levels: Arc::clone(&levels) }),
        Box::new(CountingCue { plays: Arc::clone(&plays) }),
        Arc::clone(&shared),
        tx,
    );

    let mut entered = 0;
    let mut exited = 0;
    let mut samples = 0;
    while let Ok(ev) = rx.recv_timeout(Duration::from_secs(5)) {
        match ev {
            MonitorEvent::AlertEntered(_) => entered += 1,
            MonitorEvent::AlertExited(_) => exited += 1,
            MonitorEvent::Sample(_) => samples += 1,
            MonitorEvent::Disconnected => break,
            _ => {}
        }
    }
    handle.stop();

    assert_eq!(samples, 6);
    assert_eq!(entered, 1);
    assert_eq!(exited, 1);
    assert_eq!(*plays.lock().unwrap(), 1);

    // Every cycle writes the volume except the one that fired the alert
    let written = levels.lock().unwrap().clone();
    assert_eq!(written.first(), Some(&Settings::default().default_volume));
    assert_eq!(written.len(), 6);

    let history = shared.history_snapshot();
    assert_eq!(history.len(), 6);
    assert_eq!(history[0].raw, 85);
    assert_eq!(history[5].raw, 0);
}

#[test]
fn test_monitor_session_exports_history_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.csv");

    let shared = Arc::new(SharedState::new(passthrough_settings()));
    let (tx, rx) = sync_channel(128);
    let handle = start_monitor(
        Box::new(ScriptedStream::new(&["12", "34", "56"])),
        Box::new(noisectl::actuator::NullActuator),
        Box::new(NullCue),
        Arc::clone(&shared),
        tx,
    );
    while let Ok(ev) = rx.recv_timeout(Duration::from_secs(5)) {
        if ev == MonitorEvent::Disconnected {
            break;
        }
    }
    handle.stop();

    let samples = shared.history_snapshot();
    export_history(&path, &samples).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 4);
    let last = text.lines().last().unwrap();
    let raw_field: Vec<&str> = last.split(',').map(str::trim).collect();
    assert_eq!(raw_field[2], "56");
}

#[test]
fn test_disabled_features_keep_pipeline_running() {
    let mut settings = passthrough_settings();
    settings.alert_enabled = false;
    settings.volume_control = false;
    settings.alert_threshold = 10.0;

    let shared = Arc::new(SharedState::new(settings));
    let levels = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = sync_channel(128);
    let handle = start_monitor(
        Box::new(ScriptedStream::new(&["90", "90", "90"])),
        Box::new(RecordingActuator { levels: Arc::clone(&levels) }),
        Box::new(NullCue),
        Arc::clone(&shared),
        tx,
    );

    let mut entered = 0;
    let mut samples = 0;
    while let Ok(ev) = rx.recv_timeout(Duration::from_secs(5)) {
        match ev {
            MonitorEvent::AlertEntered(_) => entered += 1,
            MonitorEvent::Sample(_) => samples += 1,
            MonitorEvent::Disconnected => break,
            _ => {}
        }
    }
    handle.stop();

    assert_eq!(samples, 3);
    assert_eq!(entered, 0);
    assert!(levels.lock().unwrap().is_empty());
}

#[test]
fn test_export_path_is_overwritten_not_appended() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("twice.csv");

    export_history(&path, &[sample(1, 1.0, 1)]).unwrap();
    export_history(&path, &[sample(2, 2.0, 2)]).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(!text.contains("1.00"));
}

#[test]
fn test_export_accepts_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    export_history(&path, &[]).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(Path::new(&path).exists());
}
