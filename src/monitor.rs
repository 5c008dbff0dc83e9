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

//! The acquisition loop: decode, smooth, normalize, evaluate alerts,
//! drive the actuator, record history.
//!
//! The loop thread is the sole writer of pipeline state. Consumers
//! receive events over a bounded channel with `try_send`; a full channel
//! drops the event rather than stalling acquisition.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::json;

use crate::actuator::{AlertCue, VolumeActuator};
use crate::alert::{AlertDecision, AlertMonitor, AlertTransition};
use crate::calibrate::{CalibrationOutcome, CalibrationTick, Calibrator};
use crate::config::Settings;
use crate::decode::decode_line;
use crate::export::DataLogger;
use crate::filter::SmoothingFilter;
use crate::history::{now_unix, HistoryBuffer, Sample};
use crate::logger::log_event;
use crate::process::{map_volume, process_noise};
use crate::range::RangeCalibrator;
use crate::stream::SensorStream;

/// Poll granularity of the loop; also bounds how quickly a stop request
/// takes effect.
pub const READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Recent raw entries averaged for the calibration readout.
const CALIBRATION_READOUT_WINDOW: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    Connected { port: String, baud: u32 },
    Sample(Sample),
    AlertEntered(Sample),
    AlertExited(Sample),
    CalibrationProgress { percent: f64, current: f64 },
    CalibrationComplete(CalibrationOutcome),
    ConnectionError(String),
    Disconnected,
}

/// State shared between the loop thread and its consumers. The loop is
/// the only writer; everyone else reads.
pub struct SharedState {
    pub settings: Mutex<Settings>,
    pub history: Mutex<HistoryBuffer>,
    pub calibration: Mutex<Calibrator>,
}

impl SharedState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            history: Mutex::new(HistoryBuffer::default()),
            calibration: Mutex::new(Calibrator::new()),
        }
    }

    /// Ordered copy of recent samples; never a live view.
    pub fn history_snapshot(&self) -> Vec<Sample> {
        self.history.lock().map(|h| h.snapshot()).unwrap_or_default()
    }
}

/// Per-sample pipeline state owned by the loop thread.
struct Pipeline {
    filter: SmoothingFilter,
    calibrator: RangeCalibrator,
    alert: AlertMonitor,
}

struct CycleOutcome {
    sample: Sample,
    decision: AlertDecision,
}

impl Pipeline {
    fn new(settings: &Settings) -> Self {
        Self {
            filter: SmoothingFilter::default(),
            calibrator: RangeCalibrator::new(settings.min_threshold, settings.max_threshold),
            alert: AlertMonitor::new(),
        }
    }

    fn ingest(&mut self, raw: i64, now: Instant, settings: &Settings) -> CycleOutcome {
        self.calibrator.observe(raw, settings.auto_calibrate);
        let smoothed = self.filter.push(raw);
        let processed = process_noise(smoothed, self.calibrator.range(), settings.sensitivity);
        let decision = self.alert.evaluate(
            processed,
            settings.alert_threshold,
            Duration::from_secs_f64(settings.alert_duration.max(0.0)),
            now,
            settings.alert_enabled,
        );
        let volume = map_volume(processed, settings.max_volume);
        let sample = Sample { unix_ts: now_unix(), raw, processed, volume };
        CycleOutcome { sample, decision }
    }
}

/// Handle to a running acquisition loop. Dropping without `stop` leaves
/// the thread running until its stream fails.
pub struct MonitorHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    shared: Arc<SharedState>,
}

impl MonitorHandle {
    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }

    pub fn start_calibration(&self) {
        if let Ok(mut cal) = self.shared.calibration.lock() {
            cal.begin(Instant::now());
        }
    }

    pub fn cancel_calibration(&self) {
        if let Ok(mut cal) = self.shared.calibration.lock() {
            cal.cancel();
        }
    }

    /// Signal the loop and wait for it to wind down. The loop observes
    /// the flag within one read timeout.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Spawn the acquisition loop over an already-open stream.
///
/// Opening the stream is the caller's job so that connection failures
/// surface synchronously instead of as a dead thread.
pub fn start_monitor(
    mut stream: Box<dyn SensorStream + Send>,
    mut actuator: Box<dyn VolumeActuator>,
    mut cue: Box<dyn AlertCue>,
    shared: Arc<SharedState>,
    events: SyncSender<MonitorEvent>,
) -> MonitorHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    let thread_shared = Arc::clone(&shared);

    let thread = thread::spawn(move || {
        run_loop(
            stream.as_mut(),
            actuator.as_mut(),
            cue.as_mut(),
            &thread_shared,
            &events,
            &stop_flag,
        );
    });

    MonitorHandle { stop, thread: Some(thread), shared }
}

fn run_loop(
    stream: &mut dyn SensorStream,
    actuator: &mut dyn VolumeActuator,
    cue: &mut dyn AlertCue,
    shared: &SharedState,
    events: &SyncSender<MonitorEvent>,
    stop: &AtomicBool,
) {
    let startup = match shared.settings.lock() {
        Ok(s) => s.clone(),
        Err(_) => return,
    };

    let _ = events.try_send(MonitorEvent::Connected {
        port: startup.port.clone(),
        baud: startup.baud_rate,
    });
    log_event("connected", json!({ "port": &startup.port, "baud": startup.baud_rate }));

    if startup.volume_control {
        if let Err(e) = actuator.set_level(startup.default_volume) {
            log_event("volume_error", json!({ "error": e.to_string() }));
        }
    }

    let mut pipeline = Pipeline::new(&startup);
    let mut data_log: Option<DataLogger> = None;
    let mut last_log = Instant::now();

    while !stop.load(Ordering::Relaxed) {
        let line = match stream.read_line(READ_TIMEOUT) {
            Ok(line) => line,
            Err(e) => {
                let msg = e.to_string();
                log_event("connection_error", json!({ "error": msg }));
                let _ = events.try_send(MonitorEvent::ConnectionError(msg));
                break;
            }
        };

        let now = Instant::now();
        let settings = match shared.settings.lock() {
            Ok(s) => s.clone(),
            Err(_) => break,
        };

        let mut accepted_raw = None;
        if let Some(raw) = line.as_deref().and_then(decode_line) {
            accepted_raw = Some(raw);
            let outcome = pipeline.ingest(raw, now, &settings);

            // Keep the persisted thresholds in step with learned bounds
            if settings.auto_calibrate {
                let range = pipeline.calibrator.range();
                if let Ok(mut s) = shared.settings.lock() {
                    s.min_threshold = range.low;
                    s.max_threshold = range.high;
                }
            }

            match outcome.decision.transition {
                AlertTransition::Entered => {
                    log_event(
                        "alert_entered",
                        json!({ "processed": outcome.sample.processed, "threshold": settings.alert_threshold }),
                    );
                    if settings.sound_alert {
                        cue.play();
                    }
                    let _ = events.try_send(MonitorEvent::AlertEntered(outcome.sample));
                }
                AlertTransition::Exited => {
                    log_event(
                        "alert_exited",
                        json!({ "processed": outcome.sample.processed, "threshold": settings.alert_threshold }),
                    );
                    let _ = events.try_send(MonitorEvent::AlertExited(outcome.sample));
                }
                AlertTransition::None => {}
            }

            // Volume writes are best-effort and skipped on the cycle an
            // alert fires
            if settings.volume_control && outcome.decision.transition != AlertTransition::Entered {
                if let Err(e) = actuator.set_level(outcome.sample.volume) {
                    log_event("volume_error", json!({ "error": e.to_string() }));
                }
            }

            if let Ok(mut history) = shared.history.lock() {
                history.push(outcome.sample);
            }
            let _ = events.try_send(MonitorEvent::Sample(outcome.sample));

            if settings.logging_enabled
                && now.duration_since(last_log).as_secs_f64() >= settings.logging_interval
            {
                append_data_log(&mut data_log, &settings, &outcome.sample);
                last_log = now;
            }
        }
        // Undecodable lines are dropped without comment

        service_calibration(shared, &mut pipeline, accepted_raw, now, events);
    }

    log_event("disconnected", json!({}));
    let _ = events.try_send(MonitorEvent::Disconnected);
}

fn append_data_log(data_log: &mut Option<DataLogger>, settings: &Settings, sample: &Sample) {
    let path = Path::new(&settings.log_file);
    let stale = data_log.as_ref().map(|l| l.path() != path).unwrap_or(true);
    if stale {
        match DataLogger::open(path) {
            Ok(log) => *data_log = Some(log),
            Err(e) => {
                log_event("data_log_error", json!({ "error": e.to_string() }));
                return;
            }
        }
    }
    if let Some(log) = data_log.as_mut() {
        if let Err(e) = log.append(sample) {
            log_event("data_log_error", json!({ "error": e.to_string() }));
        }
    }
}

fn service_calibration(
    shared: &SharedState,
    pipeline: &mut Pipeline,
    accepted_raw: Option<i64>,
    now: Instant,
    events: &SyncSender<MonitorEvent>,
) {
    let tick = {
        let Ok(mut cal) = shared.calibration.lock() else { return };
        if !cal.is_running() {
            return;
        }
        if let Some(raw) = accepted_raw {
            cal.feed(raw);
        }
        cal.tick(now)
    };

    match tick {
        CalibrationTick::Progress { percent, .. } => {
            let current = shared
                .history
                .lock()
                .map(|h| h.recent_raw_mean(CALIBRATION_READOUT_WINDOW))
                .unwrap_or(0.0);
            let _ = events.try_send(MonitorEvent::CalibrationProgress { percent, current });
        }
        CalibrationTick::Finished(outcome) => {
            commit_calibration(&outcome, shared, pipeline);
            let _ = events.try_send(MonitorEvent::CalibrationComplete(outcome));
        }
        CalibrationTick::Idle => {}
    }
}

/// Write a successful calibration into the live range and settings. A
/// failed run commits nothing.
fn commit_calibration(outcome: &CalibrationOutcome, shared: &SharedState, pipeline: &mut Pipeline) {
    match outcome {
        CalibrationOutcome::Calibrated { low, high, threshold } => {
            pipeline.calibrator.set_range(*low, *high);
            if let Ok(mut s) = shared.settings.lock() {
                s.min_threshold = *low;
                s.max_threshold = *high;
                s.alert_threshold = *threshold;
            }
            log_event(
                "calibration_complete",
                json!({ "low": low, "high": high, "threshold": threshold }),
            );
        }
        CalibrationOutcome::InsufficientData => {
            log_event("calibration_failed", json!({ "reason": "insufficient data" }));
        }
    }
}
