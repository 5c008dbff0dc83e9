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

use std::path::Path;
use std::sync::mpsc::sync_channel;
use std::sync::Arc;

use noisectl::actuator::{AmixerVolume, AplayCue, NullActuator, NullCue};
use noisectl::calibrate::CalibrationOutcome;
use noisectl::config::{
    config_path, load_settings, save_settings, validate_settings, Settings,
};
use noisectl::export::export_history;
use noisectl::logger;
use noisectl::monitor::{start_monitor, MonitorEvent, SharedState};
use noisectl::stream::{available_ports, SerialSensorStream};

const EVENT_QUEUE: usize = 256;

fn main() -> anyhow::Result<()> {
    // Gather args once
    let args: Vec<String> = std::env::args().collect();

    // Optional event logging next to the config file
    let logging_enabled = args.iter().any(|a| a == "--logging");
    if logging_enabled {
        logger::init_logging();
        logger::log_event("startup", serde_json::json!({
            "mode": "cli",
            "args": args,
        }));
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    // List serial ports and exit: `noisectl --list-ports`
    if args.iter().any(|a| a == "--list-ports") {
        match available_ports() {
            Ok(ports) if ports.is_empty() => println!("No serial ports found."),
            Ok(ports) => {
                for p in ports {
                    println!("{}", p);
                }
            }
            Err(e) => {
                eprintln!("list-ports error: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let mut settings = load_settings().unwrap_or_default();
    apply_overrides(&mut settings, &args);
    if let Err(e) = validate_settings(&settings) {
        eprintln!("Invalid settings: {}", e);
        std::process::exit(1);
    }

    // `noisectl save` persists the effective settings and exits
    if args.get(1).map(|s| s.as_str()) == Some("save") {
        save_settings(&settings)?;
        println!("Wrote settings to {}", config_path().display());
        return Ok(());
    }

    let calibrate = args.iter().any(|a| a == "--calibrate");
    let export_path = flag_value(&args, "--export").map(ToOwned::to_owned);

    let stream = match SerialSensorStream::open(&settings.port, settings.baud_rate) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Could not open {}: {}", settings.port, e);
            std::process::exit(1);
        }
    };

    let shared = Arc::new(SharedState::new(settings.clone()));
    let (tx, rx) = sync_channel(EVENT_QUEUE);

    let (volume, cue): (
        Box<dyn noisectl::actuator::VolumeActuator>,
        Box<dyn noisectl::actuator::AlertCue>,
    ) = if calibrate {
        // Keep the system quiet while measuring
        (Box::new(NullActuator), Box::new(NullCue))
    } else {
        (Box::new(AmixerVolume), Box::new(AplayCue::new("alert.wav")))
    };

    let handle = start_monitor(Box::new(stream), volume, cue, Arc::clone(&shared), tx);
    if calibrate {
        handle.start_calibration();
    }

    for event in rx {
        match event {
            MonitorEvent::Connected { port, baud } => {
                println!("Connected to {} at {} baud", port, baud);
            }
            MonitorEvent::Sample(s) => {
                if !calibrate {
                    println!(
                        "raw {:>5}  processed {:6.2}  volume {:>3}%",
                        s.raw, s.processed, s.volume
                    );
                }
            }
            MonitorEvent::AlertEntered(s) => {
                println!("ALERT: sustained noise at {:.1}", s.processed);
            }
            MonitorEvent::AlertExited(s) => {
                println!("alert cleared at {:.1}", s.processed);
            }
            MonitorEvent::CalibrationProgress { percent, current } => {
                println!("calibrating {:>3.0}%  level {:.0}", percent, current);
            }
            MonitorEvent::CalibrationComplete(outcome) => {
                match outcome {
                    CalibrationOutcome::Calibrated { low, high, threshold } => {
                        println!(
                            "Calibrated: range {:.0}..{:.0}, alert threshold {:.1}",
                            low, high, threshold
                        );
                        if calibrate {
                            let snapshot = shared
                                .settings
                                .lock()
                                .map(|s| s.clone())
                                .unwrap_or_default();
                            save_settings(&snapshot)?;
                            println!("Wrote settings to {}", config_path().display());
                        }
                    }
                    CalibrationOutcome::InsufficientData => {
                        eprintln!("Calibration failed: no usable readings");
                    }
                }
                if calibrate {
                    break;
                }
            }
            MonitorEvent::ConnectionError(msg) => {
                eprintln!("Connection lost: {}", msg);
            }
            MonitorEvent::Disconnected => break,
        }
    }

    if let Some(path) = export_path {
        let samples = shared.history_snapshot();
        export_history(Path::new(&path), &samples)?;
        println!("Exported {} samples to {}", samples.len(), path);
    }

    handle.stop();
    Ok(())
}

fn apply_overrides(settings: &mut Settings, args: &[String]) {
    if let Some(port) = flag_value(args, "--port") {
        settings.port = port.to_string();
    }
    if let Some(baud) = flag_value(args, "--baud") {
        match baud.parse() {
            Ok(b) => settings.baud_rate = b,
            Err(_) => {
                eprintln!("Invalid baud rate: {}", baud);
                std::process::exit(1);
            }
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn print_usage() {
    println!("Usage: noisectl [OPTIONS] [COMMAND]");
    println!();
    println!("Commands:");
    println!("  save              write the effective settings to disk and exit");
    println!();
    println!("Options:");
    println!("  --port <PATH>     serial port (default from config)");
    println!("  --baud <RATE>     baud rate (default from config)");
    println!("  --list-ports      list available serial ports and exit");
    println!("  --calibrate       run a quiet/loud calibration pass, save, exit");
    println!("  --export <FILE>   write the session history to a CSV on exit");
    println!("  --logging         append structured events to a JSON log");
    println!("  -h, --help        show this help");
}
