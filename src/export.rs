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

//! CSV output: the periodic data log and one-shot history export.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use csv::Writer;

use crate::history::Sample;

pub const CSV_HEADER: [&str; 5] = [
    "Timestamp",
    "ISO DateTime",
    "Raw Noise",
    "Processed Noise",
    "Volume Level",
];

fn iso_datetime(unix_ts: f64) -> String {
    let secs = if unix_ts.is_finite() { unix_ts.max(0.0) } else { 0.0 };
    let dt: DateTime<Local> = (UNIX_EPOCH + Duration::from_secs_f64(secs)).into();
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn record(sample: &Sample) -> [String; 5] {
    [
        format!("{:.3}", sample.unix_ts),
        iso_datetime(sample.unix_ts),
        sample.raw.to_string(),
        format!("{:.2}", sample.processed),
        sample.volume.to_string(),
    ]
}

/// Append-mode CSV log. The header row is written exactly once, when
/// the file is first created.
pub struct DataLogger {
    writer: Writer<std::fs::File>,
    path: PathBuf,
}

impl DataLogger {
    pub fn open(path: &Path) -> Result<Self> {
        let is_new = !path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file {}", path.display()))?;
        let mut writer = Writer::from_writer(file);
        if is_new {
            writer.write_record(CSV_HEADER).context("write CSV header")?;
            writer.flush().context("flush CSV header")?;
        }
        Ok(Self { writer, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, sample: &Sample) -> Result<()> {
        self.writer
            .write_record(record(sample))
            .context("write CSV row")?;
        self.writer.flush().context("flush CSV row")?;
        Ok(())
    }
}

/// Write a full history snapshot, header included, replacing `path`.
pub fn export_history(path: &Path, samples: &[Sample]) -> Result<()> {
    let mut writer =
        Writer::from_path(path).with_context(|| format!("create export file {}", path.display()))?;
    writer.write_record(CSV_HEADER).context("write CSV header")?;
    for sample in samples {
        writer.write_record(record(sample)).context("write CSV row")?;
    }
    writer.flush().context("flush export")?;
    Ok(())
}
