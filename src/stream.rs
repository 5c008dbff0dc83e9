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

//! Line-oriented access to the serial sensor stream.

use std::io::{self, Read};
use std::time::{Duration, Instant};

use serialport::SerialPort;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("stream closed by peer")]
    Closed,
}

/// A blocking, line-oriented sensor source.
///
/// `read_line` returning `Ok(None)` means "no complete line within the
/// timeout" and is not an error; the acquisition loop simply polls
/// again.
pub trait SensorStream {
    fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, StreamError>;
}

/// Production stream over a serial port.
pub struct SerialSensorStream {
    port: Box<dyn SerialPort>,
    pending: Vec<u8>,
}

impl SerialSensorStream {
    /// Open `port` at `baud`. Failure here is fatal for this connection
    /// attempt and is surfaced to the caller.
    pub fn open(port: &str, baud: u32) -> Result<Self, StreamError> {
        let port = serialport::new(port, baud)
            .timeout(Duration::from_millis(100))
            .open()?;
        Ok(Self { port, pending: Vec::new() })
    }

    fn take_line(&mut self) -> Option<String> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&line).trim().to_string())
    }
}

impl SensorStream for SerialSensorStream {
    fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, StreamError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(line) = self.take_line() {
                return Ok(Some(line));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            self.port.set_timeout(deadline - now)?;
            let mut buf = [0u8; 256];
            match self.port.read(&mut buf) {
                Ok(0) => return Err(StreamError::Closed),
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                    return Ok(None)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Names of serial ports present on the system.
pub fn available_ports() -> Result<Vec<String>, StreamError> {
    let mut names: Vec<String> = serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect();
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_error_display() {
        let io_err = StreamError::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("IO error"));
        assert!(StreamError::Closed.to_string().contains("closed"));
    }

    #[test]
    fn test_io_error_converts() {
        let e: StreamError = io::Error::new(io::ErrorKind::TimedOut, "t").into();
        assert!(matches!(e, StreamError::Io(_)));
    }

    #[test]
    fn test_open_nonexistent_port_fails() {
        let res = SerialSensorStream::open("/dev/definitely-not-a-port", 115200);
        assert!(res.is_err());
    }
}
