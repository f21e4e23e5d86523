//! Structured logging for decode telemetry, frame events, and trunking
//! state transitions.

use crate::config::{LogFormat, LogTarget, LoggingConfig};
use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Structured log event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    /// DSP pipeline telemetry sample.
    Telemetry(TelemetryEvent),

    /// Frame decode event.
    FrameDecode(FrameDecodeEvent),

    /// P25 trunking state transition.
    TrunkState(TrunkStateEvent),

    /// Statistical summary event, logged once at the end of a run.
    Statistics(StatisticsEvent),

    /// General info message.
    Info { message: String },

    /// Warning message.
    Warn { message: String },

    /// Error message.
    Error { message: String, details: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub timestamp: DateTime<Utc>,
    pub cfo_hz: f64,
    pub snr_db: f64,
    pub carrier_locked: bool,
    pub symbols_decoded: usize,
    pub frames_decoded: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDecodeEvent {
    pub timestamp: DateTime<Utc>,
    pub frame_index: usize,
    pub hex_dump: FrameHexDump,
    pub decoded: DecodedFrame,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameHexDump {
    pub protocol: String,
    pub slot: String,
    pub bits_corrected: u32,
    pub crc_ok: bool,
    pub payload_hex: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedFrame {
    pub kind: String,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrunkStateEvent {
    pub timestamp: DateTime<Utc>,
    pub from: String,
    pub to: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsEvent {
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    pub cfo_hz: StatSummary,
    pub snr_db: StatSummary,
    pub total_frames: usize,
    pub total_symbols: usize,
    pub fec_ok: u64,
    pub fec_err: u64,
    pub fec_corrected: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatSummary {
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    pub samples: usize,
}

/// Logger that renders structured log events in one of three formats.
pub struct StructuredLogger {
    config: LoggingConfig,
    writer: Box<dyn Write + Send>,
    start_time: DateTime<Utc>,
}

impl StructuredLogger {
    pub fn new(config: LoggingConfig) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match &config.target {
            LogTarget::Stdout => Box::new(io::stdout()),
            LogTarget::Stderr => Box::new(io::stderr()),
            LogTarget::File => {
                let path = config.file_path.as_ref().ok_or_else(|| color_eyre::eyre::eyre!("File path required for file logging"))?;
                Box::new(BufWriter::new(File::create(path)?))
            }
        };

        Ok(Self { config, writer, start_time: Utc::now() })
    }

    pub fn log(&mut self, event: LogEvent) -> Result<()> {
        let output = match self.config.format {
            LogFormat::Json => self.format_json(&event)?,
            LogFormat::Logfmt => self.format_logfmt(&event)?,
            LogFormat::Pretty => self.format_pretty(&event)?,
        };

        writeln!(self.writer, "{}", output)?;
        self.writer.flush()?;

        Ok(())
    }

    fn format_json(&self, event: &LogEvent) -> Result<String> {
        Ok(serde_json::to_string(event)?)
    }

    fn format_logfmt(&self, event: &LogEvent) -> Result<String> {
        let ts = Utc::now().to_rfc3339();

        let msg = match event {
            LogEvent::Telemetry(t) => format!(
                "ts=\"{}\" type=telemetry cfo_hz={:.2} snr_db={:.2} carrier_locked={} symbols={} frames={}",
                ts, t.cfo_hz, t.snr_db, t.carrier_locked, t.symbols_decoded, t.frames_decoded
            ),
            LogEvent::FrameDecode(f) => format!(
                "ts=\"{}\" type=frame_decode frame={} protocol=\"{}\" slot=\"{}\" kind=\"{}\" crc_ok={}",
                ts, f.frame_index, f.hex_dump.protocol, f.hex_dump.slot, f.decoded.kind, f.hex_dump.crc_ok
            ),
            LogEvent::TrunkState(s) => format!("ts=\"{}\" type=trunk_state from=\"{}\" to=\"{}\" reason=\"{}\"", ts, s.from, s.to, s.reason),
            LogEvent::Statistics(s) => format!(
                "ts=\"{}\" type=statistics duration_secs={:.2} total_frames={} total_symbols={} fec_ok={} fec_err={} cfo_mean={:.2}",
                ts, s.duration_secs, s.total_frames, s.total_symbols, s.fec_ok, s.fec_err, s.cfo_hz.mean
            ),
            LogEvent::Info { message } => format!("ts=\"{}\" level=info msg=\"{}\"", ts, message),
            LogEvent::Warn { message } => format!("ts=\"{}\" level=warn msg=\"{}\"", ts, message),
            LogEvent::Error { message, details } => {
                if let Some(d) = details {
                    format!("ts=\"{}\" level=error msg=\"{}\" details=\"{}\"", ts, message, d)
                } else {
                    format!("ts=\"{}\" level=error msg=\"{}\"", ts, message)
                }
            }
        };

        Ok(msg)
    }

    fn format_pretty(&self, event: &LogEvent) -> Result<String> {
        let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");

        let msg = match event {
            LogEvent::Telemetry(t) => format!(
                "[{}] TELEMETRY: CFO={:.2}Hz SNR={:.2}dB | Symbols={} Frames={} | Carrier={}",
                ts,
                t.cfo_hz,
                t.snr_db,
                t.symbols_decoded,
                t.frames_decoded,
                if t.carrier_locked { "LOCKED" } else { "SEARCHING" }
            ),
            LogEvent::FrameDecode(f) => {
                format!("[{}] FRAME[{}]: {} slot={} | {} | {}", ts, f.frame_index, f.hex_dump.protocol, f.hex_dump.slot, f.decoded.kind, f.decoded.summary)
            }
            LogEvent::TrunkState(s) => format!("[{}] TRUNK: {} -> {} ({})", ts, s.from, s.to, s.reason),
            LogEvent::Statistics(s) => format!(
                "[{}] STATISTICS ({:.2}s): Frames={} Symbols={} | FEC ok={} err={} corrected={} | CFO: μ={:.2} σ={:.2} [{:.2},{:.2}]",
                ts, s.duration_secs, s.total_frames, s.total_symbols, s.fec_ok, s.fec_err, s.fec_corrected, s.cfo_hz.mean, s.cfo_hz.stddev, s.cfo_hz.min, s.cfo_hz.max
            ),
            LogEvent::Info { message } => format!("[{}] INFO: {}", ts, message),
            LogEvent::Warn { message } => format!("[{}] WARN: {}", ts, message),
            LogEvent::Error { message, details } => {
                if let Some(d) = details {
                    format!("[{}] ERROR: {} | {}", ts, message, d)
                } else {
                    format!("[{}] ERROR: {}", ts, message)
                }
            }
        };

        Ok(msg)
    }

    pub fn elapsed(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
