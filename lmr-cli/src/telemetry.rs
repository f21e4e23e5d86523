//! Telemetry sampling and statistical aggregation over `lmr_core::metrics`
//! snapshots.

use crate::logging::{StatSummary, TelemetryEvent};
use chrono::Utc;
use std::time::Instant;

/// Accumulates DSP-pipeline telemetry samples and computes statistics.
pub struct TelemetryAggregator {
    cfo_samples: Vec<f64>,
    snr_samples: Vec<f64>,

    last_sample_time: Instant,
    total_symbols: usize,
    total_frames: usize,
    current_carrier_locked: bool,

    sample_interval_secs: f64,
}

impl TelemetryAggregator {
    pub fn new(sample_interval_secs: f64) -> Self {
        Self {
            cfo_samples: Vec::new(),
            snr_samples: Vec::new(),
            last_sample_time: Instant::now(),
            total_symbols: 0,
            total_frames: 0,
            current_carrier_locked: false,
            sample_interval_secs,
        }
    }

    /// Folds one DSP-metrics snapshot and frame count into the aggregator.
    pub fn update(&mut self, cfo_hz: f64, snr_db: f64, carrier_locked: bool, symbols_decoded: usize, frames_decoded: usize) {
        self.total_symbols += symbols_decoded;
        self.total_frames += frames_decoded;
        self.current_carrier_locked = carrier_locked;

        self.cfo_samples.push(cfo_hz);
        self.snr_samples.push(snr_db);
    }

    /// Whether the sampling interval has elapsed since the last emitted sample.
    pub fn should_sample(&self) -> bool {
        self.last_sample_time.elapsed().as_secs_f64() >= self.sample_interval_secs
    }

    /// Generates a telemetry event and resets the sampling timer.
    pub fn sample(&mut self) -> Option<TelemetryEvent> {
        if !self.should_sample() {
            return None;
        }

        let cfo_hz = self.mean(&self.cfo_samples).unwrap_or(0.0);
        let snr_db = self.mean(&self.snr_samples).unwrap_or(0.0);

        let event = TelemetryEvent {
            timestamp: Utc::now(),
            cfo_hz,
            snr_db,
            carrier_locked: self.current_carrier_locked,
            symbols_decoded: self.total_symbols,
            frames_decoded: self.total_frames,
        };

        self.last_sample_time = Instant::now();

        Some(event)
    }

    /// Computes a statistical summary for CFO and SNR across the whole run.
    pub fn compute_statistics(&self) -> (StatSummary, StatSummary) {
        (self.compute_stat_summary(&self.cfo_samples), self.compute_stat_summary(&self.snr_samples))
    }

    fn compute_stat_summary(&self, samples: &[f64]) -> StatSummary {
        if samples.is_empty() {
            return StatSummary { mean: 0.0, stddev: 0.0, min: 0.0, max: 0.0, samples: 0 };
        }

        let mean = self.mean(samples).unwrap_or(0.0);
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        let stddev = variance.sqrt();
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        StatSummary { mean, stddev, min, max, samples: samples.len() }
    }

    fn mean(&self, samples: &[f64]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn total_symbols(&self) -> usize {
        self.total_symbols
    }
}
