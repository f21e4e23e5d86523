//! Error taxonomy for the decoder core.
//!
//! Per-symbol and per-frame failures (bad FEC syndromes, CRC mismatches, lost
//! sync) are always local: they increment a counter and leave the affected
//! frame marked invalid, never propagate. Only IO, configuration, and tuning
//! failures cross a `Result` boundary.

use thiserror::Error;

/// Top-level error type for all core operations that can fail synchronously.
#[derive(Debug, Error)]
pub enum LmrError {
    #[error("I/O failure: {0}")]
    Io(#[from] IoError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("tune failure: {0}")]
    Tune(#[from] TuneError),

    #[error("DSP pipeline error: {0}")]
    Dsp(#[from] DspError),
}

/// Result alias for fallible core operations.
pub type Result<T> = std::result::Result<T, LmrError>;

/// IO-layer failures: opening an IQ source, starting an audio sink, binding a
/// control socket. Always propagated to the caller.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to open IQ source: {reason}")]
    IqSourceOpen { reason: String },

    #[error("failed to start IQ source streaming: {reason}")]
    IqSourceStart { reason: String },

    #[error("failed to open audio sink at {rate_hz} Hz / {channels}ch: {reason}")]
    AudioSinkOpen {
        rate_hz: u32,
        channels: u8,
        reason: String,
    },

    #[error("failed to bind remote-control socket on port {port}: {reason}")]
    ControlSocketBind { port: u16, reason: String },

    #[error("failed to open cache file {path}: {reason}")]
    CacheFile { path: String, reason: String },
}

/// Decode-layer failures. These are never propagated as `Result` errors in
/// the hot path -- they are recorded in a `DecodeOutcome` and counted. The
/// enum exists so callers that *do* want to inspect failures (tests, the CLI
/// summary) have a typed value instead of a string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no valid sync for {symbols_searched} symbols")]
    SyncLost { symbols_searched: usize },

    #[error("FEC[{code}] could not correct the span (irrecoverable={irrecoverable})")]
    Fec { code: &'static str, irrecoverable: bool },

    #[error("CRC mismatch at layer {layer}")]
    CrcMismatch { layer: &'static str },

    #[error("malformed frame: {reason}")]
    MalformedFrame { reason: String },
}

/// Configuration errors: surfaced synchronously, never accepted partially.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid sample rate: {rate} Hz (must be > 0)")]
    InvalidSampleRate { rate: f64 },

    #[error("decimation {decim} does not evenly divide block length {len}")]
    DecimationMismatch { decim: usize, len: usize },

    #[error("invalid symbol rate: {rate} (must be > 0)")]
    InvalidSymbolRate { rate: usize },

    #[error("RRC span {span} symbols out of range [3,16]")]
    InvalidRrcSpan { span: usize },

    #[error("RRC rolloff {alpha_percent} out of range [1,100]")]
    InvalidRrcRolloff { alpha_percent: u8 },

    #[error("invalid frame layout: {reason}")]
    InvalidFrameLayout { reason: String },

    #[error("stage '{stage}' failed to initialise with parameter {parameter}")]
    StageInit { stage: &'static str, parameter: String },

    #[error("unknown identifier {id} in IDEN table")]
    UnknownIden { id: u8 },
}

/// DSP-layer initialisation/runtime failures that are *not* per-sample
/// degradations (those go through metrics instead). Mirrors §4.1's failure
/// semantics: a stage that cannot initialise fails the whole pipeline init.
#[derive(Debug, Error)]
pub enum DspError {
    #[error("FFT size {size} is not a power of two")]
    InvalidFftSize { size: usize },

    #[error("filter design failed in stage '{stage}': {reason}")]
    FilterDesignFailed { stage: &'static str, reason: String },

    #[error("buffer underrun: requested {requested}, available {available}")]
    BufferUnderrun { requested: usize, available: usize },

    #[error("buffer overflow: capacity {capacity}, attempted write of {size}")]
    BufferOverflow { capacity: usize, size: usize },
}

/// Tuning failures from the IQ source. The trunking SM cools the candidate
/// down and keeps hunting; this is not fatal to the process.
#[derive(Debug, Error, Clone)]
pub enum TuneError {
    #[error("set_frequency({freq_hz}) failed: {reason}")]
    SetFrequencyFailed { freq_hz: u64, reason: String },
}
