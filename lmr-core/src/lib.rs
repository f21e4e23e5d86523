//! Core DSP, FEC, and trunking-control library for a multi-protocol
//! land-mobile-radio decoder (P25 Phase 1/2, DMR, NXDN, D-STAR, YSF, dPMR,
//! M17, EDACS/ProVoice).
//!
//! Module layout mirrors §4's dependency order: ring/time primitives, then
//! the DSP pipeline, then the symbol-history/sync layer, then per-protocol
//! framers, then the P25 trunking state machine. `concurrency` and `cache`
//! are the ambient, cross-cutting pieces the core needs to run as a real
//! process (§5, §6) rather than a library of pure functions.

pub mod cache;
pub mod concurrency;
pub mod config;
pub mod dsp;
pub mod errors;
pub mod fec;
pub mod frame;
pub mod logging;
pub mod metrics;
pub mod protocols;
pub mod ring;
pub mod symbol;
pub mod sync;
pub mod time;
pub mod trunk;
pub mod utils;

pub use errors::{ConfigError, DecodeError, DspError, IoError, LmrError, Result, TuneError};
pub use frame::{Frame, FramePayload, Slot};
pub use symbol::Symbol;
