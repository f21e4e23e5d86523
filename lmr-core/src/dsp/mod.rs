//! The complex-baseband DSP pipeline (§4.1): one value-type module per
//! stage, composed in fixed order by [`pipeline::Pipeline`] into the full
//! bypassable 15-stage cascade.

pub mod agc;
pub mod blanker;
pub mod carrier_lock;
pub mod costas;
pub mod dc_block;
pub mod decimate;
pub mod discriminator;
pub mod equalizer;
pub mod fll;
pub mod gardner;
pub mod iq_balance;
pub mod matched_filter;
pub mod pipeline;
pub mod post_demod;
pub mod rrc;

/// Which demodulation family a [`pipeline::Pipeline`] is configured for
/// (§4.1 `init(mode, ...)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// FM/C4FM: discriminator-based, no Costas/FLL stages engaged.
    Fm,
    /// Differential QPSK after a Costas loop (P25P2, DMR CQPSK variants).
    Cqpsk,
    /// No demodulation; IQ passes through decimation/DC-block/AGC only.
    PassThrough,
}

pub use pipeline::Pipeline;
