mod config;
mod frame_decoder;
mod logging;
mod telemetry;

use clap::Parser;
use color_eyre::eyre::{Context, Result};

use config::CliConfig;
use frame_decoder::FrameDecoder;
use lmr_core::cache::CandidateCache;
use lmr_core::config::Modulation;
use lmr_core::dsp::{Pipeline, PipelineMode};
use lmr_core::protocols::dmr::DmrFramer;
use lmr_core::protocols::dstar::DStarFramer;
use lmr_core::protocols::other::{DpmrFramer, EdacsFramer, M17Framer, NxdnFramer, ProVoiceFramer, YsfFramer};
use lmr_core::protocols::p25p1::{decode_mbt, resolve_mbt_frequencies, MbtBody, OPCODE_NETWORK_STATUS, OPCODE_RFSS_STATUS, P25P1Framer};
use lmr_core::protocols::p25p2::P25P2Framer;
use lmr_core::protocols::{Framer, Protocol};
use lmr_core::sync::SymbolSlicer;
use lmr_core::trunk::{GrantChannel, TrunkHooks, TrunkStateMachine};
use lmr_core::utils::{dibits_to_bits, pack_bits};
use logging::{LogEvent, StatisticsEvent, StructuredLogger, TrunkStateEvent};
use num_complex::Complex64;
use std::path::PathBuf;
use telemetry::TelemetryAggregator;

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-protocol LMR digital-voice/trunking decoder", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose diagnostic output
    #[arg(short, long)]
    verbose: bool,

    /// Input WAV file (overrides config terminal.input)
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,
}

/// Buffers hook callbacks so they can be drained and logged after each call
/// into the trunking state machine, rather than requiring the hooks type
/// itself to hold a mutable borrow of the logger.
#[derive(Debug, Default)]
struct CliTrunkHooks {
    events: Vec<TrunkEvent>,
}

#[derive(Debug)]
enum TrunkEvent {
    TuneVc { freq_hz: u64 },
    TuneCandidate { freq_hz: u64 },
    ReturnCc,
    StateChange { from: &'static str, to: &'static str, reason: &'static str },
}

impl TrunkHooks for CliTrunkHooks {
    fn on_tune_vc(&mut self, freq_hz: u64, _channel: Option<GrantChannel>) {
        self.events.push(TrunkEvent::TuneVc { freq_hz });
    }

    fn on_return_cc(&mut self) {
        self.events.push(TrunkEvent::ReturnCc);
    }

    fn on_state_change(&mut self, old: lmr_core::trunk::TrunkState, new: lmr_core::trunk::TrunkState, reason: &'static str) {
        self.events.push(TrunkEvent::StateChange { from: state_name(old), to: state_name(new), reason });
    }

    fn on_tune_candidate(&mut self, freq_hz: u64) {
        self.events.push(TrunkEvent::TuneCandidate { freq_hz });
    }
}

fn state_name(s: lmr_core::trunk::TrunkState) -> &'static str {
    use lmr_core::trunk::TrunkState::*;
    match s {
        Idle => "idle",
        OnCc => "on_cc",
        Tuned => "tuned",
        Hunting => "hunting",
    }
}

fn drain_trunk_events(sm: &mut TrunkStateMachine<CliTrunkHooks>, logger: &mut StructuredLogger) -> Result<()> {
    let events: Vec<TrunkEvent> = std::mem::take(&mut sm.hooks_mut().events);
    for event in events {
        match event {
            TrunkEvent::TuneVc { freq_hz } => logger.log(LogEvent::Info { message: format!("tuned voice channel at {freq_hz} Hz") })?,
            TrunkEvent::TuneCandidate { freq_hz } => logger.log(LogEvent::Info { message: format!("hunting: trying candidate {freq_hz} Hz") })?,
            TrunkEvent::ReturnCc => logger.log(LogEvent::Info { message: "returned to control channel".to_string() })?,
            TrunkEvent::StateChange { from, to, reason } => {
                logger.log(LogEvent::TrunkState(TrunkStateEvent { timestamp: chrono::Utc::now(), from: from.to_string(), to: to.to_string(), reason: reason.to_string() }))?
            }
        }
    }
    Ok(())
}

/// Reads a WAV file as a sequence of complex baseband samples. Stereo files
/// are treated as interleaved I/Q; mono files as a real-valued
/// already-demodulated stream (imaginary part zero).
fn read_wav_as_complex(path: &PathBuf) -> Result<Vec<Complex64>> {
    let mut reader = hound::WavReader::open(path).wrap_err_with(|| format!("failed to open WAV file {}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().map(|s| s.map(|v| v as f64)).collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader.samples::<i32>().map(|s| s.map(|v| v as f64 / max)).collect::<std::result::Result<_, _>>()?
        }
    };

    Ok(match spec.channels {
        1 => samples.into_iter().map(|s| Complex64::new(s, 0.0)).collect(),
        _ => lmr_core::utils::complex_from_interleaved(&samples),
    })
}

/// Maps a pipeline-emitted symbol value to its 2-bit dibit, per mode:
/// CQPSK symbols are already a dibit in `0..=3`; FM/C4FM symbols are a
/// signed level in `{-3,-1,1,3}` using the standard C4FM dibit mapping.
fn symbol_to_dibit(mode: PipelineMode, value: i8) -> u8 {
    match mode {
        PipelineMode::Cqpsk => (value & 0b11) as u8,
        _ => match value {
            3 => 0b00,
            1 => 0b01,
            -1 => 0b10,
            _ => 0b11,
        },
    }
}

fn build_framers(cfg: &CliConfig) -> Vec<Box<dyn Framer>> {
    let protocols = &cfg.runtime.protocols;
    let mut framers: Vec<Box<dyn Framer>> = Vec::new();

    if protocols.p25_phase1 {
        framers.push(Box::new(P25P1Framer::new(cfg.runtime.iden_table())));
    }
    if protocols.p25_phase2 {
        if let Some(keys) = cfg.p25p2_keys {
            let mut framer = P25P2Framer::new();
            framer.set_keys(keys.wacn, keys.sysid, keys.nac);
            framers.push(Box::new(framer));
        }
    }
    if protocols.dmr {
        framers.push(Box::new(DmrFramer::new()));
    }
    if protocols.dstar {
        framers.push(Box::new(DStarFramer::new()));
    }
    if protocols.nxdn {
        framers.push(Box::new(NxdnFramer::new()));
    }
    if protocols.ysf {
        framers.push(Box::new(YsfFramer::new()));
    }
    if protocols.dpmr {
        framers.push(Box::new(DpmrFramer::new()));
    }
    if protocols.m17 {
        framers.push(Box::new(M17Framer::new()));
    }
    if protocols.edacs {
        framers.push(Box::new(EdacsFramer::new()));
    }
    if protocols.provoice {
        framers.push(Box::new(ProVoiceFramer::new()));
    }

    framers
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let mut config = if let Some(config_path) = &args.config {
        CliConfig::from_file(config_path).wrap_err_with(|| format!("Failed to load config from {}", config_path))?
    } else {
        eprintln!("Error: --config parameter is required. Example: --config configs/p25-hwy-patrol.toml");
        std::process::exit(1);
    };

    if let Some(input) = args.input {
        config.terminal.input = Some(input);
    }

    let mut logger = StructuredLogger::new(config.terminal.logging.clone())?;

    let input_path = config.terminal.input.clone().ok_or_else(|| color_eyre::eyre::eyre!("no input WAV file given (pass --input or set terminal.input)"))?;

    logger.log(LogEvent::Info { message: format!("decoding {}", input_path.display()) })?;

    let samples = read_wav_as_complex(&input_path)?;
    logger.log(LogEvent::Info { message: format!("loaded {} complex samples", samples.len()) })?;

    let mode = match config.runtime.dsp.modulation {
        Modulation::Cqpsk => PipelineMode::Cqpsk,
        Modulation::C4fm | Modulation::Gfsk | Modulation::Fsk4 => PipelineMode::Fm,
    };

    let mut pipeline = Pipeline::init(mode, &config.runtime.dsp, config.runtime.dsp.symbol_rate as f64).wrap_err("failed to initialise DSP pipeline")?;
    let mut slicer = SymbolSlicer::new(128, 20);
    let mut framers = build_framers(&config);

    let cache = match &config.terminal.cache_dir {
        Some(dir) => CandidateCache::new(dir.clone()),
        None => CandidateCache::default_location(),
    };

    let hooks = CliTrunkHooks::default();
    let mut sm = TrunkStateMachine::new(config.runtime.trunk.clone(), config.runtime.iden_table(), hooks);

    let mut telemetry = TelemetryAggregator::new(config.terminal.telemetry_interval_secs);
    let frame_decoder = FrameDecoder::new();

    let mut clock_s = 0.0f64;
    let dt_per_symbol = 1.0 / config.runtime.dsp.symbol_rate.max(1) as f64;
    let mut frame_index = 0usize;

    for chunk in samples.chunks(config.terminal.block_len.max(1)) {
        let symbols = match pipeline.process(chunk) {
            Ok(s) => s,
            Err(e) => {
                logger.log(LogEvent::Warn { message: format!("pipeline error: {e}") })?;
                continue;
            }
        };

        let mut block_frame_count = 0usize;
        for symbol in &symbols {
            slicer.push_symbol(*symbol);
            clock_s += dt_per_symbol;

            let dibit = symbol_to_dibit(mode, symbol.value);
            let bits = dibits_to_bits(&[dibit]);
            let reliability = [symbol.reliability; 2];

            for framer in framers.iter_mut() {
                if let Some(frame) = framer.process_bits(&bits, &reliability) {
                    if frame.protocol == Protocol::P25Phase1 {
                        if let lmr_core::frame::FramePayload::TrunkingControl { opcode, payload_bits } = &frame.payload {
                            let body = decode_mbt(&pack_bits(payload_bits).into_iter().chain(std::iter::repeat(0)).take(48).collect::<Vec<_>>());
                            match (*opcode, &body) {
                                (op, MbtBody::NetworkStatus { wacn, sysid, .. }) if op == OPCODE_NETWORK_STATUS as u16 => {
                                    sm.cc_known(clock_s);
                                    let freqs = resolve_mbt_frequencies(&body, &config.runtime.iden_table());
                                    if !freqs.is_empty() {
                                        let _ = cache.merge(*wacn, *sysid, &freqs);
                                    }
                                }
                                (op, MbtBody::RfssStatus { .. }) if op == OPCODE_RFSS_STATUS as u16 => {
                                    let freqs = resolve_mbt_frequencies(&body, &config.runtime.iden_table());
                                    sm.neighbor_update(&freqs, clock_s);
                                }
                                _ => {}
                            }
                        }
                    }

                    logger.log(LogEvent::FrameDecode(frame_decoder.decode_frame(frame_index, &frame)))?;
                    frame_index += 1;
                }
            }
        }

        sm.tick(clock_s);
        drain_trunk_events(&mut sm, &mut logger)?;

        let snap = pipeline.snapshot_metrics();
        telemetry.update(snap.cfo_hz, snap.snr_db, snap.carrier_locked, symbols.len(), 0);
        if let Some(event) = telemetry.sample() {
            logger.log(LogEvent::Telemetry(event))?;
        }
    }

    let (cfo_stats, snr_stats) = telemetry.compute_statistics();
    let stats_event = StatisticsEvent {
        timestamp: chrono::Utc::now(),
        duration_secs: logger.elapsed(),
        cfo_hz: cfo_stats,
        snr_db: snr_stats,
        total_frames: frame_index,
        total_symbols: telemetry.total_symbols(),
        fec_ok: 0,
        fec_err: 0,
        fec_corrected: 0,
    };
    logger.log(LogEvent::Statistics(stats_event))?;

    if args.verbose {
        logger.log(LogEvent::Info { message: format!("final trunk state: {:?}", sm.state()) })?;
    }

    Ok(())
}
