use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lmr_core::config::DspConfig;
use lmr_core::dsp::{Pipeline, PipelineMode};
use num_complex::Complex64;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

fn synthetic_iq(len: usize, freq_ratio: f64) -> Vec<Complex64> {
    (0..len)
        .map(|n| {
            let phase = std::f64::consts::TAU * freq_ratio * n as f64;
            Complex64::new(phase.cos(), phase.sin())
        })
        .collect()
}

/// Same tone, perturbed by seeded Gaussian noise, so the pipeline benchmark
/// exercises the AGC/DC-block/equalizer stages against a signal that isn't
/// perfectly clean.
fn noisy_synthetic_iq(len: usize, freq_ratio: f64, noise_amplitude: f64) -> Vec<Complex64> {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
    synthetic_iq(len, freq_ratio)
        .into_iter()
        .map(|s| {
            let dn: f64 = StandardNormal.sample(&mut rng);
            let di: f64 = StandardNormal.sample(&mut rng);
            s + Complex64::new(dn, di) * noise_amplitude
        })
        .collect()
}

fn benchmark_fm_pipeline(c: &mut Criterion) {
    let cfg = DspConfig::p25_phase1();
    let samples = synthetic_iq(4800, 0.01);

    let mut group = c.benchmark_group("pipeline_fm");
    for block_len in [120usize, 480, 960].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(block_len), block_len, |b, &block_len| {
            let mut pipeline = Pipeline::init(PipelineMode::Fm, &cfg, 12_500.0).expect("init");
            b.iter(|| {
                for chunk in samples.chunks(block_len) {
                    let _ = black_box(pipeline.process(black_box(chunk)));
                }
            })
        });
    }
    group.finish();
}

fn benchmark_cqpsk_pipeline(c: &mut Criterion) {
    let mut cfg = DspConfig::p25_phase1();
    cfg.modulation = lmr_core::config::Modulation::Cqpsk;
    let samples = synthetic_iq(4800, 0.015);

    c.bench_function("pipeline_cqpsk_960", |b| {
        let mut pipeline = Pipeline::init(PipelineMode::Cqpsk, &cfg, 12_500.0).expect("init");
        b.iter(|| {
            for chunk in samples.chunks(960) {
                let _ = black_box(pipeline.process(black_box(chunk)));
            }
        })
    });
}

fn benchmark_fm_pipeline_noisy(c: &mut Criterion) {
    let cfg = DspConfig::p25_phase1();
    let samples = noisy_synthetic_iq(4800, 0.01, 0.05);

    c.bench_function("pipeline_fm_960_noisy", |b| {
        let mut pipeline = Pipeline::init(PipelineMode::Fm, &cfg, 12_500.0).expect("init");
        b.iter(|| {
            for chunk in samples.chunks(960) {
                let _ = black_box(pipeline.process(black_box(chunk)));
            }
        })
    });
}

criterion_group!(benches, benchmark_fm_pipeline, benchmark_cqpsk_pipeline, benchmark_fm_pipeline_noisy);
criterion_main!(benches);
