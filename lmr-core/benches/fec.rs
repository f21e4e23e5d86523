use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lmr_core::fec::{bch, golay, hamming, viterbi::ViterbiTrellis};

fn benchmark_hamming_10_6(c: &mut Criterion) {
    let data = [1u8, 0, 1, 1, 0, 0];
    let codeword = hamming::hamming10_6_encode(&data);
    c.bench_function("hamming10_6_decode", |b| {
        b.iter(|| hamming::hamming10_6_decode(black_box(&codeword)))
    });
}

fn benchmark_golay_24_12(c: &mut Criterion) {
    let data = [1u8, 0, 1, 1, 0, 0, 1, 0, 1, 0, 1, 1];
    let codeword = golay::golay24_12_encode(&data);
    c.bench_function("golay24_12_decode", |b| {
        b.iter(|| golay::golay24_12_decode(black_box(&codeword)))
    });
}

fn benchmark_bch_63_16(c: &mut Criterion) {
    let data = vec![1u8, 0, 1, 1, 0, 0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1];
    let codeword = bch::bch63_16_encode(&data);
    c.bench_function("bch63_16_decode", |b| {
        b.iter(|| bch::bch63_16_decode(black_box(&codeword)))
    });
}

fn benchmark_viterbi_chainback(c: &mut Criterion) {
    let mut group = c.benchmark_group("viterbi_k3_chainback");
    for len in [32usize, 64, 128, 256].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(len), len, |b, &len| {
            let mut trellis = ViterbiTrellis::k3_poly_7_5();
            for pos in 0..len {
                trellis.decode_bit(black_box(0), black_box(1), pos);
            }
            b.iter(|| trellis.chainback(len - 1, len))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_hamming_10_6,
    benchmark_golay_24_12,
    benchmark_bch_63_16,
    benchmark_viterbi_chainback
);
criterion_main!(benches);
