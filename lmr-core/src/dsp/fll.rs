//! Stage 7: FLL band-edge frequency-lock loop (§4.1), CQPSK modes, used for
//! acquisition. Designs upper/lower band-edge filters for the configured
//! samples-per-symbol and steers an NCO from their output power difference.

use num_complex::Complex64;
use std::f64::consts::PI;

fn band_edge_taps(sps: usize, edge_sign: f64) -> Vec<Complex64> {
    let n = 2 * sps + 1;
    let alpha = 0.2_f64;
    (0..n)
        .map(|i| {
            let t = i as f64 - sps as f64;
            // A root-raised-cosine-weighted complex exponential at +/- the
            // symbol-rate band edge, per §4.1's "band-edge filters".
            let phase = edge_sign * 2.0 * PI * t / (2.0 * sps as f64);
            let window = if t.abs() < 1e-9 {
                1.0
            } else {
                let denom = 1.0 - (4.0 * alpha * t / (2.0 * sps as f64)).powi(2);
                if denom.abs() < 1e-9 {
                    PI / 4.0
                } else {
                    (PI * t / (2.0 * sps as f64)).sin() / (PI * t / (2.0 * sps as f64)) / denom
                }
            };
            Complex64::from_polar(window, phase)
        })
        .collect()
}

fn fir_complex(history: &[Complex64], taps: &[Complex64]) -> Complex64 {
    history.iter().rev().zip(taps.iter()).map(|(&s, &t)| s * t).sum()
}

#[derive(Debug, Clone)]
pub struct Fll {
    upper_taps: Vec<Complex64>,
    lower_taps: Vec<Complex64>,
    history: Vec<Complex64>,
    loop_bandwidth: f64,
    alpha: f64,
    beta: f64,
    nco_phase: f64,
    nco_freq: f64,
}

impl Fll {
    /// `sps` = samples per symbol; loop bandwidth `B_L = 2*pi/(sps*350)`
    /// per §4.1.
    pub fn new(sps: usize) -> Self {
        let taps_len = 2 * sps + 1;
        let loop_bandwidth = 2.0 * PI / (sps as f64 * 350.0);
        let damping = std::f64::consts::FRAC_1_SQRT_2;
        let denom = 1.0 + 2.0 * damping * loop_bandwidth + loop_bandwidth * loop_bandwidth;
        let alpha = (4.0 * damping * loop_bandwidth) / denom;
        let beta = (4.0 * loop_bandwidth * loop_bandwidth) / denom;
        Self {
            upper_taps: band_edge_taps(sps, 1.0),
            lower_taps: band_edge_taps(sps, -1.0),
            history: vec![Complex64::new(0.0, 0.0); taps_len],
            loop_bandwidth,
            alpha,
            beta,
            nco_phase: 0.0,
            nco_freq: 0.0,
        }
    }

    pub fn loop_bandwidth(&self) -> f64 {
        self.loop_bandwidth
    }

    pub fn process_sample(&mut self, x: Complex64) -> Complex64 {
        // Rotate by the NCO before filtering, then close the loop from the
        // band-edge power difference.
        let rotated = x * Complex64::from_polar(1.0, -self.nco_phase);

        self.history.rotate_left(1);
        *self.history.last_mut().unwrap() = rotated;

        let upper = fir_complex(&self.history, &self.upper_taps);
        let lower = fir_complex(&self.history, &self.lower_taps);
        let error = upper.norm_sqr() - lower.norm_sqr();

        self.nco_freq += self.beta * error;
        self.nco_freq = self.nco_freq.clamp(-1.0, 1.0);
        self.nco_phase += self.nco_freq + self.alpha * error;
        self.nco_phase = self.nco_phase.rem_euclid(2.0 * PI);

        rotated
    }

    pub fn process(&mut self, samples: &[Complex64]) -> Vec<Complex64> {
        samples.iter().map(|&s| self.process_sample(s)).collect()
    }

    pub fn frequency(&self) -> f64 {
        self.nco_freq
    }

    /// §4.1: "`reset()` on retune".
    pub fn reset(&mut self) {
        self.nco_phase = 0.0;
        self.nco_freq = 0.0;
        for s in self.history.iter_mut() {
            *s = Complex64::new(0.0, 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Invariant 8 (§8): FLL frequency output lies in [-1, +1] rad/sample.
    #[test]
    fn frequency_output_stays_within_clamp() {
        let mut fll = Fll::new(10);
        let mut phase = 0.0;
        for _ in 0..5000 {
            phase += 1.5; // an intentionally extreme offset to stress the clamp
            let x = Complex64::from_polar(1.0, phase);
            fll.process_sample(x);
            assert!(fll.frequency() >= -1.0 && fll.frequency() <= 1.0);
        }
    }

    #[test]
    fn reset_clears_nco_state() {
        let mut fll = Fll::new(10);
        for _ in 0..200 {
            fll.process_sample(Complex64::from_polar(1.0, 0.3));
        }
        fll.reset();
        assert_eq!(fll.frequency(), 0.0);
    }
}
