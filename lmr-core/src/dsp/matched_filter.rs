//! Stage 11: CQPSK matched filter (§4.1): a fixed 5-tap symmetric FIR,
//! normalised so the passband DC gain is exactly 1.0.

use num_complex::Complex64;

const RAW_TAPS: [f64; 5] = [0.05, 0.2, 0.5, 0.2, 0.05];

#[derive(Debug, Clone)]
pub struct MatchedFilter5 {
    taps: [f64; 5],
    history: [Complex64; 5],
}

impl MatchedFilter5 {
    pub fn new() -> Self {
        let sum: f64 = RAW_TAPS.iter().sum();
        let mut taps = RAW_TAPS;
        for t in taps.iter_mut() {
            *t /= sum;
        }
        Self { taps, history: [Complex64::new(0.0, 0.0); 5] }
    }

    pub fn process_sample(&mut self, x: Complex64) -> Complex64 {
        self.history.rotate_left(1);
        self.history[4] = x;
        self.history.iter().zip(self.taps.iter()).map(|(&s, &t)| s * t).sum()
    }

    pub fn process(&mut self, samples: &[Complex64]) -> Vec<Complex64> {
        samples.iter().map(|&s| self.process_sample(s)).collect()
    }

    pub fn reset(&mut self) {
        self.history = [Complex64::new(0.0, 0.0); 5];
    }
}

impl Default for MatchedFilter5 {
    fn default() -> Self {
        Self::new()
    }
}
