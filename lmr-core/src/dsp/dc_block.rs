//! Stage 3: IQ DC blocker (§4.1). A leaky-integrator high-pass; shift
//! `k ∈ [6,15]` sets the pole and therefore the time constant.

use num_complex::Complex64;

#[derive(Debug, Clone, Copy)]
pub struct DcBlocker {
    pole: f64,
    last_in: Complex64,
    last_out: Complex64,
}

impl DcBlocker {
    /// `shift` is the leaky-integrator shift `k`, clamped to `[6,15]`.
    pub fn new(shift: u32) -> Self {
        let shift = shift.clamp(6, 15);
        let pole = 1.0 - 1.0 / (1u64 << shift) as f64;
        Self { pole, last_in: Complex64::new(0.0, 0.0), last_out: Complex64::new(0.0, 0.0) }
    }

    pub fn process_sample(&mut self, x: Complex64) -> Complex64 {
        let y = x - self.last_in + self.pole * self.last_out;
        self.last_in = x;
        self.last_out = y;
        y
    }

    pub fn process(&mut self, samples: &[Complex64]) -> Vec<Complex64> {
        samples.iter().map(|&s| self.process_sample(s)).collect()
    }

    pub fn reset(&mut self) {
        self.last_in = Complex64::new(0.0, 0.0);
        self.last_out = Complex64::new(0.0, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_a_constant_dc_offset() {
        let mut blocker = DcBlocker::new(10);
        let samples = vec![Complex64::new(1.0, 1.0); 2000];
        let out = blocker.process(&samples);
        let tail_avg: Complex64 = out[1500..].iter().copied().sum::<Complex64>() / 500.0;
        assert!(tail_avg.norm() < 0.05, "residual DC too large: {tail_avg}");
    }

    #[test]
    fn shift_out_of_range_is_clamped_not_panicking() {
        let blocker = DcBlocker::new(100);
        assert!(blocker.pole < 1.0);
    }
}
