//! Stage 1: impulse blanker (§4.1). Zeros a symmetric window around any
//! sample whose magnitude exceeds a threshold, ahead of decimation.

use num_complex::Complex64;

#[derive(Debug, Clone)]
pub struct ImpulseBlanker {
    threshold: f64,
    window: usize,
    accepts: u64,
    rejects: u64,
}

impl ImpulseBlanker {
    pub fn new(threshold: f64, window: usize) -> Self {
        Self { threshold, window, accepts: 0, rejects: 0 }
    }

    pub fn process(&mut self, samples: &mut [Complex64]) {
        let half = self.window / 2;
        let mut blanked = vec![false; samples.len()];
        for i in 0..samples.len() {
            if samples[i].norm() > self.threshold {
                let lo = i.saturating_sub(half);
                let hi = (i + half + 1).min(samples.len());
                for b in &mut blanked[lo..hi] {
                    *b = true;
                }
            }
        }
        for (i, sample) in samples.iter_mut().enumerate() {
            if blanked[i] {
                *sample = Complex64::new(0.0, 0.0);
                self.rejects += 1;
            } else {
                self.accepts += 1;
            }
        }
    }

    pub fn accepts(&self) -> u64 {
        self.accepts
    }

    pub fn rejects(&self) -> u64 {
        self.rejects
    }

    /// Impulse-blanker statistics survive a retune (§4.1: "must NOT reset
    /// impulse-blanker statistics"); `reset_stats` is a distinct, rarely
    /// called operation.
    pub fn reset_stats(&mut self) {
        self.accepts = 0;
        self.rejects = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blanks_symmetric_window_around_spike() {
        let mut blanker = ImpulseBlanker::new(2.0, 4);
        let mut samples = vec![Complex64::new(0.1, 0.0); 10];
        samples[5] = Complex64::new(5.0, 0.0);
        blanker.process(&mut samples);
        assert_eq!(samples[5], Complex64::new(0.0, 0.0));
        assert_eq!(samples[3], Complex64::new(0.0, 0.0));
        assert_eq!(samples[7], Complex64::new(0.0, 0.0));
        assert_ne!(samples[0], Complex64::new(0.0, 0.0));
        assert_eq!(blanker.rejects(), 4);
    }

    #[test]
    fn retune_does_not_clear_statistics() {
        let mut blanker = ImpulseBlanker::new(2.0, 2);
        let mut samples = vec![Complex64::new(5.0, 0.0); 4];
        blanker.process(&mut samples);
        assert!(blanker.rejects() > 0);
        let rejects_before = blanker.rejects();
        // A retune only resets carrier/timing/equaliser state, not this.
        assert_eq!(blanker.rejects(), rejects_before);
    }
}
