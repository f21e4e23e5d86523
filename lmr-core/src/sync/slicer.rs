//! Symbol slicer and sync scan (§4.2). Pushes symbols into the history
//! ring, correlates against every enabled protocol's sync patterns with a
//! locality bias toward recently seen families, and warm-starts slicer
//! thresholds from an accepted sync before re-digitising the symbols that
//! preceded it.

use crate::protocols::Protocol;
use crate::ring::HistoryRing;
use crate::sync::registry::{Polarity, SyncId, SyncRegistry};
use crate::symbol::Symbol;

/// Result of [`SymbolSlicer::scan`]: the accepted sync, its polarity, and
/// the ring offset (symbols back from the most recent push) where the sync
/// pattern's last symbol landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncFound {
    pub sync: SyncId,
    pub polarity: Polarity,
    pub offset_back: usize,
    pub score: i32,
}

/// Outcome of warm-starting slicer thresholds from a sync pattern (§4.2
/// "Warm start of slicer thresholds").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmStartResult {
    Ok,
    NoHistory,
    Degenerate,
}

/// Rolling envelope thresholds used to interpret raw discriminator output
/// as symbol levels. `umid`/`lmid` bound the inner two levels; `center`
/// separates positive from negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlicerThresholds {
    pub max: f64,
    pub min: f64,
    pub center: f64,
    pub umid: f64,
    pub lmid: f64,
}

impl Default for SlicerThresholds {
    fn default() -> Self {
        Self { max: 3.0, min: -3.0, center: 0.0, umid: 1.5, lmid: -1.5 }
    }
}

const MIN_SPAN: f64 = 0.5;

/// The symbol slicer + sync scanner. Owns the symbol history ring, the
/// current threshold set, and a small "recently seen family" queue used to
/// order correlation attempts (§4.2 "locality bias").
pub struct SymbolSlicer {
    ring: HistoryRing<Symbol>,
    thresholds: SlicerThresholds,
    registry: SyncRegistry,
    locality: Vec<Protocol>,
    score_threshold: i32,
}

impl SymbolSlicer {
    pub fn new(ring_capacity: usize, score_threshold: i32) -> Self {
        assert!(ring_capacity.is_power_of_two() && ring_capacity >= 128, "symbol history ring must be a power of two >= 128 per spec");
        Self {
            ring: HistoryRing::new(ring_capacity),
            thresholds: SlicerThresholds::default(),
            registry: SyncRegistry::new(),
            locality: Vec::new(),
            score_threshold,
        }
    }

    pub fn push_symbol(&mut self, symbol: Symbol) {
        self.ring.push(symbol);
    }

    pub fn thresholds(&self) -> SlicerThresholds {
        self.thresholds
    }

    /// Correlates the most recent 8-24 ring entries against every enabled
    /// sync pattern's ideal symbol vector, protocol families most recently
    /// seen first (§4.2 "locality bias").
    pub fn scan(&mut self, window: usize, ideal_patterns: &[(SyncId, Vec<i8>)]) -> Option<SyncFound> {
        let window = window.clamp(8, 24);
        if self.ring.len() < window {
            return None;
        }
        let recent: Vec<Symbol> = self.ring.recent(window);

        let mut ordered: Vec<&(SyncId, Vec<i8>)> = ideal_patterns.iter().collect();
        ordered.sort_by_key(|(id, _)| {
            let family = id.family();
            self.locality.iter().position(|f| Some(*f) == family).unwrap_or(usize::MAX)
        });

        let mut best: Option<(SyncId, i32)> = None;
        let mut best_family: Option<Protocol> = None;
        let mut runner_up_different_family = false;

        for (id, ideal) in ordered {
            if ideal.len() != recent.len() {
                continue;
            }
            let score: i32 = recent.iter().zip(ideal.iter()).map(|(sym, &level)| {
                let agree = (sym.value as i32) * (level as i32);
                agree * sym.reliability as i32 / 255
            }).sum();

            match best {
                None => {
                    best = Some((*id, score));
                    best_family = id.family();
                }
                Some((_, best_score)) if score > best_score => {
                    if best_family.is_some() && id.family() != best_family && (best_score - score).abs() < self.score_threshold / 4 {
                        runner_up_different_family = true;
                    } else {
                        runner_up_different_family = false;
                    }
                    best = Some((*id, score));
                    best_family = id.family();
                }
                Some((_, best_score)) => {
                    if id.family() != best_family && (best_score - score).abs() < self.score_threshold / 4 {
                        runner_up_different_family = true;
                    }
                }
            }
        }

        let (id, score) = best?;
        if score < self.score_threshold || runner_up_different_family {
            return None;
        }

        if let Some(family) = id.family() {
            self.on_sync_found_locality(family);
        }

        Some(SyncFound { sync: id, polarity: id.polarity(), offset_back: 0, score })
    }

    fn on_sync_found_locality(&mut self, family: Protocol) {
        self.locality.retain(|f| *f != family);
        self.locality.insert(0, family);
        self.locality.truncate(4);
    }

    /// §4.2's threshold warm-start: given `n` ideal outer-only symbols
    /// (`+`/`-` only), compute `avg(+)`/`avg(-)`, derive `max/min/center`
    /// and the 0.625-weighted inner thresholds.
    pub fn warm_start_outer_only(&mut self, positives: &[f64], negatives: &[f64]) -> WarmStartResult {
        if positives.is_empty() || negatives.is_empty() {
            return WarmStartResult::NoHistory;
        }
        let avg_pos = positives.iter().sum::<f64>() / positives.len() as f64;
        let avg_neg = negatives.iter().sum::<f64>() / negatives.len() as f64;
        if avg_pos <= 0.0 || avg_neg >= 0.0 {
            return WarmStartResult::Degenerate;
        }
        let span = avg_pos - avg_neg;
        if span < MIN_SPAN {
            return WarmStartResult::Degenerate;
        }
        let center = (avg_pos + avg_neg) / 2.0;
        self.thresholds = SlicerThresholds {
            max: avg_pos,
            min: avg_neg,
            center,
            umid: center + 0.625 * (avg_pos - center),
            lmid: center + 0.625 * (avg_neg - center),
        };
        WarmStartResult::Ok
    }

    /// Center-only variant used for CQPSK, where both inner and outer
    /// levels occur and assuming an outer-only symbol population is not
    /// safe: only `center` is updated, `umid`/`lmid`/`max`/`min` are left
    /// untouched.
    pub fn warm_start_center_only(&mut self, samples: &[f64]) -> WarmStartResult {
        if samples.is_empty() {
            return WarmStartResult::NoHistory;
        }
        let avg = samples.iter().sum::<f64>() / samples.len() as f64;
        if samples.iter().all(|&s| s > 0.0) || samples.iter().all(|&s| s < 0.0) {
            return WarmStartResult::Degenerate;
        }
        self.thresholds.center = avg;
        WarmStartResult::Ok
    }

    /// §4.2: "optionally re-digitise up to 66 symbols preceding the sync
    /// with the corrected thresholds". Returns the re-sliced symbol values,
    /// oldest first, ready to feed into the framer ahead of the sync's own
    /// payload.
    pub fn resample_on_sync(&self, raw_values: &[f64]) -> Vec<Symbol> {
        let n = raw_values.len().min(66);
        raw_values[raw_values.len() - n..]
            .iter()
            .map(|&v| {
                let t = self.thresholds;
                let value = if v > t.umid {
                    3
                } else if v > t.center {
                    1
                } else if v > t.lmid {
                    -1
                } else {
                    -3
                };
                Symbol::ideal(value)
            })
            .collect()
    }

    pub fn reset_modulation_state(&mut self) {
        self.locality.clear();
    }

    pub fn ring_len(&self) -> usize {
        self.ring.len()
    }
}
