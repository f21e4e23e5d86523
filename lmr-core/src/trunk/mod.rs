//! The P25 trunking state machine (§4.5): a 4-state follower (IDLE, ON_CC,
//! TUNED, HUNTING) with hangtime, grant timeout, candidate cooldown,
//! neighbour tracking, encryption lockout, and per-slot audio gating for
//! TDMA. `tick()` is non-blocking and side-effect-free except for emitting
//! callbacks, per §5's suspension-point rules; all collaboration with the
//! IQ source goes through the injected [`TrunkHooks`] (§9's replacement
//! for void-pointer callbacks).

use crate::config::TrunkConfig;
use crate::protocols::iden::IdenTable;

/// The follower's state (§4.5 diagram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrunkState {
    Idle,
    OnCc,
    Tuned,
    Hunting,
}

/// Where a grant's logical channel number resolves a frequency from:
/// directly, or via the IDEN table (§3 "Channel-identifier table").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantChannel {
    Iden { id: u8, channel: u16 },
    Frequency(u64),
}

/// Per-slot follower state (§3 "Trunking SM context"): `voice_active` and
/// `audio_allowed` are distinct so an ENC-muted slot can still be "active"
/// for release-gating purposes while its audio is suppressed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SlotState {
    pub voice_active: bool,
    pub audio_allowed: bool,
    pub enc_pending: bool,
    ever_active: bool,
    last_mac_active_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    freq: u64,
    cooldown_until: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Neighbour {
    freq: u64,
    last_seen_s: f64,
}

/// Collaborator interface the SM calls out to (§4.5 "Observable
/// callbacks", §9's `TrunkHooks`). `on_tune_candidate` is this crate's own
/// addition alongside the named voice-channel tune/return/state-change
/// callbacks: a follower that hunts candidates silently can't be tested or
/// driven by a real IQ source.
pub trait TrunkHooks {
    fn on_tune_vc(&mut self, freq_hz: u64, channel: Option<GrantChannel>);
    fn on_return_cc(&mut self);
    fn on_state_change(&mut self, old: TrunkState, new: TrunkState, reason: &'static str);
    fn on_tune_candidate(&mut self, _freq_hz: u64) {}
}

/// A `TrunkHooks` implementation that records every callback, for tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingHooks {
    pub tunes: Vec<u64>,
    pub returns: u32,
    pub state_changes: Vec<(TrunkState, TrunkState, &'static str)>,
    pub candidate_tunes: Vec<u64>,
}

impl TrunkHooks for RecordingHooks {
    fn on_tune_vc(&mut self, freq_hz: u64, _channel: Option<GrantChannel>) {
        self.tunes.push(freq_hz);
    }
    fn on_return_cc(&mut self) {
        self.returns += 1;
    }
    fn on_state_change(&mut self, old: TrunkState, new: TrunkState, reason: &'static str) {
        self.state_changes.push((old, new, reason));
    }
    fn on_tune_candidate(&mut self, freq_hz: u64) {
        self.candidate_tunes.push(freq_hz);
    }
}

pub struct TrunkStateMachine<H: TrunkHooks> {
    cfg: TrunkConfig,
    iden: IdenTable,
    hooks: H,
    state: TrunkState,
    vc_freq: Option<u64>,
    active_slot: usize,
    slots: [SlotState; 2],
    t_last_tune: f64,
    t_last_vc_sync: f64,
    last_return_freq: Option<u64>,
    t_last_return: Option<f64>,
    candidates: Vec<Candidate>,
    candidate_idx: usize,
    hunting_since: Option<f64>,
    neighbours: Vec<Neighbour>,
    tune_count: u64,
    release_count: u64,
    rejected_grants: u64,
}

impl<H: TrunkHooks> TrunkStateMachine<H> {
    pub fn new(cfg: TrunkConfig, iden: IdenTable, hooks: H) -> Self {
        Self {
            cfg,
            iden,
            hooks,
            state: TrunkState::Idle,
            vc_freq: None,
            active_slot: 0,
            slots: [SlotState::default(); 2],
            t_last_tune: f64::NEG_INFINITY,
            t_last_vc_sync: f64::NEG_INFINITY,
            last_return_freq: None,
            t_last_return: None,
            candidates: Vec::new(),
            candidate_idx: 0,
            hunting_since: None,
            neighbours: Vec::new(),
            tune_count: 0,
            release_count: 0,
            rejected_grants: 0,
        }
    }

    pub fn state(&self) -> TrunkState {
        self.state
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn slot(&self, slot: usize) -> SlotState {
        self.slots[slot]
    }

    pub fn rejected_grants(&self) -> u64 {
        self.rejected_grants
    }

    /// Invariant 6 (§8): `tune_count - release_count in {0, 1}` at all times.
    pub fn tune_release_balance(&self) -> i64 {
        self.tune_count as i64 - self.release_count as i64
    }

    pub fn set_candidates(&mut self, freqs: &[u64]) {
        self.candidates = freqs.iter().map(|&freq| Candidate { freq, cooldown_until: None }).collect();
        self.candidate_idx = 0;
    }

    /// IDLE -(cc_known)-> ON_CC: the follower has acquired the control
    /// channel for the first time (or after a HUNTING cycle lands back on
    /// one, see [`Self::cc_found`]).
    pub fn cc_known(&mut self, now: f64) {
        if self.state == TrunkState::Idle {
            self.transition(TrunkState::OnCc, "cc_known", now);
        }
    }

    /// HUNTING -> ON_CC: a CC sync was observed on the current candidate.
    pub fn cc_found(&mut self, now: f64) {
        if self.state == TrunkState::Hunting {
            self.hunting_since = None;
            self.transition(TrunkState::OnCc, "cc_found", now);
        }
    }

    /// Losing CC sync while sitting on the control channel drives the SM
    /// into HUNTING; losing sync on a voice channel is handled by the
    /// ordinary hangtime/grant-timeout gates in [`Self::tick`].
    pub fn nosync(&mut self, now: f64) {
        if self.state == TrunkState::OnCc {
            self.enter_hunting(now, "nosync");
        }
    }

    /// §4.5 "Grant handling". Returns `true` if the grant was accepted and
    /// a tune was (or had already been) issued.
    pub fn grant(&mut self, channel: GrantChannel, encrypted: bool, now: f64) -> bool {
        let freq = match channel {
            GrantChannel::Frequency(f) => Some(f),
            GrantChannel::Iden { id, channel } => self.iden.frequency_hz(id, channel),
        };
        let Some(freq) = freq else {
            self.rejected_grants += 1;
            return false;
        };

        // Idempotence (§4.5 "Tuning and slot selection are idempotent"):
        // a repeat grant for the frequency we're already on is a no-op.
        if self.state == TrunkState::Tuned {
            if self.vc_freq == Some(freq) {
                return true;
            }
            // Never tunes again while already TUNED except via an
            // explicit release (§3's invariant).
            self.rejected_grants += 1;
            return false;
        }

        if self.state != TrunkState::OnCc && self.state != TrunkState::Hunting {
            self.rejected_grants += 1;
            return false;
        }

        if encrypted && !self.cfg.allow_encrypted {
            self.rejected_grants += 1;
            return false;
        }

        if self.last_return_freq == Some(freq) {
            if let Some(t_return) = self.t_last_return {
                if now - t_return < self.cfg.retune_backoff_s {
                    self.rejected_grants += 1;
                    return false;
                }
            }
        }

        let tdma_slot = match channel {
            GrantChannel::Iden { id, channel } => self.iden.get(id).and_then(|e| e.tdma_slot(channel)),
            GrantChannel::Frequency(_) => None,
        };

        self.hooks.on_tune_vc(freq, Some(channel));
        self.vc_freq = Some(freq);
        self.active_slot = tdma_slot.unwrap_or(0) as usize;
        self.t_last_tune = now;
        self.t_last_vc_sync = now;
        self.slots = [SlotState::default(); 2];
        self.tune_count += 1;
        self.transition(TrunkState::Tuned, "grant", now);
        true
    }

    /// A VC sync (any valid frame on the tuned voice channel) refreshes
    /// the hangtime clock regardless of slot activity.
    pub fn vc_sync(&mut self, now: f64) {
        self.t_last_vc_sync = now;
    }

    pub fn ptt(&mut self, slot: usize, now: f64) {
        self.mark_active(slot, now);
    }

    pub fn active(&mut self, slot: usize, now: f64) {
        self.mark_active(slot, now);
    }

    fn mark_active(&mut self, slot: usize, now: f64) {
        if self.state != TrunkState::Tuned {
            return;
        }
        self.slots[slot].voice_active = true;
        self.slots[slot].ever_active = true;
        if !self.slots[slot].enc_pending {
            self.slots[slot].audio_allowed = true;
        }
        self.slots[slot].last_mac_active_s = now;
        self.t_last_vc_sync = now;
    }

    /// A MAC_END_PTT/MAC_IDLE event for `slot`; per-slot isolation means a
    /// frame on one slot must never clear the other's state (§3 invariant).
    pub fn end(&mut self, slot: usize, now: f64) {
        if self.state != TrunkState::Tuned {
            return;
        }
        self.slots[slot].voice_active = false;
        self.slots[slot].audio_allowed = false;
        self.slots[slot].last_mac_active_s = now;
    }

    pub fn idle_event(&mut self, slot: usize, now: f64) {
        self.end(slot, now);
    }

    /// §4.5 "ENC lockout". `slot` is the slot on which an encrypted
    /// indicator just arrived.
    pub fn enc_indicator(&mut self, slot: usize, now: f64) {
        if self.state != TrunkState::Tuned || self.cfg.allow_encrypted {
            return;
        }
        let other = 1 - slot;
        if self.slots[other].audio_allowed {
            self.slots[slot].audio_allowed = false;
            self.slots[slot].enc_pending = true;
        } else {
            self.forced_release(now, "enc_lockout");
        }
    }

    pub fn forced_release_event(&mut self, now: f64) {
        self.forced_release(now, "forced_release");
    }

    fn forced_release(&mut self, now: f64, reason: &'static str) {
        if self.state == TrunkState::Tuned {
            self.release(now, reason);
        }
    }

    fn release(&mut self, now: f64, reason: &'static str) {
        self.hooks.on_return_cc();
        self.release_count += 1;
        self.last_return_freq = self.vc_freq;
        self.t_last_return = Some(now);
        self.vc_freq = None;
        self.slots = [SlotState::default(); 2];
        self.transition(TrunkState::OnCc, reason, now);
    }

    /// §4.5 "NEIGHBOR_UPDATE merges into a 16-entry list keyed by
    /// frequency; duplicate entries refresh their timestamp. Entries older
    /// than 20s are swept on access." and feeds the candidate list.
    pub fn neighbor_update(&mut self, freqs: &[u64], now: f64) {
        for &freq in freqs {
            if let Some(existing) = self.neighbours.iter_mut().find(|n| n.freq == freq) {
                existing.last_seen_s = now;
            } else {
                self.neighbours.push(Neighbour { freq, last_seen_s: now });
            }
        }
        self.sweep_neighbours(now);
        self.neighbours.truncate(self.cfg.max_neighbours);
        for &freq in freqs {
            if !self.candidates.iter().any(|c| c.freq == freq) {
                self.candidates.push(Candidate { freq, cooldown_until: None });
            }
        }
    }

    fn sweep_neighbours(&mut self, now: f64) {
        self.neighbours.retain(|n| now - n.last_seen_s <= self.cfg.neighbour_sweep_interval_s);
    }

    pub fn neighbours(&self) -> Vec<u64> {
        self.neighbours.iter().map(|n| n.freq).collect()
    }

    fn enter_hunting(&mut self, now: f64, reason: &'static str) {
        self.transition(TrunkState::Hunting, reason, now);
        self.tune_next_candidate(now);
    }

    fn tune_next_candidate(&mut self, now: f64) {
        if self.candidates.is_empty() {
            self.hunting_since = Some(now);
            return;
        }
        let n = self.candidates.len();
        for step in 0..n {
            let idx = (self.candidate_idx + step) % n;
            let cooled = self.candidates[idx].cooldown_until.map(|until| now < until).unwrap_or(false);
            if !cooled {
                self.candidate_idx = idx;
                let freq = self.candidates[idx].freq;
                self.hooks.on_tune_candidate(freq);
                self.hunting_since = Some(now);
                return;
            }
        }
        // Every candidate is cooled down; wait and retry on the next tick.
        self.hunting_since = Some(now);
    }

    /// §4.5 "Candidate cooldown": called periodically; non-blocking,
    /// side-effect-free except for callbacks.
    pub fn tick(&mut self, now: f64) {
        match self.state {
            TrunkState::Tuned => self.tick_tuned(now),
            TrunkState::Hunting => self.tick_hunting(now),
            TrunkState::Idle | TrunkState::OnCc => {}
        }
        self.sweep_neighbours(now);
    }

    fn tick_tuned(&mut self, now: f64) {
        if now - self.t_last_tune < self.cfg.min_follow_dwell_s {
            return;
        }
        let any_active = self.slots.iter().any(|s| s.voice_active || s.audio_allowed);
        let mac_gate_clear = self.cfg.basic_mode
            || self.slots.iter().all(|s| now - s.last_mac_active_s > self.cfg.mac_hold_timeout_s);

        if !any_active && now - self.t_last_vc_sync > self.cfg.hangtime_s && mac_gate_clear {
            self.release(now, "hangtime");
            return;
        }

        let ever_active = self.slots.iter().any(|s| s.ever_active);
        if !ever_active && now - self.t_last_tune > self.cfg.grant_voice_timeout_s {
            self.release(now, "grant_timeout");
        }
    }

    fn tick_hunting(&mut self, now: f64) {
        if let Some(since) = self.hunting_since {
            if now - since > self.cfg.eval_s {
                if let Some(candidate) = self.candidates.get_mut(self.candidate_idx) {
                    candidate.cooldown_until = Some(now + self.cfg.candidate_cooldown_s);
                }
                self.candidate_idx = (self.candidate_idx + 1) % self.candidates.len().max(1);
                self.tune_next_candidate(now);
            }
        } else {
            self.tune_next_candidate(now);
        }
    }

    fn transition(&mut self, new: TrunkState, reason: &'static str, _now: f64) {
        let old = self.state;
        if old == new {
            return;
        }
        self.state = new;
        self.hooks.on_state_change(old, new, reason);
    }
}
