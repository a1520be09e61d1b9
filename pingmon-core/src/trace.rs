//! The fixed-capacity traceroute hop array (C6).

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::ring::Ring;
use crate::stats::Stats;

/// Maximum number of traceroute hops tracked.
pub const TTTL: usize = 24;

/// Mutable per-tick state for one hop.
#[derive(Debug)]
pub struct HopState {
    pub ring: Ring,
    pub stats: Stats,
    /// `0.0` = no response yet this tick (the per-tick scratch reset value),
    /// `-1.0` = destination-unreachable marker, positive = RTT in ms.
    pub last_rtt_ms: f64,
    pub last_responder: Option<Ipv4Addr>,
}

impl HopState {
    fn new() -> Self {
        Self {
            ring: Ring::new(),
            stats: Stats::new(),
            last_rtt_ms: 0.0,
            last_responder: None,
        }
    }

    /// Per-tick scratch reset, run before the sender emits this hop's probe:
    /// clear `dt`/`ip` and pre-commit `Lost` into the ring.
    fn begin_tick(&mut self) {
        self.last_rtt_ms = 0.0;
        self.last_responder = None;
        if self.ring.head_is_lost() {
            self.stats.record_lost();
        }
        self.ring.shift();
    }

    /// Record an Echo Reply or Time-Exceeded response for this hop.
    pub fn record_reply(&mut self, dt_ms: f64, responder: Ipv4Addr) {
        self.last_rtt_ms = dt_ms;
        self.last_responder = Some(responder);
        self.ring.set(0, crate::outcome::encode(dt_ms));
        self.stats.update(dt_ms);
    }

    /// Record a Destination Unreachable: a marker, not a timed reply - no
    /// ring write and no statistics update; the pre-committed `Lost` slot
    /// from `begin_tick` is left in place.
    pub fn record_unreachable(&mut self, responder: Ipv4Addr) {
        self.last_rtt_ms = -1.0;
        self.last_responder = Some(responder);
    }

    pub fn reset(&mut self) {
        self.stats.reset();
    }
}

/// One hop along the path to the currently selected target.
#[derive(Debug)]
pub struct Hop {
    state: Mutex<HopState>,
}

impl Hop {
    fn new() -> Self {
        Self {
            state: Mutex::new(HopState::new()),
        }
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut HopState) -> R) -> R {
        let mut guard = self.state.lock().expect("hop state lock poisoned");
        f(&mut guard)
    }

    pub fn ring_get(&self, off: usize, delt: i64) -> u8 {
        self.with_state(|s| s.ring.get(off, delt))
    }
}

/// Fixed-capacity (`TTTL`) array of hops, plus the dynamic hop-count
/// high-water mark `nhop`.
#[derive(Debug)]
pub struct TraceTable {
    hops: Vec<Hop>,
    nhop: AtomicUsize,
}

impl Default for TraceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceTable {
    pub fn new() -> Self {
        Self {
            hops: (0..TTTL).map(|_| Hop::new()).collect(),
            nhop: AtomicUsize::new(TTTL),
        }
    }

    pub fn hop(&self, ttl: usize) -> Option<&Hop> {
        self.hops.get(ttl - 1)
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// Current path-length estimate in `[1, TTTL]`.
    pub fn nhop(&self) -> usize {
        self.nhop.load(Ordering::Acquire)
    }

    /// Called once per tick by the sender, before any probe is emitted:
    /// resets `nhop` to `TTTL` and scratch-resets every hop row.
    pub fn begin_tick(&self) {
        self.nhop.store(TTTL, Ordering::Release);
        for hop in &self.hops {
            hop.with_state(|s| s.begin_tick());
        }
    }

    /// An Echo Reply at TTL `rsq` means the path is exactly `rsq` hops long
    /// (or shorter, if a previous probe already got there). Shrinks `nhop`
    /// monotonically.
    pub fn shrink_to(&self, rsq: usize) {
        self.nhop.fetch_min(rsq, Ordering::AcqRel);
    }

    /// Reset every hop's statistics to their undefined sentinels, leaving
    /// ring contents and `nhop` untouched. Mirrors `TargetTable::reset_stats`
    /// for a user-requested bulk reset.
    pub fn reset_stats(&self) {
        for hop in &self.hops {
            hop.with_state(|s| s.reset());
        }
    }

    /// Re-initialize the whole table: called when the UI's selected target
    /// changes, before the next tick observes the new selection.
    pub fn reinitialize(&self) {
        self.nhop.store(TTTL, Ordering::Release);
        for hop in &self.hops {
            hop.with_state(|s| {
                s.ring = Ring::new();
                s.reset();
                s.last_rtt_ms = 0.0;
                s.last_responder = None;
            });
        }
    }
}
