//! The ordered table of ping targets (C5): immutable identity plus a
//! per-target ring/stats pair behind one lock each.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::EngineError;
use crate::ring::Ring;
use crate::stats::Stats;

/// Mutable per-tick state for one target, behind a single lock.
#[derive(Debug, Default)]
pub struct TargetState {
    pub ring: Ring,
    pub stats: Stats,
    /// `None` is the "no reply this tick" sentinel.
    pub last_rtt_ms: Option<f64>,
    /// TTL observed on the most recent reply, used for hop-count estimation.
    pub last_ttl: Option<u8>,
}

impl TargetState {
    fn new() -> Self {
        Self {
            ring: Ring::new(),
            stats: Stats::new(),
            last_rtt_ms: None,
            last_ttl: None,
        }
    }

    /// Advance the ring by one tick, and - if the slot being rotated out is
    /// still `Lost` - count it in statistics before it's gone.
    pub fn shift(&mut self) {
        if self.ring.head_is_lost() {
            self.stats.record_lost();
        }
        self.ring.shift();
        self.last_rtt_ms = None;
    }

    /// Record a reply that landed in the current tick's slot.
    pub fn record_reply(&mut self, dt_ms: f64, ttl: u8) {
        self.last_rtt_ms = Some(dt_ms);
        self.last_ttl = Some(ttl);
        self.ring.set(0, crate::outcome::encode(dt_ms));
        self.stats.update(dt_ms);
    }

    /// Try to upgrade a previously finalized `Lost` slot at ring offset
    /// `offset` to `Late`. Returns whether the upgrade happened.
    pub fn record_late(&mut self, offset: usize) -> bool {
        let upgraded = self.ring.upgrade_to_late(offset);
        if upgraded {
            self.stats.record_late();
        }
        upgraded
    }

    pub fn reset(&mut self) {
        self.stats.reset();
    }
}

/// One monitored host.
#[derive(Debug)]
pub struct Target {
    /// Display name (defaults to `host` when the config line has none).
    pub name: String,
    /// Hostname or IP string as it appeared in the config file.
    pub host: String,
    /// Resolved IPv4 address.
    pub addr: Ipv4Addr,
    /// Optional header group this target was listed under, for UI grouping.
    pub header: Option<String>,
    /// Do not beep on loss for this target - set by the UI collaborator.
    pub silent: AtomicBool,
    state: Mutex<TargetState>,
}

impl Target {
    pub fn new(name: String, host: String, addr: Ipv4Addr, header: Option<String>) -> Self {
        Self {
            name,
            host,
            addr,
            header,
            silent: AtomicBool::new(false),
            state: Mutex::new(TargetState::new()),
        }
    }

    pub fn set_silent(&self, silent: bool) {
        self.silent.store(silent, Ordering::Relaxed);
    }

    pub fn is_silent(&self) -> bool {
        self.silent.load(Ordering::Relaxed)
    }

    /// Run `f` against this target's mutable state under its lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut TargetState) -> R) -> R {
        let mut guard = self.state.lock().expect("target state lock poisoned");
        f(&mut guard)
    }

    /// Read a ring byte at `off`, honoring the read-side scrollback `delt`.
    pub fn ring_get(&self, off: usize, delt: i64) -> u8 {
        self.with_state(|s| s.ring.get(off, delt))
    }
}

/// The ordered, stable-index table of configured ping targets.
#[derive(Debug)]
pub struct TargetTable {
    targets: Vec<Target>,
}

impl TargetTable {
    /// Build a target table, rejecting duplicate resolved addresses.
    pub fn new(entries: Vec<Target>) -> Result<Self, EngineError> {
        if entries.is_empty() {
            return Err(EngineError::NoTargets);
        }
        for i in 0..entries.len() {
            for j in 0..i {
                if entries[i].addr == entries[j].addr {
                    return Err(EngineError::DuplicateAddress(entries[i].addr));
                }
            }
        }
        Ok(Self { targets: entries })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Target> {
        self.targets.get(index)
    }

    /// Reset every target's statistics to their undefined sentinels, leaving
    /// ring contents untouched - a user-requested bulk reset.
    pub fn reset_stats(&self) {
        for target in &self.targets {
            target.with_state(|s| s.reset());
        }
    }
}

/// Estimate path length in hops from an observed reply TTL, assuming the
/// initial TTL was one of 64/128/256 (the common OS defaults).
pub fn estimate_hop_count(observed_ttl: u8) -> u8 {
    let initial: u16 = if observed_ttl as u16 > 128 {
        256
    } else if observed_ttl as u16 > 64 {
        128
    } else {
        64
    };
    (initial + 1 - observed_ttl as u16) as u8
}
