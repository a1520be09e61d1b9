//! The shared-state object both workers (and the console reporter) hold a
//! handle to. Gathers the global mutable scalars - `seq`, `tseq`, the
//! selected trace target, the scrollback offset, the run flag - into one
//! place with an explicit single-writer discipline per field.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU16, AtomicUsize, Ordering};

use crate::error::EngineError;
use crate::ident::{derive_identifiers, wrapping_increment};
use crate::ring::NSEC;
use crate::target::TargetTable;
use crate::trace::TraceTable;

/// Microseconds of air time budgeted per tick for sends, leaving headroom
/// inside the one-second cadence for replies to arrive before the next
/// tick's shift rotates their slots away.
pub const AIR_TIME_BUDGET_US: u64 = 950_000;

/// Engine-wide configuration fixed at construction time.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Seconds between ticks (the cadence), 1-5.
    pub cadence_secs: u64,
    /// Microseconds paused between consecutive sends within a tick.
    pub inter_send_us: u64,
    /// Finite ping count after which the engine requests shutdown, or `0`
    /// for unbounded.
    pub finite_count: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cadence_secs: 1,
            inter_send_us: 1000,
            finite_count: 0,
        }
    }
}

/// Owns all shared, cross-worker state: the target table, the trace table,
/// and the global scalars. Single-writer-per-field: `seq`/`tseq`/ring
/// cursors are sender-only; `selected`/`delt`/`run` are UI-only; individual
/// ring slot contents may be written by either the sender (via `shift`) or
/// the receiver (via `record_reply`/`record_late`), never both for the same
/// slot in the same tick.
pub struct Engine {
    pub targets: TargetTable,
    pub trace: TraceTable,
    pub config: EngineConfig,
    pingid: u16,
    traceid: u16,
    seq: AtomicU16,
    tseq: AtomicU16,
    selected: AtomicUsize,
    delt: AtomicI64,
    run: AtomicBool,
    repaint: AtomicBool,
}

impl Engine {
    /// Construct an engine, validating the per-tick air-time budget against
    /// the configured target count and inter-send spacing.
    pub fn new(targets: TargetTable, config: EngineConfig, pid: u32) -> Result<Self, EngineError> {
        let ntar = targets.len();
        let budget_us = (ntar + crate::trace::TTTL) as u64 * config.inter_send_us;
        if budget_us >= AIR_TIME_BUDGET_US {
            return Err(EngineError::AirTimeBudgetExceeded {
                ntar,
                ttl: crate::trace::TTTL,
                pus: config.inter_send_us,
                budget_us,
            });
        }
        let (pingid, traceid) = derive_identifiers(pid);
        Ok(Self {
            targets,
            trace: TraceTable::new(),
            config,
            pingid,
            traceid,
            seq: AtomicU16::new(0),
            tseq: AtomicU16::new(0),
            selected: AtomicUsize::new(0),
            delt: AtomicI64::new(0),
            run: AtomicBool::new(true),
            repaint: AtomicBool::new(false),
        })
    }

    pub fn pingid(&self) -> u16 {
        self.pingid
    }

    pub fn traceid(&self) -> u16 {
        self.traceid
    }

    /// Current ping sequence number.
    pub fn seq(&self) -> u16 {
        self.seq.load(Ordering::Acquire)
    }

    /// Advance the ping sequence, wrapping to `NSEC` rather than `0`.
    /// Sender-only.
    pub fn advance_seq(&self) -> u16 {
        let next = wrapping_increment(self.seq.load(Ordering::Acquire));
        self.seq.store(next, Ordering::Release);
        next
    }

    /// Current traceroute sequence number.
    pub fn tseq(&self) -> u16 {
        self.tseq.load(Ordering::Acquire)
    }

    /// Advance the traceroute sequence, wrapping to `NSEC` rather than `0`.
    /// Sender-only.
    pub fn advance_tseq(&self) -> u16 {
        let next = wrapping_increment(self.tseq.load(Ordering::Acquire));
        self.tseq.store(next, Ordering::Release);
        next
    }

    /// Index into the target table that the trace burst is currently aimed
    /// at. Read by the sender once per tick.
    pub fn selected(&self) -> usize {
        self.selected.load(Ordering::Acquire)
    }

    /// UI-only: change the selected target. Callers must also call
    /// `self.trace.reinitialize()` before the next tick observes the new
    /// selection.
    pub fn set_selected(&self, index: usize) {
        self.selected.store(index, Ordering::Release);
    }

    /// Read-side scrollback offset. UI-only writer; read by both UI
    /// rendering and the ring `get` path. Never read on a write path.
    pub fn delt(&self) -> i64 {
        self.delt.load(Ordering::Acquire)
    }

    pub fn set_delt(&self, delt: i64) {
        self.delt.store(delt, Ordering::Release);
    }

    /// Whether the engine should keep running. UI-only writer.
    pub fn is_running(&self) -> bool {
        self.run.load(Ordering::Acquire)
    }

    /// Request shutdown. Idempotent.
    pub fn stop(&self) {
        self.run.store(false, Ordering::Release);
    }

    /// Whether a finite ping count has been reached - checked by the sender
    /// at the end of each tick.
    pub fn finite_count_reached(&self) -> bool {
        self.config.finite_count > 0 && self.seq() as u32 >= self.config.finite_count as u32
    }

    /// Raised by the sender at the end of each tick, once the new state is
    /// stable; a collaborator polling loop (the console reporter, or a
    /// future curses UI) clears it via `take_repaint` to know when to
    /// redraw.
    pub fn request_repaint(&self) {
        self.repaint.store(true, Ordering::Release);
    }

    /// Consume the repaint flag, returning whether a repaint was pending.
    pub fn take_repaint(&self) -> bool {
        self.repaint.swap(false, Ordering::AcqRel)
    }

    /// User-requested bulk reset: wipe every target's and every hop's
    /// statistics back to their undefined sentinels. Ring contents - the
    /// actual outcome history - are left untouched; only the running
    /// accumulators are cleared.
    pub fn reset_stats(&self) {
        self.targets.reset_stats();
        self.trace.reset_stats();
    }
}


/// End-to-end scenarios exercised against the public
/// `Target`/`TargetTable`/`TraceTable` API rather than any one module in
/// isolation - these are the scenarios a reviewer would reach for first.
#[cfg(test)]
mod seed_scenarios {
    use crate::outcome::Outcome;
    use crate::target::Target;
    use crate::trace::TraceTable;
    use std::net::Ipv4Addr;

    /// Two targets probed every tick, never losing a reply.
    #[test]
    fn two_targets_no_loss() {
        let a = Target::new("a".into(), "a".into(), Ipv4Addr::new(10, 0, 0, 1), None);
        let b = Target::new("b".into(), "b".into(), Ipv4Addr::new(10, 0, 0, 2), None);
        for _ in 0..3 {
            a.with_state(|s| {
                s.shift();
                s.record_reply(20.0, 64);
            });
            b.with_state(|s| {
                s.shift();
                s.record_reply(150.0, 64);
            });
        }
        a.with_state(|s| {
            let o = Outcome::decode(s.ring.get(1, 0));
            assert_eq!(o.bucket_low_ms(), Some(20));
            assert_eq!(o.bucket_high_ms(), Some(30));
            assert_eq!(s.stats.n(), 3);
            assert_eq!(s.stats.lost(), 0);
            assert_eq!(s.stats.late(), 0);
        });
        b.with_state(|s| {
            let o = Outcome::decode(s.ring.get(1, 0));
            assert_eq!(o.bucket_low_ms(), Some(150));
            assert_eq!(o.bucket_high_ms(), Some(160));
            assert_eq!(s.stats.n(), 3);
            assert_eq!(s.stats.lost(), 0);
            assert_eq!(s.stats.late(), 0);
        });
    }

    /// A reply for seq=5 arrives during tick seq=7: lost, then late.
    #[test]
    fn lost_then_late() {
        let t = Target::new("t".into(), "t".into(), Ipv4Addr::new(10, 0, 0, 1), None);
        // Ticks 1..=5: no reply ever lands, each shift pre-commits Lost.
        for _ in 1..=5 {
            t.with_state(|s| s.shift());
        }
        t.with_state(|s| assert_eq!(s.ring.get(0, 0), crate::outcome::LOST_PING));
        // Ticks 6..=7: still nothing, each shift finalizes the prior Lost and
        // counts it before pre-committing the next one.
        for _ in 6..=7 {
            t.with_state(|s| s.shift());
        }
        // seq is now 7; the delayed reply for seq=5 lands at offset 7-5=2.
        let offset = crate::ident::late_offset(7, 5).unwrap();
        assert_eq!(offset, 2);
        let upgraded = t.with_state(|s| s.record_late(offset));
        assert!(upgraded);
        t.with_state(|s| {
            assert_eq!(s.ring.get(offset, 0), crate::outcome::LATE_PING);
            assert_eq!(s.stats.late(), 1);
            // Lost count is unaffected by the later Late upgrade - it was
            // already counted when tick 5's slot rotated out.
            assert_eq!(s.stats.lost(), 6);
        });
    }

    /// Traceroute to a 3-hop destination.
    #[test]
    fn three_hop_traceroute_converges() {
        let trace = TraceTable::new();
        trace.begin_tick();
        trace.hop(1).unwrap().with_state(|s| {
            s.record_reply(5.0, Ipv4Addr::new(10, 0, 0, 1));
        });
        trace.hop(2).unwrap().with_state(|s| {
            s.record_reply(12.0, Ipv4Addr::new(10, 0, 0, 2));
        });
        trace.hop(3).unwrap().with_state(|s| {
            s.record_reply(40.0, Ipv4Addr::new(10, 0, 0, 3));
        });
        trace.shrink_to(3);
        assert_eq!(trace.nhop(), 3);
        for ttl in 4..=crate::trace::TTTL {
            assert_eq!(
                trace.hop(ttl).unwrap().ring_get(0, 0),
                crate::outcome::LOST_PING
            );
        }
    }

    /// Hop 2 returns Destination Unreachable.
    #[test]
    fn unreachable_hop_renders_as_unreachable() {
        let trace = TraceTable::new();
        trace.begin_tick();
        trace.hop(2).unwrap().with_state(|s| {
            s.record_unreachable(Ipv4Addr::new(10, 0, 0, 9));
        });
        trace.shrink_to(2);
        assert_eq!(trace.nhop(), 2);
        trace.hop(2).unwrap().with_state(|s| {
            assert_eq!(s.last_rtt_ms, -1.0);
        });
    }
}
