//! Fixed-capacity circular buffer of one-second ping outcomes.

use crate::outcome::{LATE_PING, LOST_PING, NO_PING};

/// One hour of history at one sample per second.
pub const NSEC: usize = 3600;

/// Per-target (or per-hop) circular history of outcome bytes.
///
/// `cur` always points at the slot representing the *outstanding* current
/// tick. `shift()` is the only way `cur` moves; it is sender-only. `set`
/// ignores the read-side time-scroll offset; `get` honors it.
#[derive(Debug, Clone)]
pub struct Ring {
    cur: usize,
    buf: [u8; NSEC],
}

impl Default for Ring {
    fn default() -> Self {
        Self::new()
    }
}

impl Ring {
    pub fn new() -> Self {
        Self {
            cur: NSEC - 1,
            buf: [NO_PING; NSEC],
        }
    }

    /// Read the outcome byte at a non-negative offset from "now", honoring a
    /// caller-supplied scrollback shift (`delt`). Offset `0` is the
    /// outstanding current tick; offset `1` is the most recently finalized one.
    pub fn get(&self, off: usize, delt: i64) -> u8 {
        let idx = Self::wrap(self.cur as i64 + off as i64 + delt);
        self.buf[idx]
    }

    /// Write the outcome byte at a non-negative offset from "now". Never
    /// applies `delt` - this is the write path and write paths never scroll.
    pub fn set(&mut self, off: usize, val: u8) {
        let idx = Self::wrap(self.cur as i64 + off as i64);
        self.buf[idx] = val;
    }

    /// Upgrade a finalized `Lost` slot at offset `off` to `Late`. Any other
    /// observed value is left unchanged - `Lost -> Late` is the only legal
    /// transition, guarding against a concurrent `shift` rotating the slot
    /// out from under a late-arriving reply.
    ///
    /// Returns whether the upgrade happened.
    pub fn upgrade_to_late(&mut self, off: usize) -> bool {
        let idx = Self::wrap(self.cur as i64 + off as i64);
        if self.buf[idx] == LOST_PING {
            self.buf[idx] = LATE_PING;
            true
        } else {
            false
        }
    }

    /// Advance the head cursor by one tick, pre-committing `Lost` into the
    /// new head slot (the slot representing "now"). Must be called exactly
    /// once per tick before any reply for that tick may land.
    pub fn shift(&mut self) {
        self.cur = if self.cur == 0 { NSEC - 1 } else { self.cur - 1 };
        self.set(0, LOST_PING);
    }

    /// Whether the slot that is about to be shifted out (current offset 0)
    /// is still `Lost` - used by the statistics accumulator to decide
    /// whether to count a lost tick before the ring rotates it away.
    pub fn head_is_lost(&self) -> bool {
        self.buf[self.cur] == LOST_PING
    }

    fn wrap(idx: i64) -> usize {
        idx.rem_euclid(NSEC as i64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ring_is_all_no_ping() {
        let r = Ring::new();
        for off in 0..NSEC {
            assert_eq!(r.get(off, 0), NO_PING);
        }
    }

    #[test]
    fn shift_precommits_lost_at_offset_zero() {
        let mut r = Ring::new();
        r.shift();
        assert_eq!(r.get(0, 0), LOST_PING);
    }

    #[test]
    fn slots_written_matches_tick_count() {
        let mut r = Ring::new();
        for t in 1..=10 {
            r.shift();
            let written = (0..NSEC).filter(|&off| r.get(off, 0) != NO_PING).count();
            assert_eq!(written, t.min(NSEC));
        }
    }

    #[test]
    fn set_ignores_delt_get_honors_it() {
        let mut r = Ring::new();
        r.shift();
        r.set(0, 0x05);
        r.shift();
        r.set(0, 0x06);
        // offset 1 without scroll is the previous tick (0x05).
        assert_eq!(r.get(1, 0), 0x05);
        // scrolling back by one more second should reach the NoPing slot before that.
        assert_eq!(r.get(1, 1), NO_PING);
    }

    #[test]
    fn late_upgrade_only_transitions_from_lost() {
        let mut r = Ring::new();
        r.shift();
        r.set(0, 0x12);
        // offset 0 now holds a reply byte, not Lost - upgrade must be a no-op.
        assert!(!r.upgrade_to_late(0));
        assert_eq!(r.get(0, 0), 0x12);

        r.shift();
        // offset 1 (the previous tick) is still Lost.
        assert!(r.upgrade_to_late(1));
        assert_eq!(r.get(1, 0), LATE_PING);
        // A second upgrade attempt on an already-Late slot must be a no-op.
        assert!(!r.upgrade_to_late(1));
    }

    #[test]
    fn shift_then_set_lost_is_a_no_op_on_contents() {
        let mut r = Ring::new();
        r.shift();
        let before = r.get(0, 0);
        r.set(0, LOST_PING);
        assert_eq!(before, LOST_PING);
        assert_eq!(r.get(0, 0), LOST_PING);
    }
}
