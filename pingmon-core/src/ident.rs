//! Two-identifier namespace separating the ping and traceroute ICMP streams,
//! and the sequence-number wraparound rule that keeps late-arrival
//! arithmetic unambiguous across a wrap.

use crate::ring::NSEC;

/// Derive `(pingid, traceid)` from a process id. `pingid` is even, `traceid`
/// is `pingid | 1` so the two streams are separable by the low bit even if
/// their replies interleave.
pub fn derive_identifiers(pid: u32) -> (u16, u16) {
    let pingid = ((pid & 0x7FFF) as u16) << 1;
    let traceid = pingid | 1;
    (pingid, traceid)
}

/// Advance a 16-bit tick counter by one, wrapping to `NSEC` (not zero) once
/// it would exceed `u16::MAX`. Wrapping to `NSEC` rather than `0` guarantees
/// a post-wrap sequence number is never small enough to collide with a live
/// ring offset computed from a pre-wrap sequence.
pub fn wrapping_increment(counter: u16) -> u16 {
    if counter == u16::MAX {
        NSEC as u16
    } else {
        counter + 1
    }
}

/// Compute the ring offset for a reply whose sequence is `rsq`, given the
/// sender's current sequence `seq`, accounting for one wraparound. Returns
/// `None` if the computed offset isn't a valid, in-range, strictly positive
/// ring offset (`0 < k < NSEC`).
pub fn late_offset(seq: u16, rsq: u16) -> Option<usize> {
    let mut k = seq as i64 - rsq as i64;
    if k < 0 {
        k += 65536 - NSEC as i64;
    }
    if k > 0 && k < NSEC as i64 {
        Some(k as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_separated_by_parity() {
        let (pingid, traceid) = derive_identifiers(12345);
        assert_eq!(pingid & 1, 0);
        assert_eq!(traceid & 1, 1);
        assert!((pingid as u32) < 0x10000);
        assert!((traceid as u32) < 0x10000);
        assert_eq!(traceid, pingid | 1);
    }

    #[test]
    fn wrap_goes_to_nsec_not_zero() {
        assert_eq!(wrapping_increment(u16::MAX), NSEC as u16);
        assert_eq!(wrapping_increment(100), 101);
    }

    #[test]
    fn late_offset_handles_wrap_boundary() {
        // Previous tick's reply delayed by one second across the 65535->NSEC wrap.
        let seq = NSEC as u16; // post-wrap current sequence
        let rsq = 65535u16; // the delayed reply's sequence, from just before the wrap
        assert_eq!(late_offset(seq, rsq), Some(1));
    }

    #[test]
    fn late_offset_rejects_out_of_range() {
        assert_eq!(late_offset(10, 10), None); // k=0, not strictly positive
        assert_eq!(late_offset(5, 4000), None); // k would be negative and not near a wrap
    }
}
