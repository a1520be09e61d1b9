//! ICMPv4 Echo Request/Reply packet construction and parsing.
//!
//! This module is transport-independent: it only ever sees byte slices, so
//! it can be exercised without a raw socket or root privileges. The concrete
//! socket plumbing lives in `pingmon-daemon`.

/// ICMP Echo.
pub const ICMP_ECHO_REQUEST: u8 = 8;
/// ICMP Echo Reply.
pub const ICMP_ECHO_REPLY: u8 = 0;
/// ICMP Destination Unreachable.
pub const ICMP_DEST_UNREACHABLE: u8 = 3;
/// ICMP Time Exceeded.
pub const ICMP_TIME_EXCEEDED: u8 = 11;

const ICMP_HEADER_LEN: usize = 8;
const TIMESTAMP_LEN: usize = 8;

/// Build an ICMPv4 Echo Request: an 8-byte header followed by an 8-byte
/// payload holding the high-resolution send timestamp (seconds since epoch,
/// native-endian IEEE-754 double).
pub fn build_echo_request(id: u16, seq: u16, send_time: f64) -> Vec<u8> {
    let mut buf = vec![0u8; ICMP_HEADER_LEN + TIMESTAMP_LEN];
    buf[0] = ICMP_ECHO_REQUEST;
    buf[1] = 0; // code
    buf[2] = 0; // checksum, filled below
    buf[3] = 0;
    buf[4..6].copy_from_slice(&id.to_be_bytes());
    buf[6..8].copy_from_slice(&seq.to_be_bytes());
    buf[8..16].copy_from_slice(&send_time.to_ne_bytes());

    let csum = checksum(&buf);
    buf[2..4].copy_from_slice(&csum.to_be_bytes());
    buf
}

/// Standard 16-bit one's-complement Internet checksum. `data` must have the
/// checksum field already zeroed. Odd-length input takes the trailing byte
/// as the low byte of a final word.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);
    for word in &mut chunks {
        sum += u16::from_be_bytes([word[0], word[1]]) as u32;
    }
    if let [last] = *chunks.remainder() {
        sum += last as u32;
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// A parsed ICMPv4 message, classified by type, plus the outer IP TTL it
/// arrived with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datagram {
    pub ttl: u8,
    pub message: IcmpMessage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IcmpMessage {
    EchoRequest { id: u16, seq: u16 },
    EchoReply { id: u16, seq: u16, send_time: f64 },
    /// `orig_id`/`orig_seq` are recovered from the cited probe datagram.
    /// `orig_send_time` is recovered too when the router echoed enough of
    /// that probe's payload back (most do, for a probe this small) - `None`
    /// when the citation was truncated to the bare minimum.
    TimeExceeded {
        orig_id: u16,
        orig_seq: u16,
        orig_send_time: Option<f64>,
    },
    /// `orig_id`/`orig_seq` are recovered from the cited original datagram.
    DestUnreachable { orig_id: u16, orig_seq: u16 },
    Other { icmp_type: u8, icmp_code: u8 },
}

/// Parse an incoming IPv4 datagram carrying an ICMP message. Returns `None`
/// on any truncation - callers on a raw socket must tolerate arbitrary
/// garbage and simply drop it.
pub fn parse_datagram(data: &[u8]) -> Option<Datagram> {
    let (ttl, icmp_type, icmp_code, id, seq, consumed) = parse_ip_and_icmp_header(data)?;
    let body = data.get(consumed..)?;

    let message = match icmp_type {
        ICMP_ECHO_REPLY => {
            let ts_bytes: [u8; 8] = body.get(0..TIMESTAMP_LEN)?.try_into().ok()?;
            IcmpMessage::EchoReply {
                id,
                seq,
                send_time: f64::from_ne_bytes(ts_bytes),
            }
        }
        ICMP_ECHO_REQUEST => IcmpMessage::EchoRequest { id, seq },
        ICMP_TIME_EXCEEDED => {
            let (_, _, _, orig_id, orig_seq, orig_consumed) = parse_ip_and_icmp_header(body)?;
            let orig_send_time = body
                .get(orig_consumed..orig_consumed + TIMESTAMP_LEN)
                .and_then(|b| b.try_into().ok())
                .map(f64::from_ne_bytes);
            IcmpMessage::TimeExceeded {
                orig_id,
                orig_seq,
                orig_send_time,
            }
        }
        ICMP_DEST_UNREACHABLE => {
            let (_, _, _, orig_id, orig_seq, _) = parse_ip_and_icmp_header(body)?;
            IcmpMessage::DestUnreachable { orig_id, orig_seq }
        }
        other => IcmpMessage::Other {
            icmp_type: other,
            icmp_code,
        },
    };
    Some(Datagram { ttl, message })
}

/// Strip one IPv4 header (length `ihl*4`) and read one ICMP header
/// immediately following it. Returns `(ttl, icmp_type, icmp_code, id, seq,
/// total_bytes_consumed)`.
fn parse_ip_and_icmp_header(data: &[u8]) -> Option<(u8, u8, u8, u16, u16, usize)> {
    let version_ihl = *data.first()?;
    let ihl = (version_ihl & 0x0F) as usize * 4;
    if ihl < 20 || data.len() < ihl {
        return None;
    }
    let ttl = *data.get(8)?;
    let icmp = data.get(ihl..)?;
    if icmp.len() < ICMP_HEADER_LEN {
        return None;
    }
    let icmp_type = icmp[0];
    let icmp_code = icmp[1];
    let id = u16::from_be_bytes([icmp[4], icmp[5]]);
    let seq = u16::from_be_bytes([icmp[6], icmp[7]]);
    Some((ttl, icmp_type, icmp_code, id, seq, ihl + ICMP_HEADER_LEN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipv4_header(ttl: u8) -> [u8; 20] {
        let mut h = [0u8; 20];
        h[0] = 0x45; // version 4, ihl 5 (20 bytes)
        h[8] = ttl;
        h
    }

    #[test]
    fn checksum_self_verifies() {
        // build_echo_request already inserted a valid checksum; summing the
        // whole buffer (checksum field included) must fold to 0xFFFF.
        let pkt = build_echo_request(0x1234, 7, 123456.789);
        assert_eq!(checksum(&pkt), 0xFFFF);

        // Same property on an odd-length buffer.
        let mut odd = pkt.clone();
        odd.push(0x42);
        odd[2] = 0;
        odd[3] = 0;
        let c = checksum(&odd);
        odd[2..4].copy_from_slice(&c.to_be_bytes());
        assert_eq!(checksum(&odd), 0xFFFF);
    }

    #[test]
    fn build_echo_request_has_correct_header_fields() {
        let pkt = build_echo_request(0xBEEF, 42, 1.5);
        assert_eq!(pkt[0], ICMP_ECHO_REQUEST);
        assert_eq!(pkt[1], 0);
        assert_eq!(u16::from_be_bytes([pkt[4], pkt[5]]), 0xBEEF);
        assert_eq!(u16::from_be_bytes([pkt[6], pkt[7]]), 42);
        assert_eq!(f64::from_ne_bytes(pkt[8..16].try_into().unwrap()), 1.5);
    }

    fn wrap_in_ip(ttl: u8, icmp: &[u8]) -> Vec<u8> {
        let mut v = ipv4_header(ttl).to_vec();
        v.extend_from_slice(icmp);
        v
    }

    #[test]
    fn parses_echo_reply() {
        let req = build_echo_request(0x10, 5, 99.0);
        let mut reply = req.clone();
        reply[0] = ICMP_ECHO_REPLY;
        let datagram = parse_datagram(&wrap_in_ip(64, &reply)).unwrap();
        assert_eq!(datagram.ttl, 64);
        match datagram.message {
            IcmpMessage::EchoReply { id, seq, send_time } => {
                assert_eq!(id, 0x10);
                assert_eq!(seq, 5);
                assert!((send_time - 99.0).abs() < 1e-9);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn parses_time_exceeded_citation_with_bare_minimum() {
        let original_probe = build_echo_request(0x20, 3, 0.0);
        // citation = original IP header + first 8 bytes of original ICMP header,
        // with the timestamp payload truncated away (the minimum any router
        // is required to echo back).
        let citation = wrap_in_ip(1, &original_probe[..8]);
        let mut icmp_te = vec![ICMP_TIME_EXCEEDED, 0, 0, 0, 0, 0, 0, 0];
        icmp_te.extend_from_slice(&citation);
        let datagram = parse_datagram(&wrap_in_ip(250, &icmp_te)).unwrap();
        match datagram.message {
            IcmpMessage::TimeExceeded {
                orig_id,
                orig_seq,
                orig_send_time,
            } => {
                assert_eq!(orig_id, 0x20);
                assert_eq!(orig_seq, 3);
                assert_eq!(orig_send_time, None);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn parses_time_exceeded_citation_with_full_echo() {
        // Most routers echo the whole original datagram back when it's this
        // small, recovering the send timestamp too.
        let original_probe = build_echo_request(0x20, 3, 42.5);
        let citation = wrap_in_ip(1, &original_probe);
        let mut icmp_te = vec![ICMP_TIME_EXCEEDED, 0, 0, 0, 0, 0, 0, 0];
        icmp_te.extend_from_slice(&citation);
        let datagram = parse_datagram(&wrap_in_ip(250, &icmp_te)).unwrap();
        match datagram.message {
            IcmpMessage::TimeExceeded {
                orig_id,
                orig_seq,
                orig_send_time,
            } => {
                assert_eq!(orig_id, 0x20);
                assert_eq!(orig_seq, 3);
                assert!((orig_send_time.unwrap() - 42.5).abs() < 1e-9);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn parses_destination_unreachable_citation() {
        let original_probe = build_echo_request(0x21, 9, 0.0);
        let citation = wrap_in_ip(1, &original_probe[..8]);
        let mut icmp_du = vec![ICMP_DEST_UNREACHABLE, 1, 0, 0, 0, 0, 0, 0];
        icmp_du.extend_from_slice(&citation);
        let datagram = parse_datagram(&wrap_in_ip(250, &icmp_du)).unwrap();
        match datagram.message {
            IcmpMessage::DestUnreachable { orig_id, orig_seq } => {
                assert_eq!(orig_id, 0x21);
                assert_eq!(orig_seq, 9);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn truncated_datagrams_are_ignored() {
        assert!(parse_datagram(&[]).is_none());
        assert!(parse_datagram(&ipv4_header(64)).is_none()); // no ICMP header at all
        let mut short_icmp = ipv4_header(64).to_vec();
        short_icmp.extend_from_slice(&[0, 0, 0]); // truncated ICMP header
        assert!(parse_datagram(&short_icmp).is_none());
        let mut short_reply = ipv4_header(64).to_vec();
        short_reply.extend_from_slice(&[ICMP_ECHO_REPLY, 0, 0, 0, 0, 0, 0, 0]); // no timestamp
        assert!(parse_datagram(&short_reply).is_none());
    }

    #[test]
    fn garbage_ihl_is_rejected_not_panicking() {
        let mut garbage = vec![0xFFu8; 4];
        garbage[0] = 0x4F; // ihl=15 words=60 bytes, but buffer is shorter
        assert!(parse_datagram(&garbage).is_none());
    }
}
