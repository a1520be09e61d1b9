//! Transport boundary (C9): the raw-socket send/receive halves the two
//! worker threads each own exclusively. Kept as traits here so the whole
//! probe engine stays host-independent and unit-testable without a raw
//! socket or root privileges - the concrete `pnet`-backed implementation
//! lives in `pingmon-daemon`.

use std::io;
use std::net::Ipv4Addr;

/// The sender thread's exclusive half: emit one ICMP Echo Request wrapped
/// in an IPv4 header with the given per-packet TTL.
pub trait IcmpSender: Send {
    fn send_echo(&mut self, ttl: u8, dest: Ipv4Addr, icmp_payload: &[u8]) -> io::Result<()>;
}

/// The receiver thread's exclusive half: block for the next inbound
/// datagram. Returns the packet's source address and the raw bytes
/// starting at the IPv4 header, for `codec::parse_datagram`.
pub trait IcmpReceiver: Send {
    fn recv_datagram(&mut self) -> io::Result<(Ipv4Addr, Vec<u8>)>;
}
