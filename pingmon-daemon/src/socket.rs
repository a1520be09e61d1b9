//! The concrete `pnet`-backed raw ICMP socket (C9), implementing the
//! transport-boundary traits `pingmon_core` defines.
//!
//! A `Layer3(Ipv4)` transport channel is used rather than `Layer4(Icmp)` so
//! this module builds and parses the full IPv4 header itself: that's what
//! gives per-packet TTL control on send (no `IP_TTL` socket-option round
//! trip between probes of the same burst) and exposes the inbound TTL on
//! receive, which `pingmon_core::codec` needs for C1's parsing.

use std::io;
use std::net::{IpAddr, Ipv4Addr};

use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::{checksum as ipv4_checksum, Ipv4Packet, MutableIpv4Packet};
use pnet::packet::Packet;
use pnet::transport::TransportChannelType::Layer3;
use pnet::transport::{ipv4_packet_iter, transport_channel, TransportReceiver, TransportSender};

use pingmon_core::transport::{IcmpReceiver, IcmpSender};

use crate::error::TransportError;

const IPV4_HEADER_LEN: usize = 20;
const RECV_BUFFER_BYTES: usize = 1 << 16;

/// Open a fresh raw ICMP socket pair. Also serves as "reset": dropping the
/// old `RawIcmpSender`/`RawIcmpReceiver` closes the old socket, and calling
/// this again opens a new one - the caller re-derives `pingid`/`traceid` the
/// same way it did at startup.
pub fn open() -> Result<(RawIcmpSender, RawIcmpReceiver), TransportError> {
    let (tx, rx) = transport_channel(RECV_BUFFER_BYTES, Layer3(IpNextHeaderProtocols::Icmp))
        .map_err(TransportError::Open)?;
    Ok((RawIcmpSender { tx }, RawIcmpReceiver { rx }))
}

pub struct RawIcmpSender {
    tx: TransportSender,
}

impl IcmpSender for RawIcmpSender {
    fn send_echo(&mut self, ttl: u8, dest: Ipv4Addr, icmp_payload: &[u8]) -> io::Result<()> {
        let total_len = IPV4_HEADER_LEN + icmp_payload.len();
        let mut buf = vec![0u8; total_len];
        {
            let mut pkt = MutableIpv4Packet::new(&mut buf)
                .expect("buffer sized for one IPv4 header plus the ICMP payload");
            pkt.set_version(4);
            pkt.set_header_length((IPV4_HEADER_LEN / 4) as u8);
            pkt.set_total_length(total_len as u16);
            pkt.set_ttl(ttl);
            pkt.set_next_level_protocol(IpNextHeaderProtocols::Icmp);
            pkt.set_source(Ipv4Addr::UNSPECIFIED);
            pkt.set_destination(dest);
            pkt.set_payload(icmp_payload);
            pkt.set_checksum(ipv4_checksum(&pkt.to_immutable()));
        }
        let packet = Ipv4Packet::new(&buf).expect("buffer was just built as a valid IPv4 packet");
        self.tx.send_to(packet, IpAddr::V4(dest))?;
        Ok(())
    }
}

pub struct RawIcmpReceiver {
    rx: TransportReceiver,
}

impl IcmpReceiver for RawIcmpReceiver {
    fn recv_datagram(&mut self) -> io::Result<(Ipv4Addr, Vec<u8>)> {
        let mut iter = ipv4_packet_iter(&mut self.rx);
        let (packet, _addr) = iter.next()?;
        Ok((packet.get_source(), packet.packet().to_vec()))
    }
}
