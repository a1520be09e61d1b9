//! The blocking-read receiver worker (C8): classifies each inbound datagram
//! as a ping reply (current or late), a traceroute reply, a traceroute Time
//! Exceeded, or a traceroute Destination Unreachable, and drops anything
//! else. Never sends, never advances sequence counters or ring cursors.

use std::net::Ipv4Addr;
use std::sync::Arc;

use pingmon_core::codec::{self, IcmpMessage};
use pingmon_core::ident::late_offset;
use pingmon_core::Engine;

use crate::time::now_epoch_secs;

pub fn run(engine: Arc<Engine>, mut rx: impl pingmon_core::IcmpReceiver) {
    while engine.is_running() {
        let (source, bytes) = match rx.recv_datagram() {
            Ok(v) => v,
            Err(e) => {
                log::warn!("receive error, retrying: {e}");
                continue;
            }
        };
        let Some(datagram) = codec::parse_datagram(&bytes) else {
            continue; // truncated or garbage - tolerate and drop
        };

        match datagram.message {
            IcmpMessage::EchoReply { id, seq, send_time } if id == engine.pingid() => {
                handle_ping_reply(&engine, source, seq, send_time, datagram.ttl);
            }
            IcmpMessage::EchoReply { id, seq, send_time } if id == engine.traceid() => {
                handle_trace_reply(&engine, source, seq, send_time);
            }
            IcmpMessage::TimeExceeded {
                orig_id,
                orig_seq,
                orig_send_time: Some(send_time),
            } if orig_id == engine.traceid() => {
                handle_trace_time_exceeded(&engine, source, orig_seq, send_time);
            }
            IcmpMessage::DestUnreachable { orig_id, orig_seq } if orig_id == engine.traceid() => {
                handle_trace_unreachable(&engine, source, orig_seq);
            }
            _ => {} // foreign id, wrong type, or a Time Exceeded citation too short to carry a timestamp
        }
    }
}

fn handle_ping_reply(engine: &Engine, source: Ipv4Addr, seq: u16, send_time: f64, ttl: u8) {
    let Some(target) = engine.targets.iter().find(|t| t.addr == source) else {
        return;
    };
    let dt_ms = 1000.0 * (now_epoch_secs() - send_time);
    if seq == engine.seq() {
        target.with_state(|s| s.record_reply(dt_ms, ttl));
    } else if let Some(offset) = late_offset(engine.seq(), seq) {
        target.with_state(|s| {
            s.record_late(offset);
        });
    }
}

fn handle_trace_reply(engine: &Engine, source: Ipv4Addr, seq: u16, send_time: f64) {
    let nhop = engine.trace.nhop();
    if seq == 0 || seq as usize > nhop {
        return;
    }
    engine.trace.shrink_to(seq as usize);
    let dt_ms = 1000.0 * (now_epoch_secs() - send_time);
    if let Some(hop) = engine.trace.hop(seq as usize) {
        hop.with_state(|s| s.record_reply(dt_ms, source));
    }
}

fn handle_trace_time_exceeded(engine: &Engine, source: Ipv4Addr, seq: u16, send_time: f64) {
    let nhop = engine.trace.nhop();
    if seq == 0 || seq as usize > nhop {
        return;
    }
    let dt_ms = 1000.0 * (now_epoch_secs() - send_time);
    if let Some(hop) = engine.trace.hop(seq as usize) {
        hop.with_state(|s| s.record_reply(dt_ms, source));
    }
}

fn handle_trace_unreachable(engine: &Engine, source: Ipv4Addr, seq: u16) {
    let nhop = engine.trace.nhop();
    if seq == 0 || seq as usize >= nhop {
        return;
    }
    engine.trace.shrink_to(seq as usize);
    if let Some(hop) = engine.trace.hop(seq as usize) {
        hop.with_state(|s| s.record_unreachable(source));
    }
}
