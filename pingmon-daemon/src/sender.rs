//! The periodic sender worker (C7): each tick, advance the trace burst,
//! optionally log the previous tick's RTTs, then sweep every target, then
//! sleep out the rest of the tick. Never reads reply state; only ever
//! writes to rings via `shift`.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use pingmon_core::engine::AIR_TIME_BUDGET_US;
use pingmon_core::trace::TTTL;
use pingmon_core::{codec, Engine};

use crate::logger::Logger;
use crate::time::now_epoch_secs;

/// Per-send IP TTL for ping probes; traceroute probes use the sweep TTL.
const PING_TTL: u8 = 64;

pub fn run(engine: Arc<Engine>, mut tx: impl pingmon_core::IcmpSender, logger: Option<Arc<Mutex<Logger>>>) {
    let inter_send = Duration::from_micros(engine.config.inter_send_us);

    while engine.is_running() {
        // 2. Trace burst against the currently selected target.
        engine.advance_tseq();
        engine.trace.begin_tick();
        if let Some(target) = engine.targets.get(engine.selected()) {
            for ttl in 1..=TTTL {
                let payload = codec::build_echo_request(engine.traceid(), ttl as u16, now_epoch_secs());
                if let Err(e) = tx.send_echo(ttl as u8, target.addr, &payload) {
                    log::warn!("trace probe to {} ttl={ttl} failed: {e}", target.addr);
                }
                thread::sleep(inter_send);
            }
        }

        // 3. Log the previous tick's RTTs, before this tick's shift clears them.
        if engine.seq() > 0 {
            if let Some(logger) = &logger {
                if let Err(e) = logger.lock().expect("logger lock poisoned").log_tick(&engine.targets) {
                    log::warn!("failed to write log tick: {e}");
                }
            }
        }

        // 4. Full ping sweep.
        engine.advance_seq();
        for target in engine.targets.iter() {
            target.with_state(|s| s.shift());
            let payload = codec::build_echo_request(engine.pingid(), engine.seq(), now_epoch_secs());
            if let Err(e) = tx.send_echo(PING_TTL, target.addr, &payload) {
                log::warn!("ping probe to {} failed: {e}", target.addr);
            }
            thread::sleep(inter_send);
        }

        // 5. Sleep out the rest of the tick. The (ntar + tTTL)*pus bound is
        // the load-time admission check (engine.rs); the boundary sleep
        // itself only accounts for the ping sweep just sent.
        let ntar = engine.targets.len() as u64;
        let air_time = ntar * engine.config.inter_send_us;
        thread::sleep(Duration::from_micros(AIR_TIME_BUDGET_US.saturating_sub(air_time)));
        engine.request_repaint();
        let cadence_tail_us = engine.config.cadence_secs.saturating_sub(1) * 1_000_000 + 50_000;
        thread::sleep(Duration::from_micros(cadence_tail_us));

        // 6. Finite-count shutdown.
        if engine.finite_count_reached() {
            engine.stop();
        }
    }
}
