//! Wall-clock time as the `f64` seconds-since-epoch that the wire format
//! (§6) embeds in every probe payload. `pingmon-core` never reads the
//! clock itself - it only carries these doubles around - so this is the
//! one place in the daemon that calls `SystemTime::now`.

use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs_f64()
}
