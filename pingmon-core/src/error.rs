//! Fatal-at-init errors the engine itself can detect, independent of any
//! transport. Socket- and config-file-specific errors live in
//! `pingmon-daemon`, which wraps these.

use std::net::Ipv4Addr;

/// Errors the `Engine` can raise while being constructed. All of these are
/// fatal at startup: the caller should print a single-line diagnostic and
/// exit nonzero.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no ping targets configured")]
    NoTargets,

    #[error("duplicate target address {0}")]
    DuplicateAddress(Ipv4Addr),

    #[error(
        "per-tick air time ({budget_us}us) exceeds the 950ms cadence budget \
         ({ntar} targets + {ttl} trace hops at {pus}us spacing)"
    )]
    AirTimeBudgetExceeded {
        ntar: usize,
        ttl: usize,
        pus: u64,
        budget_us: u64,
    },
}
