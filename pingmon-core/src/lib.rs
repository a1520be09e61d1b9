//! `pingmon-core` is the probe engine and time-series/statistics model for
//! an ICMP reachability monitor: packet codec, outcome encoding, ring
//! buffers, statistics, and the target/trace tables that sit behind them.
//!
//! This crate is deliberately transport-independent - it never opens a
//! socket - so the whole data model can be exercised in unit tests without
//! root privileges. `pingmon-daemon` supplies the raw-socket transport, the
//! two worker threads, config/CLI parsing and logging on top of this.

pub mod codec;
pub mod engine;
pub mod error;
pub mod ident;
pub mod outcome;
pub mod ring;
pub mod stats;
pub mod target;
pub mod trace;
pub mod transport;

pub use engine::{Engine, EngineConfig};
pub use error::EngineError;
pub use target::{Target, TargetTable};
pub use trace::{Hop, TraceTable};
pub use transport::{IcmpReceiver, IcmpSender};
