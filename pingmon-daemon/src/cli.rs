//! Command line surface (C12). Flags that are pure curses-rendering concerns
//! (`--alt-bg`, `--no-hops`, `--reverse`, `--numeric`) are parsed here and
//! carried through so a future UI collaborator has them available, but this
//! binary's console reporter doesn't act on most of them - see C13's doc
//! comment.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(name = "pingmond", version, author, about = "Multi-target ICMP reachability monitor")]
pub struct Opts {
    /// Path to the host list config file.
    #[clap(long, default_value = "pingmon.conf")]
    pub config: PathBuf,

    /// Append per-tick RTT rows and a shutdown summary to this file.
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Stop after this many ping ticks (0 = run until interrupted).
    #[clap(long, default_value_t = 0)]
    pub count: u16,

    /// Seconds between ticks, 1-5.
    #[clap(long, default_value_t = 1)]
    pub cadence: u64,

    /// Microseconds paused between consecutive sends within a tick.
    #[clap(long, default_value_t = 1000)]
    pub pus: u64,

    /// Suppress the loss bell condition.
    #[clap(long)]
    pub silent: bool,

    /// Render numeric RTT glyphs instead of color blocks (UI collaborator concern).
    #[clap(long)]
    pub numeric: bool,

    /// Print the full `Stats` block alongside each target row.
    #[clap(long)]
    pub stats: bool,

    /// Alternate background palette (UI collaborator concern).
    #[clap(long = "alt-bg")]
    pub alt_bg: bool,

    /// Hide the traceroute hop rows (UI collaborator concern).
    #[clap(long = "no-hops")]
    pub no_hops: bool,

    /// Reverse the scrollback direction (UI collaborator concern).
    #[clap(long)]
    pub reverse: bool,
}

impl Opts {
    pub fn cadence_in_range(&self) -> bool {
        (1..=5).contains(&self.cadence)
    }
}
