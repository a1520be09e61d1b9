//! The per-tick RTT log file (C10): one append-mode, line-buffered file,
//! written as plain formatted text (not a binary frame format) so existing
//! tooling that tails the row layout keeps working.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::Local;
use pingmon_core::TargetTable;

pub struct Logger {
    file: BufWriter<File>,
}

impl Logger {
    /// Open (or create) the log file and write the prelude block: one line
    /// per target listing its index, host, and display name.
    pub fn new(path: &Path, targets: &TargetTable) -> io::Result<Self> {
        let file = File::options().create(true).append(true).open(path)?;
        let mut logger = Self {
            file: BufWriter::new(file),
        };
        for (i, target) in targets.iter().enumerate() {
            writeln!(logger.file, "{:3} {:<20} {}", i, target.host, target.name)?;
        }
        logger.file.flush()?;
        Ok(logger)
    }

    /// Write one timestamped row: `ntar` RTT fields, `-1.0` for a target
    /// with no reply this tick.
    pub fn log_tick(&mut self, targets: &TargetTable) -> io::Result<()> {
        write!(self.file, "{}", Local::now().format("%Y-%m-%d-%H:%M:%S"))?;
        for target in targets.iter() {
            let rtt = target.with_state(|s| s.last_rtt_ms).unwrap_or(-1.0);
            write!(self.file, "{rtt:6.1}")?;
        }
        writeln!(self.file)?;
        self.file.flush()
    }

    /// Write the shutdown summary block: one row per target for each of
    /// `Replies`/`Lost`/`Late(>1s)`/`Minimum`/`Average`/`Maximum`/`StdDev`.
    pub fn log_summary(&mut self, targets: &TargetTable) -> io::Result<()> {
        writeln!(self.file, "--- summary ---")?;
        self.summary_row("Replies", targets, |s| s.stats.n() as f64)?;
        self.summary_row("Lost", targets, |s| s.stats.lost() as f64)?;
        self.summary_row("Late(>1s)", targets, |s| s.stats.late() as f64)?;
        self.summary_row("Minimum", targets, |s| s.stats.min().unwrap_or(-1.0))?;
        self.summary_row("Average", targets, |s| s.stats.avg().unwrap_or(-1.0))?;
        self.summary_row("Maximum", targets, |s| s.stats.max().unwrap_or(-1.0))?;
        self.summary_row("StdDev", targets, |s| s.stats.std().unwrap_or(-1.0))?;
        self.file.flush()
    }

    fn summary_row(
        &mut self,
        label: &str,
        targets: &TargetTable,
        value: impl Fn(&pingmon_core::target::TargetState) -> f64,
    ) -> io::Result<()> {
        write!(self.file, "{label:<10}")?;
        for target in targets.iter() {
            let v = target.with_state(|s| value(s));
            write!(self.file, "{v:10.2}")?;
        }
        writeln!(self.file)
    }
}
