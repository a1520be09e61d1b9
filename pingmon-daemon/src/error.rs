//! The daemon-level error taxonomy (C14), layered on top of
//! `pingmon_core::EngineError`: transport and config errors that only make
//! sense once there's a real socket and a real file on disk.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open a raw ICMP socket (needs CAP_NET_RAW or root): {0}")]
    Open(#[source] io::Error),
    #[error("send failed: {0}")]
    Send(#[source] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("config file {0} is not ASCII text")]
    NotAscii(PathBuf),
    #[error("cannot resolve host {0}")]
    UnresolvableHost(String),
    #[error("config file has no targets")]
    NoTargets,
}

/// Top-level error `main` matches on to print a single-line diagnostic and
/// pick an exit code.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Engine(#[from] pingmon_core::EngineError),
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
