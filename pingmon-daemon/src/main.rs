mod cli;
mod config;
mod console;
mod error;
mod logger;
mod receiver;
mod sender;
mod socket;
mod time;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use clap::Parser;
use pingmon_core::{Engine, EngineConfig, Target, TargetTable};

use crate::error::DaemonError;
use crate::logger::Logger;

/// Grace window after shutdown is signalled, before final statistics are
/// written, giving in-flight replies a chance to land.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn main() -> ExitCode {
    env_logger::init();
    let opts = cli::Opts::parse();

    if !opts.cadence_in_range() {
        eprintln!("pingmond: --cadence must be between 1 and 5 seconds");
        return ExitCode::FAILURE;
    }

    match run(opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pingmond: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(opts: cli::Opts) -> Result<(), DaemonError> {
    let config_targets = config::load(&opts.config)?;
    let mut targets = Vec::with_capacity(config_targets.len());
    for ct in &config_targets {
        let addr = config::resolve(ct)?;
        targets.push(Target::new(
            ct.display_name.clone(),
            ct.host.clone(),
            addr,
            ct.header.clone(),
        ));
    }
    let table = TargetTable::new(targets)?;

    let engine_config = EngineConfig {
        cadence_secs: opts.cadence,
        inter_send_us: opts.pus,
        finite_count: opts.count,
    };
    let engine = Arc::new(Engine::new(table, engine_config, std::process::id())?);

    for target in engine.targets.iter() {
        target.set_silent(opts.silent);
    }

    let logger = open_logger(opts.output.clone(), &engine)?;
    let (tx, rx) = socket::open()?;

    let sender_engine = Arc::clone(&engine);
    let sender_logger = logger.as_ref().map(|(_, l)| Arc::clone(l));
    let sender_handle = thread::spawn(move || sender::run(sender_engine, tx, sender_logger));

    let receiver_engine = Arc::clone(&engine);
    // Detached rather than joined: a Layer3 raw socket read has no portable
    // way to be interrupted from another thread, so the receiver is simply
    // torn down (here: along with the whole process) once there is nothing
    // left to read for.
    let _receiver_handle = thread::spawn(move || receiver::run(receiver_engine, rx));

    let reporter = console::ConsoleReporter::new(opts.stats, !opts.no_hops);
    while engine.is_running() {
        if engine.take_repaint() {
            reporter.render(&engine);
        }
        thread::sleep(Duration::from_millis(50));
    }

    thread::sleep(SHUTDOWN_GRACE);
    sender_handle.join().expect("sender thread panicked");

    if let Some((path, logger)) = &logger {
        logger
            .lock()
            .expect("logger lock poisoned")
            .log_summary(&engine.targets)
            .map_err(|source| DaemonError::LogFile {
                path: path.clone(),
                source,
            })?;
    }

    Ok(())
}

type OpenLogger = Option<(PathBuf, Arc<Mutex<Logger>>)>;

fn open_logger(output: Option<PathBuf>, engine: &Engine) -> Result<OpenLogger, DaemonError> {
    let Some(path) = output else {
        return Ok(None);
    };
    let logger = Logger::new(&path, &engine.targets).map_err(|source| DaemonError::LogFile {
        path: path.clone(),
        source,
    })?;
    Ok(Some((path, Arc::new(Mutex::new(logger)))))
}
