//! Run logging: a color console layer plus a per-run log file.
//!
//! The log file lives next to the invocation directory, is truncated once at
//! run start, and is re-headed with the platform, tool version, and start
//! time. Everything emitted through `tracing` is duplicated to both sinks.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Env var controlling log verbosity (tracing filter syntax).
pub const LOG_ENV: &str = "CW_SETUP_LOG";

pub fn init(log_path: &Path, platform_name: &str) -> Result<()> {
    let mut file = File::create(log_path)
        .with_context(|| format!("create log file {}", log_path.display()))?;
    writeln!(
        file,
        "ClinicWave Setup Log - started at epoch {}s",
        now_epoch_secs()?
    )?;
    writeln!(file, "OS: {} ({})", platform_name, std::env::consts::ARCH)?;
    writeln!(file, "cw-setup: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file)?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    let logfile = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(logfile)
        .init();
    Ok(())
}

pub fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("compute timestamp")?
        .as_secs())
}
