//! Tracing initialization.
//!
//! Diagnostics go to stderr so stdout stays the user-facing report. The level
//! is `debug` with `--verbose` and `warn` otherwise; `RUST_LOG` wins when set.

use anyhow::Result;
use chrono::Local;
use std::fmt as stdfmt;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;

/// Local wall-clock timestamps (HH:MM:SS).
struct LocalHumanTime;

impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%H:%M:%S"))
    }
}

pub fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = tsfmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalHumanTime)
        .with_level(true)
        .with_target(false)
        .compact();
    registry().with(env_filter).with(stderr_layer).try_init()?;
    Ok(())
}
