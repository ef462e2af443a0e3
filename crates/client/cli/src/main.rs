//! Headless workout host.
//!
//! Runs one of the built-in demo scripts on a simulated clock and prints
//! every output statement as a JSON line on stdout. Logs go to stderr.
//!
//! ```bash
//! # 21-15-9, ten simulated seconds per tick
//! cargo run -p workout-cli -- fran
//!
//! # EMOM at 1000x speed, with a log file
//! WORKOUT_SPEED=1000 WORKOUT_LOG_DIR=/tmp/workout cargo run -p workout-cli -- emom
//! ```
mod config;
mod host;
mod scripts;

use std::io;
use std::path::Path;

use anyhow::{Result, anyhow};
use config::HostConfig;
use host::Host;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = HostConfig::from_env();
    if let Some(name) = std::env::args().nth(1) {
        config.script = name
            .parse()
            .map_err(|_| anyhow!("unknown script `{name}` (expected amrap, emom or fran)"))?;
    }

    let _guard = setup_logging(config.log_dir.as_deref())?;
    tracing::info!(
        script = %config.script,
        tick_ms = config.tick_ms,
        speed = config.speed,
        "Starting workout host"
    );

    let mut host = Host::new(config, io::stdout())?;
    host.run().await?;
    Ok(())
}

/// Logs to stderr, and also to `<dir>/workout.log` when a directory is given.
fn setup_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir)?;
    let file_appender = tracing_appender::rolling::never(dir, "workout.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::info!("Log file: {}/workout.log", dir.display());
    Ok(Some(guard))
}
