//! Drives one session on a simulated clock and streams its output.
//!
//! Each host tick advances the simulated clock by [`HostConfig::step_ms`],
//! delivers a `tick`, and presses `next` for the athlete once the innermost
//! movement has run for [`HostConfig::leaf_ms`]. New output statements are
//! written as JSON lines.
use std::io::Write;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{debug, info};
use workout_core::Timestamp;
use workout_runtime::{Capability, ManualClock, RuntimeConfig, RuntimeSnapshot, ScriptRuntime};

use crate::config::HostConfig;

pub struct Host<W: Write> {
    runtime: ScriptRuntime,
    clock: ManualClock,
    config: HostConfig,
    out: W,
    cursor: usize,
}

impl<W: Write> Host<W> {
    /// Compiles the configured script and starts it at simulated time zero.
    pub fn new(config: HostConfig, out: W) -> Result<Self> {
        let clock = ManualClock::new(Timestamp::ZERO);
        let (compiler, root) = config.script.compile();
        let mut runtime = ScriptRuntime::builder()
            .config(RuntimeConfig {
                tick_interval_ms: config.tick_ms,
                ..RuntimeConfig::default()
            })
            .clock(clock.clone())
            .compiler(compiler)
            .build();

        runtime.start(&root)?;
        info!(script = %config.script, "Session started");

        let mut host = Self {
            runtime,
            clock,
            config,
            out,
            cursor: 0,
        };
        host.flush()?;
        Ok(host)
    }

    pub fn is_finished(&self) -> bool {
        self.runtime.is_finished()
    }

    pub fn snapshot(&self) -> RuntimeSnapshot {
        self.runtime.snapshot()
    }

    /// Runs one host tick.
    pub fn step(&mut self) -> Result<()> {
        let now = self.clock.advance(self.config.step_ms());
        self.runtime.tick();

        if self.movement_done(now) {
            debug!(at = %now, "Athlete pressed next");
            self.runtime.advance();
        }
        self.flush()
    }

    /// Ticks on a real-time interval until the session finishes. Returns the
    /// number of ticks taken.
    pub async fn run(&mut self) -> Result<u64> {
        let mut interval = tokio::time::interval(Duration::from_millis(self.config.tick_ms));
        let mut ticks = 0;

        while !self.is_finished() {
            if ticks >= self.config.max_ticks {
                bail!("session did not finish within {ticks} ticks");
            }
            interval.tick().await;
            self.step()?;
            ticks += 1;
        }

        info!(ticks, at = %self.runtime.now(), "Session finished");
        Ok(ticks)
    }

    fn movement_done(&self, now: Timestamp) -> bool {
        self.runtime.current().is_some_and(|block| {
            block.has_capability(Capability::LeafCompletion)
                && block
                    .timing()
                    .started_at
                    .is_some_and(|start| now.saturating_since(start) >= self.config.leaf_ms)
        })
    }

    fn flush(&mut self) -> Result<()> {
        for statement in self.runtime.outputs_since(self.cursor) {
            writeln!(self.out, "{}", serde_json::to_string(statement)?)?;
        }
        self.cursor = self.runtime.outputs().len();
        self.out.flush()?;
        Ok(())
    }
}
