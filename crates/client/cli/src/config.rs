//! Host configuration read from the environment.
use std::env;
use std::path::PathBuf;

use crate::scripts::Script;

/// Headless host configuration.
#[derive(Clone, Debug)]
pub struct HostConfig {
    /// Demo workout to run.
    pub script: Script,
    /// Real milliseconds between host ticks.
    pub tick_ms: u64,
    /// Simulated milliseconds per real millisecond.
    pub speed: u64,
    /// Simulated time the athlete spends on each movement before `next`.
    pub leaf_ms: u64,
    /// Ticks after which the host gives up on an unfinished session.
    pub max_ticks: u64,
    /// Optional directory for a log file next to stderr logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            script: Script::Fran,
            tick_ms: 100,
            speed: 100,
            leaf_ms: 30_000,
            max_ticks: 100_000,
            log_dir: None,
        }
    }
}

impl HostConfig {
    /// Construct host configuration from environment variables.
    ///
    /// Environment variables:
    /// - `WORKOUT_SCRIPT` - `amrap`, `emom` or `fran` (default: fran)
    /// - `WORKOUT_TICK_MS` - Real milliseconds between ticks (default: 100)
    /// - `WORKOUT_SPEED` - Simulation speed multiplier (default: 100)
    /// - `WORKOUT_LEAF_MS` - Simulated time per movement (default: 30000)
    /// - `WORKOUT_MAX_TICKS` - Safety cap on ticks (default: 100000)
    /// - `WORKOUT_LOG_DIR` - Also write logs to `<dir>/workout.log`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(script) = read_env::<Script>("WORKOUT_SCRIPT") {
            config.script = script;
        }
        if let Some(tick_ms) = read_env::<u64>("WORKOUT_TICK_MS") {
            config.tick_ms = tick_ms.max(1);
        }
        if let Some(speed) = read_env::<u64>("WORKOUT_SPEED") {
            config.speed = speed.max(1);
        }
        if let Some(leaf_ms) = read_env::<u64>("WORKOUT_LEAF_MS") {
            config.leaf_ms = leaf_ms;
        }
        if let Some(max_ticks) = read_env::<u64>("WORKOUT_MAX_TICKS") {
            config.max_ticks = max_ticks;
        }
        config.log_dir = env::var_os("WORKOUT_LOG_DIR").map(PathBuf::from);

        config
    }

    /// Simulated milliseconds covered by one tick.
    pub fn step_ms(&self) -> u64 {
        self.tick_ms.saturating_mul(self.speed)
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
