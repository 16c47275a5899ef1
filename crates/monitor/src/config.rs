use std::time::Duration;

use fleetwatch_core::error::CoreError;

/// Default seconds between heartbeat sweeps; also the Active/Late boundary.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 5;

/// Default minutes of silence before a node is declared dead.
pub const DEFAULT_DEAD_THRESHOLD_MINUTES: u64 = 5;

/// A session untouched for longer than this is expired by the sweep.
pub const STEP_STALENESS_SECS: i64 = 15;

/// The step index that marks a task as finished.
pub const TERMINAL_STEP: i64 = 6;

/// Period of the session-staleness and traffic sweep.
pub const SWEEP_TICK_SECS: u64 = 60;

/// Capacity of the inbound report queue.
pub const INGESTION_QUEUE_CAPACITY: usize = 10_000;

/// Capacity of the outbound subscriber queue.
pub const BROADCAST_BUFFER_CAPACITY: usize = 1024;

/// Monitoring engine configuration.
///
/// Only the heartbeat interval and dead threshold are tunable at runtime;
/// the rest are fixed by the reporting protocol and start at their
/// constants.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Seconds between heartbeat sweeps, and the Active/Late boundary.
    pub heartbeat_interval_secs: u64,
    /// Minutes of silence before a node is Dead.
    pub dead_threshold_minutes: u64,
    pub step_staleness_secs: i64,
    pub terminal_step: i64,
    pub sweep_tick_secs: u64,
    pub ingestion_queue_capacity: usize,
    pub broadcast_buffer_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            dead_threshold_minutes: DEFAULT_DEAD_THRESHOLD_MINUTES,
            step_staleness_secs: STEP_STALENESS_SECS,
            terminal_step: TERMINAL_STEP,
            sweep_tick_secs: SWEEP_TICK_SECS,
            ingestion_queue_capacity: INGESTION_QUEUE_CAPACITY,
            broadcast_buffer_capacity: BROADCAST_BUFFER_CAPACITY,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default |
    /// |----------------------------------|---------|
    /// | `HEARTBEAT_CHECK_INTERVAL_SECS`  | `5`     |
    /// | `DEAD_THRESHOLD_MINUTES`         | `5`     |
    ///
    /// Unparseable or zero values fall back to the default.
    pub fn from_env() -> Self {
        Self {
            heartbeat_interval_secs: positive_env(
                "HEARTBEAT_CHECK_INTERVAL_SECS",
                DEFAULT_HEARTBEAT_INTERVAL_SECS,
            ),
            dead_threshold_minutes: positive_env(
                "DEAD_THRESHOLD_MINUTES",
                DEFAULT_DEAD_THRESHOLD_MINUTES,
            ),
            ..Self::default()
        }
    }

    /// Reject settings the schedulers cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.heartbeat_interval_secs == 0 {
            return Err(CoreError::Validation(
                "Heartbeat interval must be at least one second".to_string(),
            ));
        }
        if self.sweep_tick_secs == 0 {
            return Err(CoreError::Validation(
                "Sweep tick must be at least one second".to_string(),
            ));
        }
        if self.ingestion_queue_capacity == 0 || self.broadcast_buffer_capacity == 0 {
            return Err(CoreError::Validation(
                "Queue capacities must be non-zero".to_string(),
            ));
        }
        let interval_secs = i64::try_from(self.heartbeat_interval_secs).unwrap_or(i64::MAX);
        if self.dead_after_secs() <= interval_secs {
            tracing::warn!(
                heartbeat_interval_secs = self.heartbeat_interval_secs,
                dead_threshold_minutes = self.dead_threshold_minutes,
                "Dead threshold does not exceed the heartbeat interval; nodes will never be Late",
            );
        }
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn sweep_tick(&self) -> Duration {
        Duration::from_secs(self.sweep_tick_secs)
    }

    /// Seconds of silence after which a node is Dead.
    pub fn dead_after_secs(&self) -> i64 {
        i64::try_from(self.dead_threshold_minutes.saturating_mul(60)).unwrap_or(i64::MAX)
    }
}

fn positive_env(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(v) if v > 0 => v,
            _ => {
                tracing::warn!(key, value = %raw, default, "Invalid setting, using default");
                default
            }
        },
        Err(_) => default,
    }
}
