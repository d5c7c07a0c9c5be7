// ABOUTME: Engine configuration and retry policy
// ABOUTME: Bounds concurrency, default task timeouts, and retry backoff

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine-wide cap on concurrently running task handlers.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_tasks: usize,
    /// Per-attempt budget for tasks that do not declare their own.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,
    /// Bounded wait when stopping the engine with executions in flight.
    #[serde(default = "default_shutdown_secs")]
    pub shutdown_timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
}

/// Exponential backoff between task re-attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_concurrent() -> usize {
    8
}

fn default_timeout_secs() -> u64 {
    3600
}

fn default_shutdown_secs() -> u64 {
    30
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    300_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: default_max_concurrent(),
            default_timeout_secs: default_timeout_secs(),
            shutdown_timeout_secs: default_shutdown_secs(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl EngineConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl RetryPolicy {
    /// Delay before re-attempt number `attempt` (0-indexed), capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay_ms =
            (self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32)) as u64;
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }

    /// A policy with no waiting between attempts, used in tests.
    pub fn immediate() -> Self {
        Self {
            initial_delay_ms: 0,
            backoff_multiplier: 1.0,
            max_delay_ms: 0,
        }
    }
}
