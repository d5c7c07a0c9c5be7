// ABOUTME: Timer task handler implementing a pure delay
// ABOUTME: Sleeps for the configured duration, bounded by the task timeout

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::TaskHandler;
use crate::engine::context::ExecutionContext;
use crate::engine::error::{EngineError, Result};

pub struct TimerHandler;

#[derive(Debug, Deserialize)]
struct TimerConfig {
    #[serde(default)]
    duration_ms: Option<u64>,
    #[serde(default)]
    duration_seconds: Option<u64>,
}

#[async_trait]
impl TaskHandler for TimerHandler {
    fn task_type(&self) -> &'static str {
        "timer"
    }

    async fn execute(
        &self,
        task_id: &str,
        config: &Value,
        _context: &ExecutionContext,
    ) -> Result<Value> {
        let config: TimerConfig =
            serde_json::from_value(config.clone()).map_err(|e| EngineError::ConfigError {
                task_id: task_id.to_string(),
                message: format!("invalid timer configuration: {}", e),
            })?;

        let duration = match (config.duration_ms, config.duration_seconds) {
            (Some(ms), _) => Duration::from_millis(ms),
            (None, Some(secs)) => Duration::from_secs(secs),
            (None, None) => {
                return Err(EngineError::ConfigError {
                    task_id: task_id.to_string(),
                    message: "timer requires duration_ms or duration_seconds".to_string(),
                })
            }
        };

        debug!(task_id, ?duration, "Timer task sleeping");
        tokio::time::sleep(duration).await;

        Ok(json!({ "waited_ms": duration.as_millis() as u64 }))
    }
}
