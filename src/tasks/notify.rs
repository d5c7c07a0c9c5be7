// ABOUTME: Notification task handler delegating to the injected sink
// ABOUTME: The engine records delivery outcome; transport lives elsewhere

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::collab::{Notification, NotificationSink};
use super::TaskHandler;
use crate::engine::context::ExecutionContext;
use crate::engine::error::{EngineError, Result};

pub struct NotificationHandler {
    sink: Arc<dyn NotificationSink>,
}

#[derive(Debug, Deserialize)]
struct NotificationConfig {
    message: String,
    #[serde(default = "default_channel")]
    channel: String,
    #[serde(default)]
    recipients: Vec<String>,
}

fn default_channel() -> String {
    "default".to_string()
}

impl NotificationHandler {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl TaskHandler for NotificationHandler {
    fn task_type(&self) -> &'static str {
        "notification"
    }

    async fn execute(
        &self,
        task_id: &str,
        config: &Value,
        _context: &ExecutionContext,
    ) -> Result<Value> {
        let config: NotificationConfig =
            serde_json::from_value(config.clone()).map_err(|e| EngineError::ConfigError {
                task_id: task_id.to_string(),
                message: format!("invalid notification configuration: {}", e),
            })?;

        let channel = config.channel.clone();
        let recipient_count = config.recipients.len();

        self.sink
            .deliver(Notification {
                channel: config.channel,
                message: config.message,
                recipients: config.recipients,
            })
            .await?;

        Ok(json!({
            "delivered": true,
            "channel": channel,
            "recipients": recipient_count,
        }))
    }
}
