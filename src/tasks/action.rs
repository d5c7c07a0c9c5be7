// ABOUTME: Generic action task handler for logging and variable manipulation
// ABOUTME: The default side-effecting step; reads config, writes variables

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::info;

use super::TaskHandler;
use crate::engine::context::ExecutionContext;
use crate::engine::error::{EngineError, Result};

pub struct ActionHandler;

#[derive(Debug, Deserialize, Default)]
struct ActionConfig {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    set_variables: HashMap<String, Value>,
}

#[async_trait]
impl TaskHandler for ActionHandler {
    fn task_type(&self) -> &'static str {
        "action"
    }

    async fn execute(
        &self,
        task_id: &str,
        config: &Value,
        context: &ExecutionContext,
    ) -> Result<Value> {
        let config: ActionConfig = if config.is_null() {
            ActionConfig::default()
        } else {
            serde_json::from_value(config.clone()).map_err(|e| EngineError::ConfigError {
                task_id: task_id.to_string(),
                message: format!("invalid action configuration: {}", e),
            })?
        };

        if let Some(message) = &config.message {
            info!(task_id, "{}", message);
        }

        let mut variables_set = Vec::new();
        for (key, value) in config.set_variables {
            context.set_variable(key.clone(), value).await;
            variables_set.push(key);
        }
        variables_set.sort();

        Ok(json!({
            "logged": config.message.is_some(),
            "variables_set": variables_set,
        }))
    }
}
