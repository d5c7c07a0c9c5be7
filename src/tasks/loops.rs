// ABOUTME: Loop task handler repeating a nested body over items or a count
// ABOUTME: Each iteration dispatches the body descriptor through the registry

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::container::NestedTask;
use super::TaskHandler;
use crate::engine::context::ExecutionContext;
use crate::engine::error::{EngineError, Result};

pub struct LoopHandler;

#[derive(Debug, Deserialize)]
struct LoopConfig {
    #[serde(default)]
    items: Option<Vec<Value>>,
    #[serde(default)]
    count: Option<u64>,
    body: NestedTask,
}

#[async_trait]
impl TaskHandler for LoopHandler {
    fn task_type(&self) -> &'static str {
        "loop"
    }

    async fn execute(
        &self,
        task_id: &str,
        config: &Value,
        context: &ExecutionContext,
    ) -> Result<Value> {
        let config: LoopConfig =
            serde_json::from_value(config.clone()).map_err(|e| EngineError::ConfigError {
                task_id: task_id.to_string(),
                message: format!("invalid loop configuration: {}", e),
            })?;

        let items: Vec<Value> = match (config.items, config.count) {
            (Some(items), _) => items,
            (None, Some(count)) => (0..count).map(|i| json!(i)).collect(),
            (None, None) => {
                return Err(EngineError::ConfigError {
                    task_id: task_id.to_string(),
                    message: "loop requires items or count".to_string(),
                })
            }
        };

        let mut results = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            // Expose the current item and index to the body config
            let mut body_config = config.body.config.clone();
            if let Value::Object(map) = &mut body_config {
                map.insert("item".to_string(), item);
                map.insert("index".to_string(), json!(index));
            } else if body_config.is_null() {
                body_config = json!({"item": item, "index": index});
            }

            let nested_id = format!("{}[{}]", task_id, index);
            let result = context
                .run_nested(&nested_id, &config.body.task_type, &body_config)
                .await?;
            results.push(result);
        }

        Ok(json!({ "iterations": results.len(), "results": results }))
    }
}
