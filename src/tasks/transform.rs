// ABOUTME: Data transform task handler for map/filter/count over input data
// ABOUTME: Operates purely on config.input_data; no external collaborators

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::TaskHandler;
use crate::engine::context::ExecutionContext;
use crate::engine::error::{EngineError, Result};

pub struct DataTransformHandler;

#[derive(Debug, Deserialize)]
struct TransformConfig {
    input_data: Vec<Value>,
    #[serde(default = "default_operation")]
    operation: String,
    /// Field projected by `map` or compared by `filter`.
    #[serde(default)]
    field: Option<String>,
    /// Expected field value for `filter`.
    #[serde(default)]
    equals: Option<Value>,
}

fn default_operation() -> String {
    "map".to_string()
}

#[async_trait]
impl TaskHandler for DataTransformHandler {
    fn task_type(&self) -> &'static str {
        "data_transform"
    }

    async fn execute(
        &self,
        task_id: &str,
        config: &Value,
        _context: &ExecutionContext,
    ) -> Result<Value> {
        let config: TransformConfig =
            serde_json::from_value(config.clone()).map_err(|e| EngineError::ConfigError {
                task_id: task_id.to_string(),
                message: format!("invalid data_transform configuration: {}", e),
            })?;

        let output: Vec<Value> = match config.operation.as_str() {
            "map" => {
                let field = require_field(task_id, &config, "map")?;
                config
                    .input_data
                    .iter()
                    .map(|item| item.get(field).cloned().unwrap_or(Value::Null))
                    .collect()
            }
            "filter" => {
                let field = require_field(task_id, &config, "filter")?;
                let expected = config.equals.clone().unwrap_or(Value::Null);
                config
                    .input_data
                    .iter()
                    .filter(|item| item.get(field) == Some(&expected))
                    .cloned()
                    .collect()
            }
            "count" => Vec::new(),
            other => {
                return Err(EngineError::ConfigError {
                    task_id: task_id.to_string(),
                    message: format!("unsupported data_transform operation '{}'", other),
                })
            }
        };

        let count = if config.operation == "count" {
            config.input_data.len()
        } else {
            output.len()
        };

        Ok(json!({ "output_data": output, "count": count }))
    }
}

fn require_field<'a>(
    task_id: &str,
    config: &'a TransformConfig,
    operation: &str,
) -> Result<&'a str> {
    config
        .field
        .as_deref()
        .ok_or_else(|| EngineError::ConfigError {
            task_id: task_id.to_string(),
            message: format!("data_transform '{}' requires a field", operation),
        })
}
