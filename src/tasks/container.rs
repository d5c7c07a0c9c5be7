// ABOUTME: Parallel and sequence container handlers over nested descriptors
// ABOUTME: Fan-out/fan-in happens inside a single task attempt and budget

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};

use super::TaskHandler;
use crate::engine::context::ExecutionContext;
use crate::engine::error::{EngineError, Result};

/// A nested task descriptor inside a container or loop config. Not a
/// `TaskDefinition`: nested tasks have no dependencies, retries, or records
/// of their own; they live and die with the parent attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct NestedTask {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Deserialize)]
struct ContainerConfig {
    tasks: Vec<NestedTask>,
}

fn parse_container(task_id: &str, task_type: &str, config: &Value) -> Result<Vec<NestedTask>> {
    let config: ContainerConfig =
        serde_json::from_value(config.clone()).map_err(|e| EngineError::ConfigError {
            task_id: task_id.to_string(),
            message: format!("invalid {} configuration: {}", task_type, e),
        })?;
    Ok(config.tasks)
}

fn nested_id(parent: &str, nested: &NestedTask, index: usize) -> String {
    match &nested.id {
        Some(id) => format!("{}.{}", parent, id),
        None => format!("{}[{}]", parent, index),
    }
}

/// Runs every nested task concurrently; fails if any nested task fails.
pub struct ParallelHandler;

#[async_trait]
impl TaskHandler for ParallelHandler {
    fn task_type(&self) -> &'static str {
        "parallel"
    }

    async fn execute(
        &self,
        task_id: &str,
        config: &Value,
        context: &ExecutionContext,
    ) -> Result<Value> {
        let tasks = parse_container(task_id, "parallel", config)?;

        let futures = tasks.iter().enumerate().map(|(index, nested)| {
            let id = nested_id(task_id, nested, index);
            async move {
                context
                    .run_nested(&id, &nested.task_type, &nested.config)
                    .await
            }
        });

        let results: Vec<Value> = join_all(futures)
            .await
            .into_iter()
            .collect::<Result<_>>()?;

        Ok(json!({ "results": results }))
    }
}

/// Runs nested tasks in declaration order, stopping at the first failure.
pub struct SequenceHandler;

#[async_trait]
impl TaskHandler for SequenceHandler {
    fn task_type(&self) -> &'static str {
        "sequence"
    }

    async fn execute(
        &self,
        task_id: &str,
        config: &Value,
        context: &ExecutionContext,
    ) -> Result<Value> {
        let tasks = parse_container(task_id, "sequence", config)?;

        let mut results = Vec::with_capacity(tasks.len());
        for (index, nested) in tasks.iter().enumerate() {
            let id = nested_id(task_id, nested, index);
            let result = context
                .run_nested(&id, &nested.task_type, &nested.config)
                .await?;
            results.push(result);
        }

        Ok(json!({ "results": results }))
    }
}
