// ABOUTME: Execution context shared by one run's task handlers
// ABOUTME: Provides variable access, output merge, and nested task dispatch

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::error::Result;
use crate::tasks::TaskRegistry;

/// Runtime context visible to task handlers during one execution.
///
/// The variable map is owned exclusively by this execution's runner; handlers
/// in the same ready generation share it through this handle. The engine does
/// not resolve conflicting writes to the same key within one generation --
/// avoiding that is a caller responsibility when authoring the workflow.
#[derive(Clone)]
pub struct ExecutionContext {
    pub workflow_id: String,
    pub execution_id: String,
    variables: Arc<RwLock<HashMap<String, Value>>>,
    registry: Arc<TaskRegistry>,
}

impl ExecutionContext {
    pub fn new(
        workflow_id: impl Into<String>,
        execution_id: impl Into<String>,
        variables: HashMap<String, Value>,
        registry: Arc<TaskRegistry>,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            execution_id: execution_id.into(),
            variables: Arc::new(RwLock::new(variables)),
            registry,
        }
    }

    pub async fn get_variable(&self, key: &str) -> Option<Value> {
        let variables = self.variables.read().await;
        variables.get(key).cloned()
    }

    pub async fn set_variable(&self, key: impl Into<String>, value: Value) {
        let mut variables = self.variables.write().await;
        variables.insert(key.into(), value);
    }

    pub async fn variables_snapshot(&self) -> HashMap<String, Value> {
        let variables = self.variables.read().await;
        variables.clone()
    }

    /// Write a finished task's output back into the variable space under the
    /// task's id, making it visible to downstream tasks.
    pub async fn merge_output(&self, task_id: &str, output: &Value) {
        if output.is_null() {
            return;
        }
        let mut variables = self.variables.write().await;
        variables.insert(task_id.to_string(), output.clone());
    }

    /// Dispatch a nested task descriptor through the registry. Used by the
    /// container and loop handlers; the nested task runs inline within the
    /// parent task's attempt and budget.
    pub async fn run_nested(&self, task_id: &str, task_type: &str, config: &Value) -> Result<Value> {
        self.registry.execute(task_id, task_type, config, self).await
    }
}
