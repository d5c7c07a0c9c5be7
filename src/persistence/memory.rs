// ABOUTME: In-memory reference implementation of the execution store
// ABOUTME: Thread-safe HashMaps, suitable for tests and single-process use

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{ExecutionStore, StoreError};
use crate::engine::record::{TaskExecution, WorkflowExecution};
use crate::model::WorkflowDefinition;

/// Stores every record in a keyed map guarded by an async lock. Upserts
/// replace by key, which gives the idempotence the engine relies on when it
/// re-persists a snapshot after a crash or replay.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    definitions: Arc<RwLock<HashMap<String, WorkflowDefinition>>>,
    executions: Arc<RwLock<HashMap<String, WorkflowExecution>>>,
    task_executions: Arc<RwLock<HashMap<String, TaskExecution>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionStore for InMemoryStore {
    async fn upsert_definition(&self, definition: &WorkflowDefinition) -> Result<(), StoreError> {
        let mut definitions = self.definitions.write().await;
        definitions.insert(definition.workflow_id.clone(), definition.clone());
        Ok(())
    }

    async fn load_definition(&self, workflow_id: &str) -> Result<WorkflowDefinition, StoreError> {
        let definitions = self.definitions.read().await;
        definitions
            .get(workflow_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(workflow_id.to_string()))
    }

    async fn list_definitions(&self) -> Result<Vec<WorkflowDefinition>, StoreError> {
        let definitions = self.definitions.read().await;
        Ok(definitions.values().cloned().collect())
    }

    async fn upsert_execution(&self, execution: &WorkflowExecution) -> Result<(), StoreError> {
        let mut executions = self.executions.write().await;
        executions.insert(execution.execution_id.clone(), execution.clone());
        Ok(())
    }

    async fn load_execution(&self, execution_id: &str) -> Result<WorkflowExecution, StoreError> {
        let executions = self.executions.read().await;
        executions
            .get(execution_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(execution_id.to_string()))
    }

    async fn list_executions(&self) -> Result<Vec<WorkflowExecution>, StoreError> {
        let executions = self.executions.read().await;
        Ok(executions.values().cloned().collect())
    }

    async fn upsert_task_execution(&self, record: &TaskExecution) -> Result<(), StoreError> {
        let mut task_executions = self.task_executions.write().await;
        task_executions.insert(record.task_execution_id.clone(), record.clone());
        Ok(())
    }

    async fn list_task_executions(
        &self,
        execution_id: &str,
    ) -> Result<Vec<TaskExecution>, StoreError> {
        let task_executions = self.task_executions.read().await;
        let mut rows: Vec<TaskExecution> = task_executions
            .values()
            .filter(|t| t.workflow_execution_id == execution_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.started_at
                .cmp(&b.started_at)
                .then_with(|| a.task_id.cmp(&b.task_id))
        });
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskDefinition, TaskType};

    #[tokio::test]
    async fn test_definition_roundtrip() {
        let store = InMemoryStore::new();
        let mut definition = WorkflowDefinition::new("wf");
        definition.workflow_id = "wf-1".to_string();
        definition.add_task(TaskDefinition::new("a", TaskType::Action));

        store.upsert_definition(&definition).await.unwrap();
        let loaded = store.load_definition("wf-1").await.unwrap();

        assert_eq!(loaded.name, "wf");
        assert_eq!(loaded.tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_not_found() {
        let store = InMemoryStore::new();
        let result = store.load_execution("nonexistent").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upsert_execution_is_idempotent() {
        let store = InMemoryStore::new();
        let mut execution = WorkflowExecution::new("wf-1");

        store.upsert_execution(&execution).await.unwrap();
        execution.mark_completed(None);
        store.upsert_execution(&execution).await.unwrap();
        store.upsert_execution(&execution).await.unwrap();

        let all = store.list_executions().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_terminal());
    }

    #[tokio::test]
    async fn test_task_executions_filtered_and_ordered() {
        let store = InMemoryStore::new();

        let mut first = TaskExecution::new("a", "exec-1");
        first.mark_running();
        store.upsert_task_execution(&first).await.unwrap();

        let mut second = TaskExecution::new("b", "exec-1");
        second.mark_running();
        store.upsert_task_execution(&second).await.unwrap();

        let other = TaskExecution::new("z", "exec-2");
        store.upsert_task_execution(&other).await.unwrap();

        let rows = store.list_task_executions("exec-1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].task_id, "a");

        // Re-persisting the same row must not duplicate it
        store.upsert_task_execution(&first).await.unwrap();
        let rows = store.list_task_executions("exec-1").await.unwrap();
        assert_eq!(rows.len(), 2);
    }
}
