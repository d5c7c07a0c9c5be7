// ABOUTME: Storage contract for workflow definitions and execution records
// ABOUTME: All three collections support idempotent upsert-by-key for crash replay

pub mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;

use crate::engine::record::{TaskExecution, WorkflowExecution};
use crate::model::WorkflowDefinition;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Durable storage for workflow definitions, workflow-execution records,
/// and task-execution records.
///
/// Implementations must be safe to call concurrently from multiple in-flight
/// executions; rows are keyed per execution and never shared across them, so
/// no global lock is assumed by the engine. Upserts are idempotent:
/// re-persisting the same record after a crash replaces the stored row
/// rather than duplicating it.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn upsert_definition(&self, definition: &WorkflowDefinition) -> Result<(), StoreError>;

    async fn load_definition(&self, workflow_id: &str) -> Result<WorkflowDefinition, StoreError>;

    async fn list_definitions(&self) -> Result<Vec<WorkflowDefinition>, StoreError>;

    async fn upsert_execution(&self, execution: &WorkflowExecution) -> Result<(), StoreError>;

    async fn load_execution(&self, execution_id: &str) -> Result<WorkflowExecution, StoreError>;

    async fn list_executions(&self) -> Result<Vec<WorkflowExecution>, StoreError>;

    async fn upsert_task_execution(&self, record: &TaskExecution) -> Result<(), StoreError>;

    /// All task-execution rows for one execution, ordered by start time.
    async fn list_task_executions(
        &self,
        execution_id: &str,
    ) -> Result<Vec<TaskExecution>, StoreError>;
}
