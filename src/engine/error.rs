// ABOUTME: Error types for workflow engine operations
// ABOUTME: Covers definition rejection, lookup failures, and execution faults

use std::time::Duration;
use thiserror::Error;

use crate::model::DefinitionError;
use crate::persistence::StoreError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid workflow definition: {0}")]
    InvalidDefinition(#[from] DefinitionError),

    #[error("Circular dependency detected: {tasks:?}")]
    CircularDependency { tasks: Vec<String> },

    #[error("Dependency graph cannot be progressed, remaining tasks: {remaining:?}")]
    DependencyUnresolvable { remaining: Vec<String> },

    #[error("Workflow not found: {workflow_id}")]
    WorkflowNotFound { workflow_id: String },

    #[error("Execution not found: {execution_id}")]
    ExecutionNotFound { execution_id: String },

    #[error("No handler registered for task type '{task_type}'")]
    UnknownTaskType { task_type: String },

    #[error("Task '{task_id}' timed out after {timeout:?}")]
    TaskTimeout { task_id: String, timeout: Duration },

    #[error("Task '{task_id}' failed: {message}")]
    TaskFailed { task_id: String, message: String },

    #[error("Configuration error for task '{task_id}': {message}")]
    ConfigError { task_id: String, message: String },

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Engine error: {0}")]
    System(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
