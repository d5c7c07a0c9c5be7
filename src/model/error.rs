// ABOUTME: Error types for workflow definition validation
// ABOUTME: Defines structural errors rejected before any execution is created

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Workflow contains no tasks")]
    EmptyWorkflow,

    #[error("Duplicate task id: {task_id}")]
    DuplicateTask { task_id: String },

    #[error("Task '{task_id}' depends on unknown task '{dependency}'")]
    UnknownDependency { task_id: String, dependency: String },

    #[error("Task '{task_id}' depends on itself")]
    SelfDependency { task_id: String },
}

pub type Result<T> = std::result::Result<T, DefinitionError>;
