// ABOUTME: Workflow definition data model for the flowmill engine
// ABOUTME: Defines workflow and task definition structures and their validation

pub mod error;
pub mod task;
pub mod validation;
pub mod workflow;

pub use error::{DefinitionError, Result};
pub use task::{TaskDefinition, TaskType};
pub use workflow::{DefinitionStatus, TriggerConfig, WorkflowDefinition};
