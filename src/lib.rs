// ABOUTME: Main library module for the flowmill workflow execution engine
// ABOUTME: Exports all core modules and provides the public API

pub mod engine;
pub mod model;
pub mod persistence;
pub mod tasks;

// Re-export commonly used types
pub use engine::{
    EngineConfig, EngineError, EngineStatus, ExecutionStatus, TaskExecution, TaskExecutionStatus,
    WorkflowEngine, WorkflowExecution,
};
pub use model::{DefinitionStatus, TaskDefinition, TaskType, WorkflowDefinition};
pub use persistence::{ExecutionStore, InMemoryStore};
pub use tasks::{TaskHandler, TaskRegistry};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
