// ABOUTME: Workflow execution engine module for flowmill
// ABOUTME: Handles dependency resolution, task execution, and run orchestration

pub mod config;
pub mod context;
pub mod dependency;
pub mod error;
pub mod executor;
pub mod facade;
pub mod record;
pub mod runner;

pub use config::{EngineConfig, RetryPolicy};
pub use context::ExecutionContext;
pub use dependency::{DependencyGraph, ExecutionPlan};
pub use error::{EngineError, Result};
pub use executor::TaskExecutor;
pub use facade::{EngineStatus, WorkflowEngine};
pub use record::{ExecutionStatus, TaskExecution, TaskExecutionStatus, WorkflowExecution};
pub use runner::WorkflowRunner;
