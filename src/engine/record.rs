// ABOUTME: Execution record types for workflow runs and task attempts
// ABOUTME: Records are persisted on every transition and immutable once terminal

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Active,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
    Cancelled,
}

/// One run of a workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub execution_id: String,
    pub workflow_id: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Runtime copy of the definition variables, enriched by task outputs.
    pub variables: HashMap<String, Value>,
    pub task_executions: Vec<TaskExecution>,
    pub result: Option<Value>,
    pub error_message: Option<String>,
}

/// The attempt record for one task within one execution. A single record is
/// upserted across retries; `retry_attempt` counts re-attempts so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExecution {
    pub task_execution_id: String,
    pub task_id: String,
    pub workflow_execution_id: String,
    pub status: TaskExecutionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<Value>,
    pub error_message: Option<String>,
    pub retry_attempt: u32,
}

impl WorkflowExecution {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            execution_id: uuid::Uuid::new_v4().to_string(),
            workflow_id: workflow_id.into(),
            status: ExecutionStatus::Active,
            started_at: Utc::now(),
            completed_at: None,
            variables: HashMap::new(),
            task_executions: Vec::new(),
            result: None,
            error_message: None,
        }
    }

    /// Replace the record with the same id, or append. Keeps re-persisted
    /// snapshots idempotent.
    pub fn upsert_task_execution(&mut self, record: TaskExecution) {
        if let Some(existing) = self
            .task_executions
            .iter_mut()
            .find(|t| t.task_execution_id == record.task_execution_id)
        {
            *existing = record;
        } else {
            self.task_executions.push(record);
        }
    }

    pub fn get_task_execution(&self, task_id: &str) -> Option<&TaskExecution> {
        self.task_executions.iter().find(|t| t.task_id == task_id)
    }

    pub fn mark_completed(&mut self, result: Option<Value>) {
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.result = result;
    }

    pub fn mark_failed(&mut self, error_message: impl Into<String>) {
        self.status = ExecutionStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error_message = Some(error_message.into());
    }

    pub fn mark_cancelled(&mut self) {
        self.status = ExecutionStatus::Cancelled;
        self.completed_at = Some(Utc::now());
    }

    pub fn is_terminal(&self) -> bool {
        self.status != ExecutionStatus::Active
    }
}

impl TaskExecution {
    pub fn new(task_id: impl Into<String>, workflow_execution_id: impl Into<String>) -> Self {
        Self {
            task_execution_id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            workflow_execution_id: workflow_execution_id.into(),
            status: TaskExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
            result: None,
            error_message: None,
            retry_attempt: 0,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = TaskExecutionStatus::Running;
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
    }

    pub fn mark_completed(&mut self, result: Option<Value>) {
        self.status = TaskExecutionStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.result = result;
        self.error_message = None;
    }

    pub fn mark_failed(&mut self, error_message: impl Into<String>) {
        self.status = TaskExecutionStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error_message = Some(error_message.into());
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(
            self.status,
            TaskExecutionStatus::Pending | TaskExecutionStatus::Running
        )
    }

    pub fn is_successful(&self) -> bool {
        self.status == TaskExecutionStatus::Completed
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Active => write!(f, "active"),
            ExecutionStatus::Completed => write!(f, "completed"),
            ExecutionStatus::Failed => write!(f, "failed"),
            ExecutionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::fmt::Display for TaskExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskExecutionStatus::Pending => write!(f, "pending"),
            TaskExecutionStatus::Running => write!(f, "running"),
            TaskExecutionStatus::Completed => write!(f, "completed"),
            TaskExecutionStatus::Failed => write!(f, "failed"),
            TaskExecutionStatus::Skipped => write!(f, "skipped"),
            TaskExecutionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}
