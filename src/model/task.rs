// ABOUTME: Task definition structures and handler selection tags
// ABOUTME: A task definition describes one unit of work inside a workflow

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Static description of one unit of work inside a workflow. Immutable once
/// the owning workflow version is published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub task_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Opaque parameters interpreted by the registered handler.
    #[serde(default)]
    pub config: Value,
    /// Task ids that must reach `completed` before this task is ready.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Maximum number of re-attempts after the first failure.
    #[serde(default)]
    pub retry_count: u32,
    /// Per-attempt execution budget. Falls back to the engine default.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Handler selection tag. The built-in variants cover the handlers shipped
/// in `tasks/`; `Custom` addresses handlers registered by the embedding
/// application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Action,
    Condition,
    Loop,
    Parallel,
    Sequence,
    Timer,
    Webhook,
    ApiCall,
    DataTransform,
    Notification,
    #[serde(untagged)]
    Custom(String),
}

impl TaskDefinition {
    pub fn new(task_id: impl Into<String>, task_type: TaskType) -> Self {
        let task_id = task_id.into();
        Self {
            name: task_id.clone(),
            task_id,
            task_type,
            config: Value::Null,
            dependencies: Vec::new(),
            retry_count: 0,
            timeout_seconds: None,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }
}

impl TaskType {
    pub fn as_str(&self) -> &str {
        match self {
            TaskType::Action => "action",
            TaskType::Condition => "condition",
            TaskType::Loop => "loop",
            TaskType::Parallel => "parallel",
            TaskType::Sequence => "sequence",
            TaskType::Timer => "timer",
            TaskType::Webhook => "webhook",
            TaskType::ApiCall => "api_call",
            TaskType::DataTransform => "data_transform",
            TaskType::Notification => "notification",
            TaskType::Custom(tag) => tag,
        }
    }

    pub fn custom(tag: impl Into<String>) -> Self {
        TaskType::Custom(tag.into())
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
