// ABOUTME: Built-in task handler implementations and the handler registry
// ABOUTME: Maps task-type tags to executable handlers; new types register here

pub mod action;
pub mod collab;
pub mod condition;
pub mod container;
pub mod http;
pub mod loops;
pub mod notify;
pub mod timer;
pub mod transform;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::context::ExecutionContext;
use crate::engine::error::{EngineError, Result};

pub use collab::{
    BasicConditionEvaluator, Collaborators, ConditionEvaluator, DisabledHttpDispatcher,
    HttpDispatcher, HttpTaskRequest, HttpTaskResponse, LogNotificationSink, Notification,
    NotificationSink,
};

/// A polymorphic task implementation. Handlers are pure with respect to the
/// engine: they read `config` and the context variables and return a result
/// map; all bookkeeping (timeouts, retries, persistence) happens outside.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    fn task_type(&self) -> &'static str;

    async fn execute(&self, task_id: &str, config: &Value, context: &ExecutionContext)
        -> Result<Value>;
}

pub struct TaskRegistry {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
}

impl TaskRegistry {
    /// An empty registry. Callers register handlers explicitly.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry with every built-in handler, wired to the given
    /// collaborators.
    pub fn with_builtins(collaborators: Collaborators) -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(action::ActionHandler));
        registry.register(Arc::new(condition::ConditionHandler::new(
            collaborators.conditions,
        )));
        registry.register(Arc::new(loops::LoopHandler));
        registry.register(Arc::new(container::ParallelHandler));
        registry.register(Arc::new(container::SequenceHandler));
        registry.register(Arc::new(timer::TimerHandler));
        registry.register(Arc::new(http::WebhookHandler::new(Arc::clone(
            &collaborators.http,
        ))));
        registry.register(Arc::new(http::ApiCallHandler::new(collaborators.http)));
        registry.register(Arc::new(transform::DataTransformHandler));
        registry.register(Arc::new(notify::NotificationHandler::new(
            collaborators.notifications,
        )));

        registry
    }

    pub fn register(&mut self, handler: Arc<dyn TaskHandler>) {
        self.handlers
            .insert(handler.task_type().to_string(), handler);
    }

    pub fn get(&self, task_type: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(task_type).map(Arc::clone)
    }

    pub fn contains(&self, task_type: &str) -> bool {
        self.handlers.contains_key(task_type)
    }

    pub async fn execute(
        &self,
        task_id: &str,
        task_type: &str,
        config: &Value,
        context: &ExecutionContext,
    ) -> Result<Value> {
        match self.get(task_type) {
            Some(handler) => handler.execute(task_id, config, context).await,
            None => Err(EngineError::UnknownTaskType {
                task_type: task_type.to_string(),
            }),
        }
    }

    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::with_builtins(Collaborators::default())
    }
}
