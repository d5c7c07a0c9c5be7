// ABOUTME: Narrow collaborator interfaces the engine calls out to
// ABOUTME: HTTP, notification delivery, and condition evaluation are injected

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::engine::error::{EngineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpTaskRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpTaskResponse {
    pub status: u16,
    pub body: Value,
}

/// Outbound HTTP capability used by the `webhook` and `api_call` handlers.
/// The engine core carries no transport dependency; implementers bring their
/// own client.
#[async_trait]
pub trait HttpDispatcher: Send + Sync {
    async fn dispatch(&self, request: HttpTaskRequest) -> Result<HttpTaskResponse>;
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub channel: String,
    pub message: String,
    pub recipients: Vec<String>,
}

/// Delivery capability used by the `notification` handler.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: Notification) -> Result<()>;
}

/// Boolean expression evaluation over the execution variables, used by the
/// `condition` handler.
pub trait ConditionEvaluator: Send + Sync {
    fn evaluate(&self, condition: &Value, variables: &HashMap<String, Value>) -> Result<bool>;
}

/// Bundle of collaborator handles passed to `TaskRegistry::with_builtins`.
pub struct Collaborators {
    pub http: Arc<dyn HttpDispatcher>,
    pub notifications: Arc<dyn NotificationSink>,
    pub conditions: Arc<dyn ConditionEvaluator>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            http: Arc::new(DisabledHttpDispatcher),
            notifications: Arc::new(LogNotificationSink),
            conditions: Arc::new(BasicConditionEvaluator),
        }
    }
}

/// Placeholder dispatcher for deployments without an HTTP collaborator.
/// Any webhook/api_call task fails until a real dispatcher is injected.
pub struct DisabledHttpDispatcher;

#[async_trait]
impl HttpDispatcher for DisabledHttpDispatcher {
    async fn dispatch(&self, request: HttpTaskRequest) -> Result<HttpTaskResponse> {
        Err(EngineError::Collaborator(format!(
            "no HTTP dispatcher configured, cannot call {} {}",
            request.method, request.url
        )))
    }
}

/// Default sink that records deliveries in the log stream.
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn deliver(&self, notification: Notification) -> Result<()> {
        info!(
            channel = %notification.channel,
            recipients = notification.recipients.len(),
            "Notification: {}",
            notification.message
        );
        Ok(())
    }
}

/// Default evaluator supporting flat comparisons against the variable map.
///
/// Condition shape: `{"variable": "name", "op": "eq", "value": ...}` with
/// ops `eq`, `ne`, `exists`, `gt`, `lt`. `op` defaults to `eq`.
pub struct BasicConditionEvaluator;

impl ConditionEvaluator for BasicConditionEvaluator {
    fn evaluate(&self, condition: &Value, variables: &HashMap<String, Value>) -> Result<bool> {
        let variable = condition
            .get("variable")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                EngineError::Collaborator("condition is missing 'variable'".to_string())
            })?;
        let op = condition
            .get("op")
            .and_then(Value::as_str)
            .unwrap_or("eq");
        let current = variables.get(variable);

        match op {
            "exists" => Ok(current.is_some()),
            "eq" | "ne" => {
                let expected = condition.get("value").unwrap_or(&Value::Null);
                let equal = current.map(|v| v == expected).unwrap_or(expected.is_null());
                Ok(if op == "eq" { equal } else { !equal })
            }
            "gt" | "lt" => {
                let expected = condition
                    .get("value")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| {
                        EngineError::Collaborator(format!(
                            "condition op '{}' requires a numeric 'value'",
                            op
                        ))
                    })?;
                let actual = current.and_then(Value::as_f64).ok_or_else(|| {
                    EngineError::Collaborator(format!(
                        "variable '{}' is not numeric, cannot apply '{}'",
                        variable, op
                    ))
                })?;
                Ok(if op == "gt" {
                    actual > expected
                } else {
                    actual < expected
                })
            }
            other => Err(EngineError::Collaborator(format!(
                "unsupported condition op '{}'",
                other
            ))),
        }
    }
}
