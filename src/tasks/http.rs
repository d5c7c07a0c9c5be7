// ABOUTME: Webhook and API-call task handlers for outbound HTTP-style calls
// ABOUTME: Both delegate transport to the injected HttpDispatcher collaborator

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::collab::{HttpDispatcher, HttpTaskRequest};
use super::TaskHandler;
use crate::engine::context::ExecutionContext;
use crate::engine::error::{EngineError, Result};

#[derive(Debug, Deserialize)]
struct HttpCallConfig {
    url: String,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: Option<Value>,
}

async fn dispatch_call(
    dispatcher: &dyn HttpDispatcher,
    task_id: &str,
    task_type: &str,
    default_method: &str,
    config: &Value,
) -> Result<Value> {
    let config: HttpCallConfig =
        serde_json::from_value(config.clone()).map_err(|e| EngineError::ConfigError {
            task_id: task_id.to_string(),
            message: format!("invalid {} configuration: {}", task_type, e),
        })?;

    let request = HttpTaskRequest {
        method: config
            .method
            .unwrap_or_else(|| default_method.to_string())
            .to_uppercase(),
        url: config.url,
        headers: config.headers,
        body: config.body,
    };

    info!(task_id, method = %request.method, url = %request.url, "Dispatching HTTP call");
    let response = dispatcher.dispatch(request).await?;

    Ok(json!({ "status": response.status, "body": response.body }))
}

/// Fire-and-record outbound webhook. Defaults to POST.
pub struct WebhookHandler {
    dispatcher: Arc<dyn HttpDispatcher>,
}

impl WebhookHandler {
    pub fn new(dispatcher: Arc<dyn HttpDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl TaskHandler for WebhookHandler {
    fn task_type(&self) -> &'static str {
        "webhook"
    }

    async fn execute(
        &self,
        task_id: &str,
        config: &Value,
        _context: &ExecutionContext,
    ) -> Result<Value> {
        dispatch_call(self.dispatcher.as_ref(), task_id, "webhook", "POST", config).await
    }
}

/// Request/response API call. Defaults to GET.
pub struct ApiCallHandler {
    dispatcher: Arc<dyn HttpDispatcher>,
}

impl ApiCallHandler {
    pub fn new(dispatcher: Arc<dyn HttpDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl TaskHandler for ApiCallHandler {
    fn task_type(&self) -> &'static str {
        "api_call"
    }

    async fn execute(
        &self,
        task_id: &str,
        config: &Value,
        _context: &ExecutionContext,
    ) -> Result<Value> {
        dispatch_call(self.dispatcher.as_ref(), task_id, "api_call", "GET", config).await
    }
}
