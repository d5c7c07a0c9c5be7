// ABOUTME: Shared fixtures for integration tests
// ABOUTME: Provides test handlers, engine construction, and polling helpers
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use flowmill::engine::{
    EngineConfig, ExecutionContext, Result as EngineResult, RetryPolicy, WorkflowExecution,
};
use flowmill::persistence::InMemoryStore;
use flowmill::tasks::Collaborators;
use flowmill::{EngineError, TaskHandler, TaskRegistry, WorkflowEngine};

static TRACING: Once = Once::new();

/// Opt-in test logging: set RUST_LOG to see engine output while debugging.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Fails the first `succeed_after` calls, then succeeds.
pub struct FlakyHandler {
    pub calls: Arc<AtomicU32>,
    pub succeed_after: u32,
}

#[async_trait]
impl TaskHandler for FlakyHandler {
    fn task_type(&self) -> &'static str {
        "flaky"
    }

    async fn execute(
        &self,
        _task_id: &str,
        _config: &Value,
        _context: &ExecutionContext,
    ) -> EngineResult<Value> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.succeed_after {
            Err(EngineError::System("transient failure".to_string()))
        } else {
            Ok(json!({"succeeded_on_call": call + 1}))
        }
    }
}

/// Sleeps for `sleep_ms` from its config, for timeout tests.
pub struct SlowHandler;

#[async_trait]
impl TaskHandler for SlowHandler {
    fn task_type(&self) -> &'static str {
        "slow"
    }

    async fn execute(
        &self,
        _task_id: &str,
        config: &Value,
        _context: &ExecutionContext,
    ) -> EngineResult<Value> {
        let sleep_ms = config["sleep_ms"].as_u64().unwrap_or(50);
        tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
        Ok(json!({"slept_ms": sleep_ms}))
    }
}

/// An engine with in-memory storage, no retry backoff, the built-in handlers,
/// and the test handlers above.
pub fn test_engine() -> WorkflowEngine {
    init_tracing();
    let mut config = EngineConfig::default();
    config.retry = RetryPolicy::immediate();

    let mut registry = TaskRegistry::with_builtins(Collaborators::default());
    registry.register(Arc::new(FlakyHandler {
        calls: Arc::new(AtomicU32::new(0)),
        succeed_after: 0,
    }));
    registry.register(Arc::new(SlowHandler));

    WorkflowEngine::new(config, Arc::new(InMemoryStore::new()), registry)
}

/// Same as [`test_engine`] but with a caller-owned flaky call counter.
pub fn test_engine_with_flaky(calls: Arc<AtomicU32>, succeed_after: u32) -> WorkflowEngine {
    init_tracing();
    let mut config = EngineConfig::default();
    config.retry = RetryPolicy::immediate();

    let mut registry = TaskRegistry::with_builtins(Collaborators::default());
    registry.register(Arc::new(FlakyHandler {
        calls,
        succeed_after,
    }));
    registry.register(Arc::new(SlowHandler));

    WorkflowEngine::new(config, Arc::new(InMemoryStore::new()), registry)
}

/// Poll until the execution reaches a terminal state.
pub async fn wait_for_terminal(engine: &WorkflowEngine, execution_id: &str) -> WorkflowExecution {
    for _ in 0..500 {
        let execution = engine
            .get_execution(execution_id)
            .await
            .expect("execution should exist");
        if execution.is_terminal() {
            return execution;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("execution {} never reached a terminal state", execution_id);
}
