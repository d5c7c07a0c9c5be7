// ABOUTME: Single-task execution with timeout, retry, and durable transitions
// ABOUTME: Every status change is persisted before dependents may proceed

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use super::config::{EngineConfig, RetryPolicy};
use super::context::ExecutionContext;
use super::error::{EngineError, Result};
use super::record::TaskExecution;
use crate::model::TaskDefinition;
use crate::persistence::ExecutionStore;
use crate::tasks::TaskRegistry;

pub struct TaskExecutor {
    registry: Arc<TaskRegistry>,
    store: Arc<dyn ExecutionStore>,
    semaphore: Arc<Semaphore>,
    default_timeout: Duration,
    retry: RetryPolicy,
}

impl TaskExecutor {
    pub fn new(
        registry: Arc<TaskRegistry>,
        store: Arc<dyn ExecutionStore>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            registry,
            store,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_tasks)),
            default_timeout: config.default_timeout(),
            retry: config.retry.clone(),
        }
    }

    /// Execute one task to a terminal record. Handler failures and timeouts
    /// are captured inside the returned record; only persistence failures
    /// surface as `Err`.
    pub async fn execute(
        &self,
        task: &TaskDefinition,
        context: &ExecutionContext,
    ) -> Result<TaskExecution> {
        let mut record = TaskExecution::new(&task.task_id, &context.execution_id);

        // A missing handler is a definition error; retrying cannot fix it.
        let handler = match self.registry.get(task.task_type.as_str()) {
            Some(handler) => handler,
            None => {
                let message = EngineError::UnknownTaskType {
                    task_type: task.task_type.as_str().to_string(),
                }
                .to_string();
                error!(task_id = %task.task_id, "{}", message);
                record.mark_failed(message);
                self.store.upsert_task_execution(&record).await?;
                return Ok(record);
            }
        };

        let timeout_budget = task
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);
        let max_attempts = task.retry_count + 1;

        for attempt in 0..max_attempts {
            record.retry_attempt = attempt;

            // The concurrency slot is held only while the handler runs and
            // released before any backoff wait, so a retrying task does not
            // starve unrelated work.
            let failure = {
                let _permit = self
                    .semaphore
                    .acquire()
                    .await
                    .map_err(|_| EngineError::System("semaphore closed".to_string()))?;

                record.mark_running();
                self.store.upsert_task_execution(&record).await?;

                info!(
                    task_id = %task.task_id,
                    task_type = %task.task_type,
                    attempt = attempt + 1,
                    max_attempts,
                    "Executing task"
                );

                let outcome = timeout(
                    timeout_budget,
                    handler.execute(&task.task_id, &task.config, context),
                )
                .await;

                match outcome {
                    Ok(Ok(output)) => {
                        context.merge_output(&task.task_id, &output).await;
                        record.mark_completed(Some(output));
                        self.store.upsert_task_execution(&record).await?;
                        debug!(task_id = %task.task_id, "Task completed");
                        return Ok(record);
                    }
                    Ok(Err(e)) => e.to_string(),
                    Err(_) => EngineError::TaskTimeout {
                        task_id: task.task_id.clone(),
                        timeout: timeout_budget,
                    }
                    .to_string(),
                }
            };

            warn!(
                task_id = %task.task_id,
                attempt = attempt + 1,
                "Task attempt failed: {}",
                failure
            );
            record.mark_failed(failure);
            self.store.upsert_task_execution(&record).await?;

            if attempt + 1 < max_attempts {
                let delay = self.retry.delay_for(attempt);
                if !delay.is_zero() {
                    debug!(task_id = %task.task_id, ?delay, "Waiting before retry");
                    sleep(delay).await;
                }
            }
        }

        error!(
            task_id = %task.task_id,
            attempts = max_attempts,
            "Task failed permanently: {:?}",
            record.error_message
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::record::TaskExecutionStatus;
    use crate::model::TaskType;
    use crate::persistence::InMemoryStore;
    use crate::tasks::TaskHandler;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyHandler {
        calls: Arc<AtomicU32>,
        succeed_after: u32,
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
        ) -> crate::engine::error::Result<Value> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.succeed_after {
                Err(crate::engine::error::EngineError::System(
                    "transient failure".to_string(),
                ))
            } else {
                Ok(json!({"ok": true}))
            }
        }
    }

    fn fixture(
        handler: Option<Arc<dyn TaskHandler>>,
    ) -> (TaskExecutor, ExecutionContext, Arc<InMemoryStore>) {
        let mut registry = TaskRegistry::new();
        if let Some(handler) = handler {
            registry.register(handler);
        }
        let registry = Arc::new(registry);
        let store = Arc::new(InMemoryStore::new());

        let mut config = EngineConfig::default();
        config.retry = RetryPolicy::immediate();

        let executor = TaskExecutor::new(
            Arc::clone(&registry),
            Arc::clone(&store) as Arc<dyn ExecutionStore>,
            &config,
        );
        let context = ExecutionContext::new("wf-1", "exec-1", HashMap::new(), registry);
        (executor, context, store)
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let handler = Arc::new(FlakyHandler {
            calls: Arc::clone(&calls),
            succeed_after: 2,
        });
        let (executor, context, _store) = fixture(Some(handler));

        let task = TaskDefinition::new("t1", TaskType::custom("flaky")).with_retry_count(3);
        let record = executor.execute(&task, &context).await.unwrap();

        assert_eq!(record.status, TaskExecutionStatus::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(record.retry_attempt, 2);
        // Success output was merged into the variable space
        assert_eq!(
            context.get_variable("t1").await,
            Some(json!({"ok": true}))
        );
    }

    #[tokio::test]
    async fn test_retries_exhausted_keeps_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let handler = Arc::new(FlakyHandler {
            calls: Arc::clone(&calls),
            succeed_after: u32::MAX,
        });
        let (executor, context, store) = fixture(Some(handler));

        let task = TaskDefinition::new("t1", TaskType::custom("flaky")).with_retry_count(1);
        let record = executor.execute(&task, &context).await.unwrap();

        assert_eq!(record.status, TaskExecutionStatus::Failed);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(record.retry_attempt, 1);
        assert!(record
            .error_message
            .as_ref()
            .unwrap()
            .contains("transient failure"));

        // One upserted row, not one per attempt
        let rows = store.list_task_executions("exec-1").await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_backoff_does_not_hold_concurrency_slot() {
        // One slot, a long backoff on the failing task: an unrelated task
        // submitted during the backoff must run immediately.
        let mut registry = TaskRegistry::new();
        registry.register(Arc::new(FlakyHandler {
            calls: Arc::new(AtomicU32::new(0)),
            succeed_after: u32::MAX,
        }));
        registry.register(Arc::new(crate::tasks::action::ActionHandler));
        let registry = Arc::new(registry);
        let store = Arc::new(InMemoryStore::new());

        let mut config = EngineConfig::default();
        config.max_concurrent_tasks = 1;
        config.retry = RetryPolicy {
            initial_delay_ms: 500,
            backoff_multiplier: 1.0,
            max_delay_ms: 500,
        };

        let executor = TaskExecutor::new(
            Arc::clone(&registry),
            Arc::clone(&store) as Arc<dyn ExecutionStore>,
            &config,
        );
        let context = ExecutionContext::new("wf-1", "exec-1", HashMap::new(), registry);

        let retrying = TaskDefinition::new("stuck", TaskType::custom("flaky")).with_retry_count(1);
        let fast = TaskDefinition::new("quick", TaskType::Action);

        let retrying_run = executor.execute(&retrying, &context);
        let fast_run = async {
            // Land inside the retrying task's backoff window
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            let started = tokio::time::Instant::now();
            let record = executor.execute(&fast, &context).await.unwrap();
            (record, started.elapsed())
        };

        let (retried, (fast_record, waited)) = tokio::join!(retrying_run, fast_run);

        assert_eq!(retried.unwrap().status, TaskExecutionStatus::Failed);
        assert!(fast_record.is_successful());
        assert!(
            waited < std::time::Duration::from_millis(300),
            "fast task waited {:?} for a slot held through backoff",
            waited
        );
    }

    #[tokio::test]
    async fn test_unknown_task_type_fails_without_retry() {
        let (executor, context, store) = fixture(None);
        let mut task = TaskDefinition::new("orphan", TaskType::Webhook);
        task.retry_count = 5;

        let record = executor.execute(&task, &context).await.unwrap();

        assert_eq!(record.status, TaskExecutionStatus::Failed);
        assert_eq!(record.retry_attempt, 0);
        assert!(record
            .error_message
            .as_ref()
            .unwrap()
            .contains("handler registered"));

        // The terminal transition was persisted
        let rows = store.list_task_executions("exec-1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, TaskExecutionStatus::Failed);
    }
}
