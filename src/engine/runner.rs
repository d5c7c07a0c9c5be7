// ABOUTME: Drives one workflow execution through its ready generations
// ABOUTME: Resolves ready tasks, runs them concurrently, checkpoints after each wave

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::config::EngineConfig;
use super::context::ExecutionContext;
use super::dependency::DependencyGraph;
use super::error::{EngineError, Result};
use super::executor::TaskExecutor;
use super::record::WorkflowExecution;
use crate::model::WorkflowDefinition;
use crate::persistence::ExecutionStore;
use crate::tasks::TaskRegistry;

/// Runs a single workflow execution to a terminal state.
///
/// The runner repeatedly asks the dependency graph for the set of tasks whose
/// dependencies have all completed, runs that generation concurrently, and
/// checkpoints the execution record before resolving the next one. A failed
/// task ends the run after its generation drains; downstream tasks are never
/// started and get no records.
pub struct WorkflowRunner {
    definition: Arc<WorkflowDefinition>,
    registry: Arc<TaskRegistry>,
    store: Arc<dyn ExecutionStore>,
    executor: TaskExecutor,
    cancel: Arc<AtomicBool>,
}

impl WorkflowRunner {
    pub fn new(
        definition: Arc<WorkflowDefinition>,
        registry: Arc<TaskRegistry>,
        store: Arc<dyn ExecutionStore>,
        config: &EngineConfig,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        let executor = TaskExecutor::new(Arc::clone(&registry), Arc::clone(&store), config);
        Self {
            definition,
            registry,
            store,
            executor,
            cancel,
        }
    }

    #[instrument(skip(self, execution), fields(execution_id = %execution.execution_id))]
    pub async fn run(&self, mut execution: WorkflowExecution) -> Result<WorkflowExecution> {
        let graph = DependencyGraph::from_definition(&self.definition)?;
        let context = ExecutionContext::new(
            &execution.workflow_id,
            &execution.execution_id,
            execution.variables.clone(),
            Arc::clone(&self.registry),
        );

        info!(
            workflow_id = %execution.workflow_id,
            execution_id = %execution.execution_id,
            tasks = graph.task_count(),
            "Starting workflow execution"
        );

        let mut completed: HashSet<String> = HashSet::new();

        loop {
            let ready = graph.ready_task_ids(&completed);
            if ready.is_empty() {
                if completed.len() == graph.task_count() {
                    break;
                }
                // Validation at creation time makes this unreachable, but a
                // stalled graph must not spin forever.
                let message = EngineError::DependencyUnresolvable {
                    remaining: graph.remaining_task_ids(&completed),
                }
                .to_string();
                error!(execution_id = %execution.execution_id, "{}", message);
                execution.variables = context.variables_snapshot().await;
                execution.mark_failed(message);
                self.store.upsert_execution(&execution).await?;
                return Ok(execution);
            }

            // Cancellation stops new generations. A flag raised during the
            // final generation finds nothing left to cancel: the completion
            // check above wins and the run finishes as completed.
            if self.cancel.load(Ordering::SeqCst) {
                warn!(execution_id = %execution.execution_id, "Execution cancelled");
                execution.variables = context.variables_snapshot().await;
                execution.mark_cancelled();
                self.store.upsert_execution(&execution).await?;
                return Ok(execution);
            }

            info!(
                execution_id = %execution.execution_id,
                generation = ?ready,
                "Running ready generation"
            );

            let tasks: Vec<_> = ready
                .iter()
                .filter_map(|task_id| self.definition.tasks.get(task_id))
                .collect();
            let records = join_all(
                tasks
                    .iter()
                    .map(|task| self.executor.execute(task, &context)),
            )
            .await;

            let mut generation_failure: Option<String> = None;
            for record in records {
                let record = record?;
                if record.is_successful() {
                    completed.insert(record.task_id.clone());
                } else if generation_failure.is_none() {
                    generation_failure = Some(
                        EngineError::TaskFailed {
                            task_id: record.task_id.clone(),
                            message: record
                                .error_message
                                .clone()
                                .unwrap_or_else(|| "no error recorded".to_string()),
                        }
                        .to_string(),
                    );
                }
                execution.upsert_task_execution(record);
            }

            // Checkpoint the wave before deciding what happens next.
            execution.variables = context.variables_snapshot().await;
            self.store.upsert_execution(&execution).await?;

            if let Some(message) = generation_failure {
                error!(execution_id = %execution.execution_id, "{}", message);
                execution.mark_failed(message);
                self.store.upsert_execution(&execution).await?;
                return Ok(execution);
            }
        }

        execution.variables = context.variables_snapshot().await;
        let result = serde_json::to_value(&execution.variables)
            .map_err(|e| EngineError::System(e.to_string()))?;
        execution.mark_completed(Some(result));
        self.store.upsert_execution(&execution).await?;

        info!(
            execution_id = %execution.execution_id,
            tasks = completed.len(),
            "Workflow execution completed"
        );
        Ok(execution)
    }
}
