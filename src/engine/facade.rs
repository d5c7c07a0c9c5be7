// ABOUTME: Public engine facade for definition and execution management
// ABOUTME: Validates at creation, spawns runners, and tracks in-flight executions

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::config::EngineConfig;
use super::dependency::DependencyGraph;
use super::error::{EngineError, Result};
use super::record::{ExecutionStatus, WorkflowExecution};
use super::runner::WorkflowRunner;
use crate::model::{DefinitionStatus, WorkflowDefinition};
use crate::persistence::{ExecutionStore, InMemoryStore, StoreError};
use crate::tasks::{Collaborators, TaskRegistry};

/// Engine-level counters reported by [`WorkflowEngine::status`].
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub workflow_count: usize,
    pub active_executions: usize,
    pub completed_executions: usize,
    pub failed_executions: usize,
    pub cancelled_executions: usize,
    pub registered_task_types: Vec<String>,
}

struct ActiveExecution {
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

/// The engine facade: owns the registry, configuration, and store, and
/// exposes definition and execution management to the embedding application.
pub struct WorkflowEngine {
    config: EngineConfig,
    store: Arc<dyn ExecutionStore>,
    registry: Arc<TaskRegistry>,
    definitions: Arc<RwLock<HashMap<String, Arc<WorkflowDefinition>>>>,
    active: Arc<RwLock<HashMap<String, ActiveExecution>>>,
}

impl WorkflowEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn ExecutionStore>,
        registry: TaskRegistry,
    ) -> Self {
        Self {
            config,
            store,
            registry: Arc::new(registry),
            definitions: Arc::new(RwLock::new(HashMap::new())),
            active: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// An engine with default configuration, in-memory storage, and the
    /// built-in handlers wired to default collaborators.
    pub fn in_memory() -> Self {
        Self::new(
            EngineConfig::default(),
            Arc::new(InMemoryStore::new()),
            TaskRegistry::with_builtins(Collaborators::default()),
        )
    }

    /// Load previously persisted active definitions into the working set.
    pub async fn start(&self) -> Result<()> {
        let stored = self.store.list_definitions().await?;
        let mut definitions = self.definitions.write().await;
        for definition in stored {
            if definition.status == DefinitionStatus::Active {
                definitions.insert(definition.workflow_id.clone(), Arc::new(definition));
            }
        }
        info!(workflows = definitions.len(), "Workflow engine started");
        Ok(())
    }

    /// Signal cancellation to every in-flight execution and wait for the
    /// runners to drain, bounded by the configured shutdown timeout.
    pub async fn stop(&self) -> Result<()> {
        let mut active = self.active.write().await;
        for entry in active.values() {
            entry.cancel.store(true, Ordering::SeqCst);
        }
        let handles: Vec<(String, JoinHandle<()>)> = active
            .iter_mut()
            .filter_map(|(id, entry)| entry.handle.take().map(|h| (id.clone(), h)))
            .collect();
        drop(active);

        let deadline = self.config.shutdown_timeout();
        for (execution_id, handle) in handles {
            if tokio::time::timeout(deadline, handle).await.is_err() {
                warn!(%execution_id, "Execution did not drain before shutdown deadline");
            }
        }
        self.active.write().await.clear();
        info!("Workflow engine stopped");
        Ok(())
    }

    /// Validate and register a workflow definition. Assigns a fresh workflow
    /// id when the definition does not carry one. Structural problems and
    /// dependency cycles are rejected here, before anything is persisted.
    pub async fn create_workflow(&self, mut definition: WorkflowDefinition) -> Result<String> {
        if definition.workflow_id.is_empty() {
            definition.workflow_id = uuid::Uuid::new_v4().to_string();
        }
        definition.validate()?;
        DependencyGraph::from_definition(&definition)?.create_execution_plan()?;

        self.store.upsert_definition(&definition).await?;
        let workflow_id = definition.workflow_id.clone();
        self.definitions
            .write()
            .await
            .insert(workflow_id.clone(), Arc::new(definition));

        info!(%workflow_id, "Workflow created");
        Ok(workflow_id)
    }

    pub async fn get_workflow(&self, workflow_id: &str) -> Result<Arc<WorkflowDefinition>> {
        if let Some(definition) = self.definitions.read().await.get(workflow_id) {
            return Ok(Arc::clone(definition));
        }
        match self.store.load_definition(workflow_id).await {
            Ok(definition) => Ok(Arc::new(definition)),
            Err(StoreError::NotFound(_)) => Err(EngineError::WorkflowNotFound {
                workflow_id: workflow_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_workflows(&self) -> Vec<Arc<WorkflowDefinition>> {
        self.definitions.read().await.values().cloned().collect()
    }

    /// Start a run of a registered workflow. The definition's variables are
    /// merged with the caller's inputs (inputs win), the initial execution
    /// record is persisted, and the run proceeds on a background task. The
    /// execution id is returned immediately.
    pub async fn execute_workflow(
        &self,
        workflow_id: &str,
        inputs: HashMap<String, Value>,
    ) -> Result<String> {
        let definition = self.get_workflow(workflow_id).await?;

        let mut execution = WorkflowExecution::new(workflow_id);
        execution.variables = definition.variables.clone();
        execution.variables.extend(inputs);
        self.store.upsert_execution(&execution).await?;

        let execution_id = execution.execution_id.clone();
        let cancel = Arc::new(AtomicBool::new(false));

        // Register before spawning so cancel_execution can always find the
        // flag, then attach the join handle.
        self.active.write().await.insert(
            execution_id.clone(),
            ActiveExecution {
                cancel: Arc::clone(&cancel),
                handle: None,
            },
        );

        let runner = WorkflowRunner::new(
            definition,
            Arc::clone(&self.registry),
            Arc::clone(&self.store),
            &self.config,
            cancel,
        );
        let store = Arc::clone(&self.store);
        let active = Arc::clone(&self.active);
        let spawned_id = execution_id.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = runner.run(execution).await {
                error!(execution_id = %spawned_id, "Execution aborted: {}", e);
                // Best-effort terminal record so the run is not left active.
                if let Ok(mut stored) = store.load_execution(&spawned_id).await {
                    if !stored.is_terminal() {
                        stored.mark_failed(e.to_string());
                        if let Err(persist_err) = store.upsert_execution(&stored).await {
                            error!(
                                execution_id = %spawned_id,
                                "Failed to record aborted execution: {}",
                                persist_err
                            );
                        }
                    }
                }
            }
            active.write().await.remove(&spawned_id);
        });

        if let Some(entry) = self.active.write().await.get_mut(&execution_id) {
            entry.handle = Some(handle);
        }

        info!(%workflow_id, %execution_id, "Execution started");
        Ok(execution_id)
    }

    /// The current view of one execution, with task rows folded in from the
    /// store so callers see attempts the runner has not checkpointed yet.
    pub async fn get_execution(&self, execution_id: &str) -> Result<WorkflowExecution> {
        let mut execution = match self.store.load_execution(execution_id).await {
            Ok(execution) => execution,
            Err(StoreError::NotFound(_)) => {
                return Err(EngineError::ExecutionNotFound {
                    execution_id: execution_id.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        for record in self.store.list_task_executions(execution_id).await? {
            execution.upsert_task_execution(record);
        }
        Ok(execution)
    }

    pub async fn list_executions(&self) -> Result<Vec<WorkflowExecution>> {
        Ok(self.store.list_executions().await?)
    }

    /// Request cancellation of a running execution. Tasks already in flight
    /// run to completion; no further generations start. Cancelling an
    /// execution that already reached a terminal state is a no-op.
    pub async fn cancel_execution(&self, execution_id: &str) -> Result<()> {
        if let Some(entry) = self.active.read().await.get(execution_id) {
            entry.cancel.store(true, Ordering::SeqCst);
            info!(%execution_id, "Cancellation requested");
            return Ok(());
        }
        // Not in flight: terminal executions are fine, unknown ids are not.
        match self.store.load_execution(execution_id).await {
            Ok(execution) if execution.is_terminal() => Ok(()),
            Ok(_) | Err(StoreError::NotFound(_)) => Err(EngineError::ExecutionNotFound {
                execution_id: execution_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn status(&self) -> Result<EngineStatus> {
        let workflow_count = self.definitions.read().await.len();
        let executions = self.store.list_executions().await?;

        let mut status = EngineStatus {
            workflow_count,
            active_executions: 0,
            completed_executions: 0,
            failed_executions: 0,
            cancelled_executions: 0,
            registered_task_types: self.registry.registered_types(),
        };
        for execution in &executions {
            match execution.status {
                ExecutionStatus::Active => status.active_executions += 1,
                ExecutionStatus::Completed => status.completed_executions += 1,
                ExecutionStatus::Failed => status.failed_executions += 1,
                ExecutionStatus::Cancelled => status.cancelled_executions += 1,
            }
        }
        Ok(status)
    }
}
