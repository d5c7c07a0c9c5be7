// ABOUTME: Store-level tests for idempotent persistence across the execution lifecycle
// ABOUTME: Exercises the trait through the in-memory backend the way the runner does

mod common;

use common::{test_engine, wait_for_terminal};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use flowmill::engine::{ExecutionStatus, TaskExecution, WorkflowExecution};
use flowmill::persistence::{ExecutionStore, InMemoryStore};
use flowmill::{TaskDefinition, TaskType, WorkflowDefinition};

#[tokio::test]
async fn test_reupserting_a_record_replaces_it() {
    let store = InMemoryStore::new();
    let execution = WorkflowExecution::new("wf-1");
    store.upsert_execution(&execution).await.unwrap();

    let mut record = TaskExecution::new("step", &execution.execution_id);
    record.mark_running();
    store.upsert_task_execution(&record).await.unwrap();

    record.mark_completed(Some(json!({"ok": true})));
    store.upsert_task_execution(&record).await.unwrap();
    // Crash-replay of the same terminal row must not duplicate it
    store.upsert_task_execution(&record).await.unwrap();

    let rows = store
        .list_task_executions(&execution.execution_id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_successful());
}

#[tokio::test]
async fn test_task_rows_are_scoped_to_their_execution() {
    let store = InMemoryStore::new();
    let first = WorkflowExecution::new("wf-1");
    let second = WorkflowExecution::new("wf-1");

    for execution in [&first, &second] {
        store.upsert_execution(execution).await.unwrap();
        let mut record = TaskExecution::new("only-task", &execution.execution_id);
        record.mark_running();
        record.mark_completed(None);
        store.upsert_task_execution(&record).await.unwrap();
    }

    let rows = store
        .list_task_executions(&first.execution_id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].workflow_execution_id, first.execution_id);
}

#[tokio::test]
async fn test_every_transition_reaches_the_store() {
    // Run a small workflow through the engine and confirm the stored state
    // matches the finished execution without re-reading engine internals.
    let engine = test_engine();
    let mut definition = WorkflowDefinition::new("durable");
    definition.add_task(TaskDefinition::new("a", TaskType::Action));
    definition.add_task(TaskDefinition::new("b", TaskType::Action).with_dependencies(["a"]));

    let workflow_id = engine.create_workflow(definition).await.unwrap();
    let execution_id = engine
        .execute_workflow(&workflow_id, HashMap::new())
        .await
        .unwrap();
    let finished = wait_for_terminal(&engine, &execution_id).await;

    assert_eq!(finished.status, ExecutionStatus::Completed);
    // Reload from scratch: the store alone reconstructs the run.
    let reloaded = engine.get_execution(&execution_id).await.unwrap();
    assert_eq!(reloaded.status, ExecutionStatus::Completed);
    assert_eq!(reloaded.task_executions.len(), 2);
    assert!(reloaded.task_executions.iter().all(|t| t.is_successful()));
    assert!(reloaded.completed_at.is_some());
}

#[tokio::test]
async fn test_definitions_survive_engine_restart() {
    let store: Arc<dyn ExecutionStore> = Arc::new(InMemoryStore::new());

    let mut definition = WorkflowDefinition::new("keeper");
    definition.add_task(TaskDefinition::new("noop", TaskType::Action));

    let first = flowmill::WorkflowEngine::new(
        flowmill::EngineConfig::default(),
        Arc::clone(&store),
        flowmill::TaskRegistry::default(),
    );
    let workflow_id = first.create_workflow(definition).await.unwrap();

    let second = flowmill::WorkflowEngine::new(
        flowmill::EngineConfig::default(),
        store,
        flowmill::TaskRegistry::default(),
    );
    second.start().await.unwrap();

    let reloaded = second.get_workflow(&workflow_id).await.unwrap();
    assert_eq!(reloaded.name, "keeper");
    assert_eq!(reloaded.tasks.len(), 1);
}
