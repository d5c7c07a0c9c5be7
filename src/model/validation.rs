// ABOUTME: Structural validation for workflow definitions
// ABOUTME: Rejects malformed definitions before any execution record exists

use std::collections::HashSet;

use super::error::{DefinitionError, Result};
use super::workflow::WorkflowDefinition;

/// Validate definition structure: every dependency must name an existing
/// task in the same definition, and no task may depend on itself. Cycles
/// spanning two or more tasks are detected by the engine's dependency graph.
pub fn validate(definition: &WorkflowDefinition) -> Result<()> {
    if definition.name.trim().is_empty() {
        return Err(DefinitionError::MissingField("name".to_string()));
    }

    if definition.tasks.is_empty() {
        return Err(DefinitionError::EmptyWorkflow);
    }

    let mut seen = HashSet::new();
    for (key, task) in &definition.tasks {
        if task.task_id.trim().is_empty() {
            return Err(DefinitionError::MissingField(format!(
                "tasks.{}.task_id",
                key
            )));
        }
        if task.task_id != *key || !seen.insert(task.task_id.clone()) {
            return Err(DefinitionError::DuplicateTask {
                task_id: task.task_id.clone(),
            });
        }
    }

    for task in definition.tasks.values() {
        for dependency in &task.dependencies {
            if dependency == &task.task_id {
                return Err(DefinitionError::SelfDependency {
                    task_id: task.task_id.clone(),
                });
            }
            if !definition.tasks.contains_key(dependency) {
                return Err(DefinitionError::UnknownDependency {
                    task_id: task.task_id.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
    }

    Ok(())
}
