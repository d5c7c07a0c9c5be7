// ABOUTME: Core workflow definition structure and lifecycle status
// ABOUTME: Definitions are authored externally and never mutated mid-execution

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::error::Result;
use super::task::TaskDefinition;

fn default_version() -> String {
    "1.0".to_string()
}

/// A published workflow definition: an ordered set of task definitions plus
/// initial variable bindings. The status describes the definition lifecycle,
/// not any particular run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub workflow_id: String,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub status: DefinitionStatus,
    pub tasks: IndexMap<String, TaskDefinition>,
    #[serde(default)]
    pub variables: HashMap<String, Value>,
    /// External event descriptors, opaque to the engine.
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionStatus {
    Draft,
    #[default]
    Active,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(rename = "type")]
    pub trigger_type: String,
    #[serde(default)]
    pub config: Value,
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            workflow_id: String::new(),
            name: name.into(),
            version: default_version(),
            status: DefinitionStatus::Active,
            tasks: IndexMap::new(),
            variables: HashMap::new(),
            triggers: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn add_task(&mut self, task: TaskDefinition) -> &mut Self {
        self.tasks.insert(task.task_id.clone(), task);
        self
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &String> {
        self.tasks.keys()
    }

    /// Parse a definition from a JSON payload, filling in task ids from map
    /// keys where the payload omits them.
    pub fn from_json(payload: &Value) -> serde_json::Result<Self> {
        let mut definition: WorkflowDefinition = serde_json::from_value(payload.clone())?;
        for (task_id, task) in &mut definition.tasks {
            if task.task_id.is_empty() {
                task.task_id = task_id.clone();
            }
            if task.name.is_empty() {
                task.name = task_id.clone();
            }
        }
        Ok(definition)
    }

    /// Structural validation: non-empty, consistent ids, no dangling or
    /// self-referential dependencies. Cycle detection is performed by the
    /// engine's dependency graph on top of this.
    pub fn validate(&self) -> Result<()> {
        super::validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskType;
    use serde_json::json;

    #[test]
    fn test_from_json_fills_task_ids() {
        let payload = json!({
            "name": "etl",
            "tasks": {
                "extract": {"task_id": "", "name": "", "type": "action"},
                "load": {"task_id": "load", "name": "load step", "type": "action",
                         "dependencies": ["extract"]}
            }
        });

        let definition = WorkflowDefinition::from_json(&payload).unwrap();
        assert_eq!(definition.tasks["extract"].task_id, "extract");
        assert_eq!(definition.tasks["extract"].name, "extract");
        assert_eq!(definition.tasks["load"].name, "load step");
        assert_eq!(definition.status, DefinitionStatus::Active);
    }

    #[test]
    fn test_task_order_preserved() {
        let mut definition = WorkflowDefinition::new("ordered");
        definition.add_task(TaskDefinition::new("c", TaskType::Action));
        definition.add_task(TaskDefinition::new("a", TaskType::Action));
        definition.add_task(TaskDefinition::new("b", TaskType::Action));

        let ids: Vec<&String> = definition.task_ids().collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }
}
