// ABOUTME: Dependency graph management and execution planning
// ABOUTME: Handles cycle detection and ready-set resolution for workflow tasks

use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use petgraph::{Direction, Graph};
use std::collections::{HashMap, HashSet};

use super::error::{EngineError, Result};
use crate::model::WorkflowDefinition;

pub struct DependencyGraph {
    graph: Graph<String, ()>,
    task_indices: HashMap<String, NodeIndex>,
}

/// Generations of tasks whose dependencies are satisfied by all earlier
/// generations. Tasks within one generation run concurrently.
pub struct ExecutionPlan {
    pub generations: Vec<Vec<String>>,
    pub total_tasks: usize,
}

impl DependencyGraph {
    /// Build the dependency graph for a definition. Unknown dependency
    /// references are rejected here even though definition validation
    /// should have caught them already.
    pub fn from_definition(definition: &WorkflowDefinition) -> Result<Self> {
        let mut graph = Graph::new();
        let mut task_indices = HashMap::new();

        for task_id in definition.tasks.keys() {
            let node_index = graph.add_node(task_id.clone());
            task_indices.insert(task_id.clone(), node_index);
        }

        for (task_id, task) in &definition.tasks {
            let task_node = task_indices[task_id];

            for dependency in &task.dependencies {
                if let Some(&dep_node) = task_indices.get(dependency) {
                    // Edge direction: dependency -> dependent
                    graph.add_edge(dep_node, task_node, ());
                } else {
                    return Err(EngineError::InvalidDefinition(
                        crate::model::DefinitionError::UnknownDependency {
                            task_id: task_id.clone(),
                            dependency: dependency.clone(),
                        },
                    ));
                }
            }
        }

        Ok(Self {
            graph,
            task_indices,
        })
    }

    /// Topologically sort the graph to prove acyclicity, then derive the
    /// generation batches. Called at definition creation time so the
    /// runtime resolver can assume well-formed input.
    pub fn create_execution_plan(&self) -> Result<ExecutionPlan> {
        let sorted_nodes =
            toposort(&self.graph, None).map_err(|cycle| EngineError::CircularDependency {
                tasks: vec![self.graph[cycle.node_id()].clone()],
            })?;

        let generations = self.build_generations(sorted_nodes);
        let total_tasks = self.task_indices.len();

        Ok(ExecutionPlan {
            generations,
            total_tasks,
        })
    }

    fn build_generations(&self, sorted_nodes: Vec<NodeIndex>) -> Vec<Vec<String>> {
        let mut generations = Vec::new();
        let mut satisfied = HashSet::new();
        let mut remaining: HashSet<NodeIndex> = sorted_nodes.into_iter().collect();

        while !remaining.is_empty() {
            let mut generation_nodes = Vec::new();

            for &node_idx in &remaining {
                let dependencies_met = self
                    .graph
                    .neighbors_directed(node_idx, Direction::Incoming)
                    .all(|dep_node| satisfied.contains(&dep_node));

                if dependencies_met {
                    generation_nodes.push(node_idx);
                }
            }

            if generation_nodes.is_empty() {
                // Unreachable once toposort succeeded
                break;
            }

            for node_idx in &generation_nodes {
                remaining.remove(node_idx);
                satisfied.insert(*node_idx);
            }

            generations.push(
                generation_nodes
                    .into_iter()
                    .map(|idx| self.graph[idx].clone())
                    .collect(),
            );
        }

        generations
    }

    /// Runtime ready-set resolver: every task whose dependencies are all in
    /// `completed` and whose own id is not. Preserves definition order.
    pub fn ready_task_ids(&self, completed: &HashSet<String>) -> Vec<String> {
        let mut ready = Vec::new();
        for node_idx in self.graph.node_indices() {
            let task_id = &self.graph[node_idx];
            if completed.contains(task_id) {
                continue;
            }
            let dependencies_met = self
                .graph
                .neighbors_directed(node_idx, Direction::Incoming)
                .all(|dep_node| completed.contains(&self.graph[dep_node]));
            if dependencies_met {
                ready.push(task_id.clone());
            }
        }
        ready
    }

    /// Task ids not yet in `completed`, for diagnosing a stalled graph.
    pub fn remaining_task_ids(&self, completed: &HashSet<String>) -> Vec<String> {
        self.graph
            .node_indices()
            .map(|idx| &self.graph[idx])
            .filter(|id| !completed.contains(*id))
            .cloned()
            .collect()
    }

    pub fn task_count(&self) -> usize {
        self.task_indices.len()
    }
}

impl ExecutionPlan {
    pub fn max_parallelism(&self) -> usize {
        self.generations.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn execution_depth(&self) -> usize {
        self.generations.len()
    }
}
