// ABOUTME: Condition task handler evaluating boolean expressions over variables
// ABOUTME: Returns the verdict as a result map; never branches the DAG itself

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::collab::ConditionEvaluator;
use super::TaskHandler;
use crate::engine::context::ExecutionContext;
use crate::engine::error::{EngineError, Result};

/// Evaluates `config.condition` (or the whole config when that key is
/// absent) against the current variable snapshot. Downstream tasks encode
/// any branching themselves via dependencies and their own config.
pub struct ConditionHandler {
    evaluator: Arc<dyn ConditionEvaluator>,
}

impl ConditionHandler {
    pub fn new(evaluator: Arc<dyn ConditionEvaluator>) -> Self {
        Self { evaluator }
    }
}

#[async_trait]
impl TaskHandler for ConditionHandler {
    fn task_type(&self) -> &'static str {
        "condition"
    }

    async fn execute(
        &self,
        task_id: &str,
        config: &Value,
        context: &ExecutionContext,
    ) -> Result<Value> {
        let condition = config.get("condition").unwrap_or(config);
        if condition.is_null() {
            return Err(EngineError::ConfigError {
                task_id: task_id.to_string(),
                message: "condition task requires a condition".to_string(),
            });
        }

        let variables = context.variables_snapshot().await;
        let verdict = self.evaluator.evaluate(condition, &variables)?;

        Ok(json!({ "condition_result": verdict }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::collab::BasicConditionEvaluator;
    use crate::tasks::TaskRegistry;
    use std::collections::HashMap;

    fn context_with(variables: HashMap<String, Value>) -> ExecutionContext {
        ExecutionContext::new("wf-1", "exec-1", variables, Arc::new(TaskRegistry::new()))
    }

    #[tokio::test]
    async fn test_condition_result_shape() {
        let handler = ConditionHandler::new(Arc::new(BasicConditionEvaluator));
        let ctx = context_with(HashMap::from([("ok".to_string(), json!(true))]));

        let config = json!({"condition": {"variable": "ok", "value": true}});
        let result = handler.execute("gate", &config, &ctx).await.unwrap();
        assert_eq!(result, json!({"condition_result": true}));

        // Bare condition without the wrapper key
        let config = json!({"variable": "ok", "value": false});
        let result = handler.execute("gate", &config, &ctx).await.unwrap();
        assert_eq!(result, json!({"condition_result": false}));
    }

    #[tokio::test]
    async fn test_missing_condition_is_config_error() {
        let handler = ConditionHandler::new(Arc::new(BasicConditionEvaluator));
        let ctx = context_with(HashMap::new());

        let result = handler.execute("gate", &Value::Null, &ctx).await;
        assert!(matches!(result, Err(EngineError::ConfigError { .. })));
    }
}
