use crate::error::DispatchError;
use crate::tools::types::{ToolContext, ToolDefinition, ToolOutcome};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait that all tools must implement
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool definition for the AI API
    fn definition(&self) -> ToolDefinition;

    /// Executes the tool with the given parameters
    async fn execute(&self, params: Value, context: &ToolContext)
    -> Result<ToolOutcome, DispatchError>;

    /// Returns the tool's name
    fn name(&self) -> String {
        self.definition().name
    }
}

/// Registry that holds all available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry {
            tools: HashMap::new(),
        }
    }

    /// Register a tool
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        self.tools.insert(name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Get tool definitions for sending to the AI
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get count of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name, with the validation gate in front.
    ///
    /// The prompt already tells the model to fall back to
    /// continue_conversation when arguments are missing; this gate is the
    /// hard check behind that instruction. No handler runs until every
    /// declared required argument is present and non-empty.
    pub async fn dispatch(
        &self,
        name: &str,
        params: Value,
        context: &ToolContext,
    ) -> Result<ToolOutcome, DispatchError> {
        let tool = self
            .get(name)
            .ok_or_else(|| DispatchError::Validation(format!("unknown tool '{}'", name)))?;

        check_required(&tool.definition(), &params)?;
        tool.execute(params, context).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn check_required(definition: &ToolDefinition, params: &Value) -> Result<(), DispatchError> {
    let object = params.as_object().ok_or_else(|| {
        DispatchError::Validation(format!(
            "arguments for '{}' must be a JSON object",
            definition.name
        ))
    })?;

    for field in &definition.input_schema.required {
        let missing = match object.get(field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        };
        if missing {
            return Err(DispatchError::Validation(format!(
                "missing required argument '{}' for '{}'",
                field, definition.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::{PropertySchema, ToolInputSchema};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockTool {
        definition: ToolDefinition,
        executions: Arc<AtomicUsize>,
    }

    impl MockTool {
        fn new(name: &str, required: Vec<&str>) -> (Self, Arc<AtomicUsize>) {
            let executions = Arc::new(AtomicUsize::new(0));
            let mut properties = HashMap::new();
            for field in &required {
                properties.insert(field.to_string(), PropertySchema::string("test field"));
            }
            let tool = MockTool {
                definition: ToolDefinition {
                    name: name.to_string(),
                    description: format!("Mock {} tool", name),
                    input_schema: ToolInputSchema::new(
                        properties,
                        required.iter().map(|r| r.to_string()).collect(),
                    ),
                },
                executions: executions.clone(),
            };
            (tool, executions)
        }
    }

    #[async_trait]
    impl Tool for MockTool {
        fn definition(&self) -> ToolDefinition {
            self.definition.clone()
        }

        async fn execute(
            &self,
            _params: Value,
            _context: &ToolContext,
        ) -> Result<ToolOutcome, DispatchError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutcome::text("done"))
        }
    }

    #[test]
    fn register_and_get() {
        let mut registry = ToolRegistry::new();
        let (tool, _) = MockTool::new("test_tool", vec![]);
        registry.register(Arc::new(tool));

        assert!(registry.has_tool("test_tool"));
        assert!(!registry.has_tool("nonexistent"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn unknown_tool_is_a_validation_error() {
        let registry = ToolRegistry::new();
        let result = registry
            .dispatch("nope", json!({}), &ToolContext::new("h"))
            .await;
        assert!(matches!(result, Err(DispatchError::Validation(_))));
    }

    #[tokio::test]
    async fn missing_required_argument_never_reaches_handler() {
        let mut registry = ToolRegistry::new();
        let (tool, executions) = MockTool::new("needs_message", vec!["message"]);
        registry.register(Arc::new(tool));

        for params in [json!({}), json!({"message": null}), json!({"message": "   "})] {
            let result = registry
                .dispatch("needs_message", params, &ToolContext::new("h"))
                .await;
            assert!(matches!(result, Err(DispatchError::Validation(_))));
        }
        assert_eq!(executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_arguments_execute() {
        let mut registry = ToolRegistry::new();
        let (tool, executions) = MockTool::new("needs_message", vec!["message"]);
        registry.register(Arc::new(tool));

        let result = registry
            .dispatch(
                "needs_message",
                json!({"message": "hi"}),
                &ToolContext::new("h"),
            )
            .await;
        assert!(result.is_ok());
        assert_eq!(executions.load(Ordering::SeqCst), 1);
    }
}
