use crate::error::DispatchError;
use crate::tools::ToolName;
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolOutcome,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// The no-side-effect tool: carries a clarifying question or plain reply.
/// Also the mandated fallback when another tool's arguments are incomplete.
pub struct ContinueConversationTool {
    definition: ToolDefinition,
}

#[derive(Deserialize)]
struct Args {
    message: String,
}

impl ContinueConversationTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "message".to_string(),
            PropertySchema::string(
                "The reply to send: an answer, or a question asking for whatever detail is \
                 still missing before an action can run.",
            ),
        );

        ContinueConversationTool {
            definition: ToolDefinition {
                name: ToolName::ContinueConversation.to_string(),
                description:
                    "Reply without performing any action. Use this to answer questions, and \
                     ALWAYS use it instead of another tool when a required argument for that \
                     tool is missing - ask the user for the missing detail."
                        .to_string(),
                input_schema: ToolInputSchema::new(properties, vec!["message".to_string()]),
            },
        }
    }
}

impl Default for ContinueConversationTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ContinueConversationTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(
        &self,
        params: Value,
        _context: &ToolContext,
    ) -> Result<ToolOutcome, DispatchError> {
        let args: Args = serde_json::from_value(params)
            .map_err(|e| DispatchError::Validation(format!("continue_conversation: {}", e)))?;
        Ok(ToolOutcome::text(args.message))
    }
}
