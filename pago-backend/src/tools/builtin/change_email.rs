use crate::db::Database;
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
use std::sync::Arc;

pub struct ChangeEmailTool {
    db: Arc<Database>,
    definition: ToolDefinition,
}

#[derive(Deserialize)]
struct Args {
    email: String,
    message: String,
}

impl ChangeEmailTool {
    pub fn new(db: Arc<Database>) -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "email".to_string(),
            PropertySchema::string("The new email address the user wants on their profile."),
        );
        properties.insert(
            "message".to_string(),
            PropertySchema::string(
                "Confirmation message to send back once the email is updated.",
            ),
        );

        ChangeEmailTool {
            db,
            definition: ToolDefinition {
                name: ToolName::ChangeEmail.to_string(),
                description:
                    "Update the email address on the user's profile. Only call when the user \
                     explicitly provides the new address."
                        .to_string(),
                input_schema: ToolInputSchema::new(
                    properties,
                    vec!["email".to_string(), "message".to_string()],
                ),
            },
        }
    }
}

#[async_trait]
impl Tool for ChangeEmailTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(
        &self,
        params: Value,
        context: &ToolContext,
    ) -> Result<ToolOutcome, DispatchError> {
        let args: Args = serde_json::from_value(params)
            .map_err(|e| DispatchError::Validation(format!("change_email: {}", e)))?;

        let profile = self
            .db
            .find_profile(&context.actor_handle)
            .map_err(DispatchError::internal)?
            .ok_or_else(|| {
                DispatchError::NotFound(format!("no profile for {}", context.actor_handle))
            })?;

        self.db
            .update_email_address(&profile.contact_handle, args.email.trim())
            .map_err(DispatchError::internal)?;

        log::info!("[TOOLS] Updated email for {}", profile.contact_handle);
        Ok(ToolOutcome::text(args.message))
    }
}
