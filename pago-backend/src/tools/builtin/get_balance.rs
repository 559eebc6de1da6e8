use crate::db::Database;
use crate::error::DispatchError;
use crate::formatter;
use crate::tools::ToolName;
use crate::tools::builtin::ensure_wallet;
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolOutcome,
};
use crate::web3::ChainClient;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub struct GetBalanceTool {
    db: Arc<Database>,
    chain: Arc<dyn ChainClient>,
    definition: ToolDefinition,
}

#[derive(Deserialize)]
struct Args {
    address: String,
    message: String,
}

impl GetBalanceTool {
    pub fn new(db: Arc<Database>, chain: Arc<dyn ChainClient>) -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "address".to_string(),
            PropertySchema::string(
                "The user's wallet address, exactly as shown in the profile context.",
            ),
        );
        properties.insert(
            "message".to_string(),
            PropertySchema::string(
                "Confirmation message containing the %amount% placeholder, which will be \
                 replaced with the balance.",
            ),
        );

        GetBalanceTool {
            db,
            chain,
            definition: ToolDefinition {
                name: ToolName::GetBalance.to_string(),
                description: "Look up the user's current stablecoin balance.".to_string(),
                input_schema: ToolInputSchema::new(
                    properties,
                    vec!["address".to_string(), "message".to_string()],
                ),
            },
        }
    }
}

#[async_trait]
impl Tool for GetBalanceTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(
        &self,
        params: Value,
        context: &ToolContext,
    ) -> Result<ToolOutcome, DispatchError> {
        let args: Args = serde_json::from_value(params)
            .map_err(|e| DispatchError::Validation(format!("get_balance: {}", e)))?;

        let profile = self
            .db
            .find_profile(&context.actor_handle)
            .map_err(DispatchError::internal)?
            .ok_or_else(|| {
                DispatchError::NotFound(format!("no profile for {}", context.actor_handle))
            })?;

        let wallet = ensure_wallet(&self.db, self.chain.as_ref(), &profile).await?;

        // Query the address the model echoed from the profile context; if it
        // sent something that is not an address (profile had no wallet yet),
        // fall back to the wallet we just ensured.
        let supplied = args.address.trim();
        let address = if supplied.starts_with("0x") {
            supplied.to_string()
        } else {
            wallet.address.clone()
        };

        let balance = self
            .chain
            .get_balance(&address)
            .await
            .map_err(DispatchError::Internal)?;

        Ok(ToolOutcome::text(args.message)
            .with_value("amount", formatter::format_amount(balance)))
    }
}
