use crate::db::Database;
use crate::error::DispatchError;
use crate::formatter;
use crate::models::UserProfile;
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
use uuid::Uuid;

pub struct SendMoneyTool {
    db: Arc<Database>,
    chain: Arc<dyn ChainClient>,
    explorer_tx_url: String,
    definition: ToolDefinition,
}

#[derive(Deserialize)]
struct Recipient {
    name: String,
    handle: String,
}

#[derive(Deserialize)]
struct Args {
    amount: f64,
    recipient: Recipient,
    message: String,
}

impl SendMoneyTool {
    pub fn new(db: Arc<Database>, chain: Arc<dyn ChainClient>, explorer_tx_url: String) -> Self {
        let mut recipient_properties = HashMap::new();
        recipient_properties.insert(
            "name".to_string(),
            PropertySchema::string("Display name of the person receiving the money."),
        );
        recipient_properties.insert(
            "handle".to_string(),
            PropertySchema::string(
                "Chat handle of the recipient (phone-derived id, e.g. 5511999999999@c.us).",
            ),
        );

        let mut properties = HashMap::new();
        properties.insert(
            "amount".to_string(),
            PropertySchema::number("Amount of stablecoin to send. Must be greater than zero."),
        );
        properties.insert(
            "recipient".to_string(),
            PropertySchema::object(
                "Who receives the money.",
                recipient_properties,
                vec!["name".to_string(), "handle".to_string()],
            ),
        );
        properties.insert(
            "message".to_string(),
            PropertySchema::string(
                "Confirmation message containing the %amount%, %name% and \
                 %transaction_details% placeholders.",
            ),
        );

        SendMoneyTool {
            db,
            chain,
            explorer_tx_url,
            definition: ToolDefinition {
                name: ToolName::SendMoney.to_string(),
                description:
                    "Transfer stablecoin from the user's wallet to a contact. Only call once \
                     the amount and the recipient are both known."
                        .to_string(),
                input_schema: ToolInputSchema::new(
                    properties,
                    vec![
                        "amount".to_string(),
                        "recipient".to_string(),
                        "message".to_string(),
                    ],
                ),
            },
        }
    }

    /// Resolve the recipient profile, registering a first contact if needed.
    fn resolve_recipient(
        &self,
        handle: &str,
        name: &str,
    ) -> Result<UserProfile, DispatchError> {
        match self.db.find_profile(handle).map_err(DispatchError::internal)? {
            Some(profile) => Ok(profile),
            None => {
                log::info!("[SEND_MONEY] First contact registration for {}", handle);
                self.db
                    .create_profile(handle, Some(name))
                    .map_err(DispatchError::internal)
            }
        }
    }
}

#[async_trait]
impl Tool for SendMoneyTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(
        &self,
        params: Value,
        context: &ToolContext,
    ) -> Result<ToolOutcome, DispatchError> {
        let args: Args = serde_json::from_value(params)
            .map_err(|e| DispatchError::Validation(format!("send_money: {}", e)))?;

        if !args.amount.is_finite() || args.amount <= 0.0 {
            return Err(DispatchError::Validation(format!(
                "transfer amount must be positive, got {}",
                args.amount
            )));
        }
        let recipient_handle = args.recipient.handle.trim();
        if recipient_handle.is_empty() {
            return Err(DispatchError::Validation(
                "recipient handle is missing".to_string(),
            ));
        }

        let sender = self
            .db
            .find_profile(&context.actor_handle)
            .map_err(DispatchError::internal)?
            .ok_or_else(|| {
                DispatchError::NotFound(format!("no profile for {}", context.actor_handle))
            })?;
        let sender_wallet = ensure_wallet(&self.db, self.chain.as_ref(), &sender).await?;

        // Check-then-act on the balance is safe here because the dispatcher
        // serializes each user's turns on a session lane.
        let balance = self
            .chain
            .get_balance(&sender_wallet.address)
            .await
            .map_err(DispatchError::Internal)?;
        if balance < args.amount {
            return Err(DispatchError::InsufficientFunds {
                balance,
                requested: args.amount,
            });
        }

        let recipient = self.resolve_recipient(recipient_handle, args.recipient.name.trim())?;
        let recipient_wallet = ensure_wallet(&self.db, self.chain.as_ref(), &recipient).await?;

        let attempt_id = Uuid::new_v4();
        log::info!(
            "[SEND_MONEY] attempt {} - {} -> {} amount {}",
            attempt_id,
            sender.contact_handle,
            recipient.contact_handle,
            args.amount
        );

        // A failure past this point leaves a freshly funded recipient wallet
        // in place; the funding transaction cannot be undone.
        let receipt = self
            .chain
            .transfer(&sender_wallet, &recipient_wallet.address, args.amount)
            .await
            .map_err(DispatchError::TransferFailed)?;
        log::info!(
            "[SEND_MONEY] attempt {} settled (tx {})",
            attempt_id,
            receipt.tx_hash
        );

        let mut outcome = ToolOutcome::text(args.message)
            .with_value("amount", formatter::format_amount(args.amount))
            .with_value("name", args.recipient.name.trim())
            .with_value(
                "transaction_details",
                formatter::transaction_details(&self.explorer_tx_url, &receipt.tx_hash),
            );

        // Post-transfer balance, reported if a %balance% token is present.
        match self.chain.get_balance(&sender_wallet.address).await {
            Ok(after) => {
                outcome = outcome.with_value("balance", formatter::format_amount(after));
            }
            Err(e) => log::warn!(
                "[SEND_MONEY] post-transfer balance query failed for {}: {}",
                sender.contact_handle,
                e
            ),
        }

        Ok(outcome)
    }
}
