pub mod builtin;
pub mod registry;
pub mod types;

pub use registry::{Tool, ToolRegistry};
pub use types::{PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolOutcome};

use crate::db::Database;
use crate::web3::ChainClient;
use std::sync::Arc;

/// Closed set of dispatchable tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ToolName {
    ChangeEmail,
    ChangeDisplayName,
    GetBalance,
    SendMoney,
    ContinueConversation,
}

/// Collaborators handed to the tools at construction. Tools hold their own
/// Arcs instead of reaching for globals, so tests can swap in fakes.
pub struct ToolDeps {
    pub db: Arc<Database>,
    pub chain: Arc<dyn ChainClient>,
    /// Explorer base URL for `%transaction_details%` blocks.
    pub explorer_tx_url: String,
}

fn register_all_tools(registry: &mut ToolRegistry, deps: &ToolDeps) {
    registry.register(Arc::new(builtin::ChangeEmailTool::new(deps.db.clone())));
    registry.register(Arc::new(builtin::ChangeDisplayNameTool::new(deps.db.clone())));
    registry.register(Arc::new(builtin::GetBalanceTool::new(
        deps.db.clone(),
        deps.chain.clone(),
    )));
    registry.register(Arc::new(builtin::SendMoneyTool::new(
        deps.db.clone(),
        deps.chain.clone(),
        deps.explorer_tx_url.clone(),
    )));
    registry.register(Arc::new(builtin::ContinueConversationTool::new()));
}

/// Create a new ToolRegistry with the full catalog registered
pub fn create_registry(deps: &ToolDeps) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_all_tools(&mut registry, deps);
    registry
}
