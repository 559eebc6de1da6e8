mod change_display_name;
mod change_email;
mod continue_conversation;
mod get_balance;
mod send_money;

pub use change_display_name::ChangeDisplayNameTool;
pub use change_email::ChangeEmailTool;
pub use continue_conversation::ContinueConversationTool;
pub use get_balance::GetBalanceTool;
pub use send_money::SendMoneyTool;

use crate::db::Database;
use crate::error::DispatchError;
use crate::models::{UserProfile, WalletRef};
use crate::web3::ChainClient;

/// Return the profile's wallet, creating one on first use.
///
/// First funds-related interaction for a profile: generate key material,
/// bootstrap-fund the address from the treasury, persist the reference.
/// A later failure does not undo the funding; see DESIGN.md.
pub(crate) async fn ensure_wallet(
    db: &Database,
    chain: &dyn ChainClient,
    profile: &UserProfile,
) -> Result<WalletRef, DispatchError> {
    if let Some(wallet) = &profile.wallet {
        return Ok(wallet.clone());
    }

    log::info!(
        "[TOOLS] First funds interaction for {} - creating wallet",
        profile.contact_handle
    );
    let wallet = chain
        .generate_wallet()
        .await
        .map_err(DispatchError::Internal)?;
    chain
        .fund_wallet(&wallet.address)
        .await
        .map_err(DispatchError::Internal)?;
    db.set_wallet(&profile.contact_handle, &wallet)
        .map_err(DispatchError::internal)?;

    Ok(wallet)
}
