use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Custodial wallet key material for one profile.
///
/// The secret is only ever forwarded to the chain client for signing.
/// Debug output redacts it so it can never leak through a log line.
#[derive(Clone, Serialize, Deserialize)]
pub struct WalletRef {
    pub address: String,
    pub secret: String,
}

impl std::fmt::Debug for WalletRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRef")
            .field("address", &self.address)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Persisted identity + wallet linkage for one chat participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    /// Unique transport identifier (phone-derived chat id).
    pub contact_handle: String,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
    /// Created lazily on the first funds-related interaction.
    #[serde(skip_serializing, default)]
    pub wallet: Option<WalletRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet.as_ref().map(|w| w.address.as_str())
    }
}
