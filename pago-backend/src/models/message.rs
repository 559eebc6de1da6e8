use serde::{Deserialize, Serialize};

/// One turn of a chat, as surfaced by the messaging gateway.
///
/// Produced by the transport layer; the core never mutates these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Gateway epoch timestamp, used as the ordering key.
    pub timestamp: i64,
    /// Message text. Empty for media-only messages.
    #[serde(default)]
    pub body: String,
    /// True if the human sent it, false if the assistant did.
    pub from_user: bool,
}

impl ConversationMessage {
    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }
}
