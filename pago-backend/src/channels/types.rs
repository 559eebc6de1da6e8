use serde::{Deserialize, Serialize};

/// Inbound webhook envelope from the messaging gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(rename = "eventType")]
    pub event_type: String,
    #[serde(default)]
    pub payload: Option<WebhookPayload>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebhookPayload {
    /// Transport identity of the sender.
    pub sender_handle: String,
    /// The line the message was addressed to.
    pub recipient_handle: String,
    /// True when the gateway echoes the bot's own outbound message.
    pub is_from_bot: bool,
    pub text: String,
    pub sender_name: Option<String>,
}

/// A webhook message after filtering and normalization.
#[derive(Debug, Clone)]
pub struct NormalizedMessage {
    pub sender_handle: String,
    pub sender_name: Option<String>,
    pub text: String,
}

/// Result of running one conversation turn.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub response: String,
    pub error: Option<String>,
}

impl DispatchResult {
    pub fn success(response: String) -> Self {
        Self {
            response,
            error: None,
        }
    }

    pub fn failed(response: String, error: String) -> Self {
        Self {
            response,
            error: Some(error),
        }
    }
}
