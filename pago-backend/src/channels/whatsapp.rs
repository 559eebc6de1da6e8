//! WhatsApp transport behind a WPPConnect-style HTTP gateway.
//!
//! The gateway owns the actual WhatsApp session; this client only speaks its
//! REST API: send a message, flip the typing indicator, fetch chat history.
//! Everything the conversation core needs is behind the `Transport` trait so
//! tests can substitute a recording fake.

use crate::config::Config;
use crate::models::ConversationMessage;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, handle: &str, text: &str) -> Result<(), String>;
    async fn start_typing(&self, handle: &str) -> Result<(), String>;
    async fn stop_typing(&self, handle: &str) -> Result<(), String>;
    async fn get_history(&self, handle: &str) -> Result<Vec<ConversationMessage>, String>;
}

/// How many raw records to pull per history fetch. The windower trims this
/// further, so it only needs to be comfortably larger than the window.
const HISTORY_FETCH_COUNT: usize = 50;

pub struct WppGatewayClient {
    client: Client,
    base_url: String,
    session: String,
    token: Option<String>,
}

/// Gateway chat-history payload. Fields we don't read are ignored.
#[derive(Debug, Deserialize)]
struct GatewayHistoryResponse {
    #[serde(default)]
    response: Vec<GatewayMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GatewayMessage {
    /// Epoch seconds, the gateway's ordering key.
    t: i64,
    body: String,
    #[serde(rename = "fromMe")]
    from_me: bool,
}

impl WppGatewayClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: crate::http::shared_client().clone(),
            base_url: config.wpp_base_url.trim_end_matches('/').to_string(),
            session: config.wpp_session.clone(),
            token: config.wpp_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, self.session, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn post_json(&self, path: &str, body: serde_json::Value) -> Result<(), String> {
        let response = self
            .authed(self.client.post(self.url(path)))
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("gateway request '{}' failed: {}", path, e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(format!(
                "gateway request '{}' returned {}: {}",
                path, status, detail
            ));
        }
        Ok(())
    }

    async fn set_typing(&self, handle: &str, value: bool) -> Result<(), String> {
        self.post_json("typing", json!({ "phone": handle, "value": value }))
            .await
    }
}

#[async_trait]
impl Transport for WppGatewayClient {
    async fn send_text(&self, handle: &str, text: &str) -> Result<(), String> {
        self.post_json("send-message", json!({ "phone": handle, "message": text }))
            .await
    }

    async fn start_typing(&self, handle: &str) -> Result<(), String> {
        self.set_typing(handle, true).await
    }

    async fn stop_typing(&self, handle: &str) -> Result<(), String> {
        self.set_typing(handle, false).await
    }

    async fn get_history(&self, handle: &str) -> Result<Vec<ConversationMessage>, String> {
        let url = self.url(&format!(
            "all-messages-in-chat/{}?count={}",
            handle, HISTORY_FETCH_COUNT
        ));
        let response = self
            .authed(self.client.get(url))
            .send()
            .await
            .map_err(|e| format!("gateway history fetch failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("gateway history fetch returned {}", status));
        }

        let data: GatewayHistoryResponse = response
            .json()
            .await
            .map_err(|e| format!("gateway history response unparseable: {}", e))?;

        Ok(data
            .response
            .into_iter()
            .map(|m| ConversationMessage {
                timestamp: m.t,
                body: m.body,
                from_user: !m.from_me,
            })
            .collect())
    }
}
