pub mod openai;
pub mod types;

pub use openai::OpenAIClient;
pub use types::{AiError, AiResponse, ToolCall};

use crate::tools::ToolDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl ToString for MessageRole {
    fn to_string(&self) -> String {
        match self {
            MessageRole::System => "system".to_string(),
            MessageRole::User => "user".to_string(),
            MessageRole::Assistant => "assistant".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// One mock iteration's INPUT (what was sent) and OUTPUT (what came back).
#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry {
    pub iteration: usize,
    pub input_messages: Vec<Message>,
    pub input_tools: Vec<String>,
    pub output_response: Option<AiResponse>,
    pub output_error: Option<String>,
}

/// Mock AI client for integration tests - returns pre-configured responses
/// from a queue and captures an INPUT/OUTPUT trace for auditing.
#[derive(Clone)]
pub struct MockAiClient {
    responses: Arc<Mutex<VecDeque<Result<AiResponse, AiError>>>>,
    trace: Arc<Mutex<Vec<TraceEntry>>>,
}

impl MockAiClient {
    pub fn new(responses: Vec<Result<AiResponse, AiError>>) -> Self {
        MockAiClient {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            trace: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn next_response_traced(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
    ) -> Result<AiResponse, AiError> {
        let result = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(AiResponse::text("(mock exhausted)")));

        let mut trace = self.trace.lock().unwrap();
        let entry = TraceEntry {
            iteration: trace.len() + 1,
            input_messages: messages,
            input_tools: tools.iter().map(|t| t.name.clone()).collect(),
            output_response: result.as_ref().ok().cloned(),
            output_error: result.as_ref().err().map(|e| e.to_string()),
        };
        trace.push(entry);

        result
    }

    pub fn get_trace(&self) -> Vec<TraceEntry> {
        self.trace.lock().unwrap().clone()
    }
}

/// Unified completion client: the real OpenAI-compatible provider in
/// production, the queue-backed mock in tests.
pub enum AiClient {
    OpenAI(OpenAIClient),
    Mock(MockAiClient),
}

impl AiClient {
    pub async fn generate_with_tools(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
    ) -> Result<AiResponse, AiError> {
        match self {
            AiClient::OpenAI(client) => client.generate_with_tools(messages, tools).await,
            AiClient::Mock(client) => client.next_response_traced(messages, tools),
        }
    }

    /// Schema-constrained completion for onboarding. Returns the raw JSON
    /// content string; the caller parses it against its own schema.
    pub async fn generate_structured(
        &self,
        messages: Vec<Message>,
        schema_name: &str,
        schema: Value,
    ) -> Result<String, AiError> {
        match self {
            AiClient::OpenAI(client) => {
                client.generate_structured(messages, schema_name, schema).await
            }
            AiClient::Mock(client) => client
                .next_response_traced(messages, vec![])
                .map(|r| r.content),
        }
    }
}
