use crate::ai::Message;
use crate::ai::types::{AiError, AiResponse, ToolCall};
use crate::tools::ToolDefinition;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    auth_headers: header::HeaderMap,
    endpoint: String,
    model: Option<String>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAICompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAIFunction,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCall {
    id: String,
    function: OpenAIFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAICompletionResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

impl OpenAIClient {
    pub fn new(api_key: &str, endpoint: Option<&str>, model: Option<&str>) -> Result<Self, String> {
        let endpoint_url = endpoint
            .unwrap_or("https://api.openai.com/v1/chat/completions")
            .to_string();

        let mut auth_headers = header::HeaderMap::new();
        auth_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        // Only add auth header if API key is provided and not empty
        if !api_key.is_empty() {
            let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| format!("Invalid API key format: {}", e))?;
            auth_headers.insert(header::AUTHORIZATION, auth_value);
        }

        let model_name = match model {
            Some(m) if !m.is_empty() => Some(m.to_string()),
            _ => {
                if endpoint_url.contains("openai.com") {
                    Some("gpt-4o".to_string())
                } else {
                    None
                }
            }
        };

        Ok(Self {
            client: crate::http::shared_client().clone(),
            auth_headers,
            endpoint: endpoint_url,
            model: model_name,
            max_tokens: 4096,
        })
    }

    /// Operational-mode completion: full tool catalog attached, model free to
    /// pick a tool or answer in plain text.
    pub async fn generate_with_tools(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
    ) -> Result<AiResponse, AiError> {
        let openai_tools: Option<Vec<OpenAITool>> = if tools.is_empty() {
            None
        } else {
            Some(tools.iter().map(to_openai_tool).collect())
        };

        let request = OpenAICompletionRequest {
            model: self.model.clone(),
            messages: to_openai_messages(messages),
            max_tokens: self.max_tokens,
            tools: openai_tools,
            tool_choice: if tools.is_empty() { None } else { Some("auto".to_string()) },
            response_format: None,
        };

        let data = self.send_with_retry(&request).await?;
        parse_completion(data)
    }

    /// Onboarding-mode completion: output constrained to a fixed JSON schema.
    /// Returns the raw content string; the caller owns schema interpretation.
    pub async fn generate_structured(
        &self,
        messages: Vec<Message>,
        schema_name: &str,
        schema: Value,
    ) -> Result<String, AiError> {
        let request = OpenAICompletionRequest {
            model: self.model.clone(),
            messages: to_openai_messages(messages),
            max_tokens: self.max_tokens,
            tools: None,
            tool_choice: None,
            response_format: Some(json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema_name,
                    "strict": true,
                    "schema": schema,
                }
            })),
        };

        let data = self.send_with_retry(&request).await?;
        let response = parse_completion(data)?;
        if response.content.trim().is_empty() {
            return Err(AiError::new("structured completion returned empty content"));
        }
        Ok(response.content)
    }

    /// POST the request, retrying transient failures with exponential backoff.
    /// Only network errors and gateway/rate-limit statuses are retried;
    /// anything else is the caller's problem.
    async fn send_with_retry(
        &self,
        request: &OpenAICompletionRequest,
    ) -> Result<OpenAICompletionResponse, AiError> {
        const MAX_RETRIES: u32 = 3;
        const BASE_DELAY_MS: u64 = 2000;

        log::info!(
            "[AI] Sending request to {} with model {} ({} tools)",
            self.endpoint,
            self.model.as_deref().unwrap_or("(endpoint default)"),
            request.tools.as_ref().map(|t| t.len()).unwrap_or(0),
        );

        let mut last_error: Option<AiError> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay_ms = BASE_DELAY_MS * (1 << (attempt - 1));
                log::warn!(
                    "[AI] Retry attempt {}/{} after {}ms delay",
                    attempt,
                    MAX_RETRIES,
                    delay_ms
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let response = match self
                .client
                .post(&self.endpoint)
                .headers(self.auth_headers.clone())
                .json(request)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    // Network errors are retryable
                    let err = AiError::new(format!("completion request failed: {}", e));
                    log::warn!("[AI] Request failed (attempt {}): {}", attempt + 1, e);
                    last_error = Some(err);
                    continue;
                }
            };

            let status = response.status();
            let status_code = status.as_u16();

            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                let is_retryable = matches!(status_code, 429 | 502 | 503 | 504);

                let error_msg =
                    if let Ok(parsed) = serde_json::from_str::<OpenAIErrorResponse>(&error_text) {
                        format!("completion API error: {}", parsed.error.message)
                    } else {
                        let truncated = if error_text.len() > 200 {
                            format!("{}...", &error_text[..200])
                        } else {
                            error_text
                        };
                        format!("completion API returned status {}: {}", status, truncated)
                    };

                if is_retryable && attempt < MAX_RETRIES {
                    log::warn!(
                        "[AI] Retryable status {} (attempt {}): {}",
                        status,
                        attempt + 1,
                        error_msg
                    );
                    last_error = Some(AiError::with_status(error_msg, status_code));
                    continue;
                }

                return Err(AiError::with_status(error_msg, status_code));
            }

            let body = response
                .text()
                .await
                .map_err(|e| AiError::new(format!("failed to read completion response: {}", e)))?;

            return serde_json::from_str(&body).map_err(|e| {
                AiError::new(format!("failed to parse completion response: {}", e))
            });
        }

        Err(last_error.unwrap_or_else(|| AiError::new("max retries exceeded")))
    }
}

fn to_openai_messages(messages: Vec<Message>) -> Vec<OpenAIMessage> {
    messages
        .into_iter()
        .map(|m| OpenAIMessage {
            role: m.role.to_string(),
            content: Some(m.content),
        })
        .collect()
}

fn to_openai_tool(definition: &ToolDefinition) -> OpenAITool {
    OpenAITool {
        tool_type: "function".to_string(),
        function: OpenAIFunction {
            name: definition.name.clone(),
            description: definition.description.clone(),
            parameters: definition.input_schema.to_json(),
        },
    }
}

fn parse_completion(data: OpenAICompletionResponse) -> Result<AiResponse, AiError> {
    let choice = data
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AiError::new("completion response had no choices"))?;

    let mut tool_calls = Vec::new();
    for call in choice.message.tool_calls.unwrap_or_default() {
        // OpenAI sends function arguments as a JSON-encoded string
        let arguments: Value = serde_json::from_str(&call.function.arguments).map_err(|e| {
            AiError::new(format!(
                "tool call '{}' carried unparseable arguments: {}",
                call.function.name, e
            ))
        })?;
        tool_calls.push(ToolCall {
            id: call.id,
            name: call.function.name,
            arguments,
        });
    }

    Ok(AiResponse {
        content: choice.message.content.unwrap_or_default(),
        tool_calls,
        stop_reason: choice.finish_reason,
    })
}
