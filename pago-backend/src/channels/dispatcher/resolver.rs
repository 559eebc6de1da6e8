//! Intent resolution: one completion call per turn, mode-dependent shape.

use crate::ai::{AiClient, Message, MessageRole};
use crate::error::DispatchError;
use crate::tools::ToolDefinition;
use serde::Deserialize;
use serde_json::{Value, json};

/// What the model decided to do with the user's message.
#[derive(Debug)]
pub enum ResolvedIntent {
    /// Direct natural-language reply, no action.
    Reply(String),
    /// One tool call to validate and dispatch.
    Invoke { name: String, arguments: Value },
}

/// Structured onboarding output. Empty strings mean "not collected yet".
#[derive(Debug, Deserialize)]
pub struct OnboardingReply {
    pub email: String,
    pub name: String,
    pub message: String,
}

fn onboarding_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "email": {
                "type": "string",
                "description": "Email address collected from the user, or empty string"
            },
            "name": {
                "type": "string",
                "description": "Display name collected from the user, or empty string"
            },
            "message": {
                "type": "string",
                "description": "The reply to send, asking for whatever is still missing"
            }
        },
        "required": ["email", "name", "message"],
        "additionalProperties": false
    })
}

/// Onboarding mode: schema-constrained call, no history, no tools.
///
/// Output that does not conform is surfaced as a SchemaViolation - never
/// silently repaired.
pub async fn resolve_onboarding(
    ai: &AiClient,
    system_prompt: &str,
    user_message: &str,
) -> Result<OnboardingReply, DispatchError> {
    let messages = vec![
        Message {
            role: MessageRole::System,
            content: system_prompt.to_string(),
        },
        Message {
            role: MessageRole::User,
            content: user_message.to_string(),
        },
    ];

    let raw = ai
        .generate_structured(messages, "onboarding_reply", onboarding_schema())
        .await
        .map_err(|e| DispatchError::Resolution(e.to_string()))?;

    let reply: OnboardingReply = serde_json::from_str(&raw).map_err(|e| {
        DispatchError::SchemaViolation(format!("onboarding output did not match schema: {}", e))
    })?;

    if reply.message.trim().is_empty() {
        return Err(DispatchError::SchemaViolation(
            "onboarding output carried an empty continuation message".to_string(),
        ));
    }

    Ok(reply)
}

/// Operational mode: tool catalog attached, model free to pick a tool or
/// answer in plain text.
pub async fn resolve_operational(
    ai: &AiClient,
    system_prompt: &str,
    mut context: Vec<Message>,
    user_message: &str,
    tools: Vec<ToolDefinition>,
) -> Result<ResolvedIntent, DispatchError> {
    let mut messages = Vec::with_capacity(context.len() + 2);
    messages.push(Message {
        role: MessageRole::System,
        content: system_prompt.to_string(),
    });
    messages.append(&mut context);
    messages.push(Message {
        role: MessageRole::User,
        content: user_message.to_string(),
    });

    let response = ai
        .generate_with_tools(messages, tools)
        .await
        .map_err(|e| DispatchError::Resolution(e.to_string()))?;

    if let Some(call) = response.tool_calls.into_iter().next() {
        return Ok(ResolvedIntent::Invoke {
            name: call.name,
            arguments: call.arguments,
        });
    }

    let text = response.content.trim();
    if text.is_empty() {
        return Err(DispatchError::Resolution(
            "completion returned neither text nor a tool call".to_string(),
        ));
    }
    Ok(ResolvedIntent::Reply(text.to_string()))
}
