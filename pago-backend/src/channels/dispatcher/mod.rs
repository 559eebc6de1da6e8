//! The per-turn conversation orchestrator.
//!
//! One inbound message runs one turn: filter -> lane -> profile -> mode gate
//! -> intent resolution -> tool dispatch -> formatted reply. Every error in
//! the taxonomy is caught here; the user always gets a friendly message and
//! the turn never takes the process down.

mod resolver;
mod system_prompt;

use crate::ai::AiClient;
use crate::channels::session_lanes::SessionLaneManager;
use crate::channels::types::{DispatchResult, NormalizedMessage, WebhookEnvelope};
use crate::channels::whatsapp::Transport;
use crate::db::Database;
use crate::error::DispatchError;
use crate::history;
use crate::models::UserProfile;
use crate::onboarding::{self, Mode};
use crate::tools::{ToolContext, ToolRegistry};
use std::sync::Arc;

/// What the user sees when a turn fails, whatever the reason. Detail goes to
/// the log, never to the chat.
pub(crate) const APOLOGY: &str =
    "Sorry, something went wrong on my side. Please try again in a moment.";

pub struct MessageDispatcher {
    db: Arc<Database>,
    transport: Arc<dyn Transport>,
    registry: Arc<ToolRegistry>,
    ai: AiClient,
    lanes: SessionLaneManager,
    /// The single authorized chat line this deployment serves. None accepts
    /// any sender.
    bound_handle: Option<String>,
    history_limit: usize,
}

impl MessageDispatcher {
    pub fn new(
        db: Arc<Database>,
        transport: Arc<dyn Transport>,
        registry: Arc<ToolRegistry>,
        ai: AiClient,
        bound_handle: Option<String>,
        history_limit: usize,
    ) -> Self {
        Self {
            db,
            transport,
            registry,
            ai,
            lanes: SessionLaneManager::new(),
            bound_handle,
            history_limit,
        }
    }

    /// Filter and normalize one webhook envelope. Returns None for anything
    /// that should be acknowledged without a turn: non-message events, the
    /// bot's own echoes, traffic for other lines, blank bodies.
    pub fn accept(&self, envelope: &WebhookEnvelope) -> Option<NormalizedMessage> {
        if envelope.event_type != "message" {
            return None;
        }
        let payload = envelope.payload.as_ref()?;

        if payload.is_from_bot {
            log::debug!("[DISPATCHER] Ignoring self-sent message");
            return None;
        }
        if let Some(bound) = &self.bound_handle {
            if payload.sender_handle != *bound {
                log::debug!(
                    "[DISPATCHER] Ignoring message from unauthorized sender {}",
                    payload.sender_handle
                );
                return None;
            }
        }
        if payload.sender_handle.trim().is_empty() || payload.text.trim().is_empty() {
            return None;
        }

        Some(NormalizedMessage {
            sender_handle: payload.sender_handle.clone(),
            sender_name: payload.sender_name.clone(),
            text: payload.text.clone(),
        })
    }

    /// Run one conversation turn end to end.
    pub async fn dispatch(&self, message: NormalizedMessage) -> DispatchResult {
        // Serialize per sender: a turn reads and writes the profile and the
        // wallet balance, and two interleaved turns from one user could
        // otherwise double-spend a balance check.
        let lane = self.lanes.lane(&message.sender_handle);
        let _turn = lane.lock().await;

        if let Err(e) = self.transport.start_typing(&message.sender_handle).await {
            log::debug!("[DISPATCHER] start_typing failed: {}", e);
        }

        let outcome = self.run_turn(&message).await;

        let reply = match &outcome {
            Ok(text) => text.clone(),
            Err(e) => {
                log::error!(
                    "[DISPATCHER] Turn failed for {} ({}): {}",
                    message.sender_handle,
                    e.kind(),
                    e
                );
                APOLOGY.to_string()
            }
        };

        let send_result = self.transport.send_text(&message.sender_handle, &reply).await;

        if let Err(e) = self.transport.stop_typing(&message.sender_handle).await {
            log::debug!("[DISPATCHER] stop_typing failed: {}", e);
        }

        match (outcome, send_result) {
            (Ok(_), Ok(())) => DispatchResult::success(reply),
            (Err(e), _) => DispatchResult::failed(reply, e.to_string()),
            (Ok(_), Err(e)) => {
                log::error!(
                    "[DISPATCHER] Failed to deliver reply to {}: {}",
                    message.sender_handle,
                    e
                );
                DispatchResult::failed(reply, format!("delivery failed: {}", e))
            }
        }
    }

    async fn run_turn(&self, message: &NormalizedMessage) -> Result<String, DispatchError> {
        let profile = self.load_or_create_profile(&message.sender_handle)?;

        match onboarding::next_mode(&profile) {
            Mode::Onboarding => self.run_onboarding_turn(&profile, message).await,
            Mode::Operational => self.run_operational_turn(&profile, message).await,
        }
    }

    fn load_or_create_profile(&self, handle: &str) -> Result<UserProfile, DispatchError> {
        if let Some(profile) = self.db.find_profile(handle).map_err(DispatchError::internal)? {
            return Ok(profile);
        }
        log::info!("[DISPATCHER] First contact from {}", handle);
        self.db
            .create_profile(handle, None)
            .map_err(DispatchError::internal)
    }

    /// Onboarding mode: structured field collection, no history, no tools.
    async fn run_onboarding_turn(
        &self,
        profile: &UserProfile,
        message: &NormalizedMessage,
    ) -> Result<String, DispatchError> {
        let reply = resolver::resolve_onboarding(
            &self.ai,
            system_prompt::onboarding_prompt(),
            &message.text,
        )
        .await?;

        let email = reply.email.trim();
        if !email.is_empty() {
            self.db
                .update_email_address(&profile.contact_handle, email)
                .map_err(DispatchError::internal)?;
        }
        let name = reply.name.trim();
        if !name.is_empty() {
            self.db
                .update_display_name(&profile.contact_handle, name)
                .map_err(DispatchError::internal)?;
        }

        Ok(reply.message)
    }

    /// Operational mode: windowed history, tool catalog, dispatch + format.
    async fn run_operational_turn(
        &self,
        profile: &UserProfile,
        message: &NormalizedMessage,
    ) -> Result<String, DispatchError> {
        // History is context, not state - a gateway hiccup degrades the
        // context window rather than failing the turn.
        let raw_history = match self.transport.get_history(&profile.contact_handle).await {
            Ok(history) => history,
            Err(e) => {
                log::warn!(
                    "[DISPATCHER] History fetch failed for {}: {}",
                    profile.contact_handle,
                    e
                );
                Vec::new()
            }
        };
        let context = history::window(&raw_history, self.history_limit);

        let prompt = system_prompt::operational_prompt(profile);
        let intent = resolver::resolve_operational(
            &self.ai,
            &prompt,
            context,
            &message.text,
            self.registry.definitions(),
        )
        .await?;

        match intent {
            resolver::ResolvedIntent::Reply(text) => Ok(text),
            resolver::ResolvedIntent::Invoke { name, arguments } => {
                log::info!(
                    "[DISPATCHER] Tool call '{}' from {}",
                    name,
                    profile.contact_handle
                );
                let context = ToolContext::new(&profile.contact_handle);
                let outcome = self.registry.dispatch(&name, arguments, &context).await?;
                Ok(outcome.render())
            }
        }
    }
}
