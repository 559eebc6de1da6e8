pub mod dispatcher;
pub mod session_lanes;
pub mod types;
pub mod whatsapp;

#[cfg(test)]
mod dispatcher_tests;

pub use dispatcher::MessageDispatcher;
pub use types::{DispatchResult, NormalizedMessage, WebhookEnvelope, WebhookPayload};
pub use whatsapp::{Transport, WppGatewayClient};
