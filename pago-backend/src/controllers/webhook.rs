use crate::AppState;
use crate::channels::types::WebhookEnvelope;
use actix_web::{HttpResponse, Responder, post, web};
use serde_json::json;

/// Inbound message events from the WhatsApp gateway.
///
/// The turn itself runs detached: the gateway only needs an acknowledgement,
/// and a slow completion call must not hold its delivery worker hostage.
#[post("/webhook/whatsapp")]
async fn receive(
    state: web::Data<AppState>,
    envelope: web::Json<WebhookEnvelope>,
) -> impl Responder {
    let envelope = envelope.into_inner();

    if envelope.event_type != "message" {
        log::debug!("[WEBHOOK] Unsupported event '{}'", envelope.event_type);
        return HttpResponse::Ok().json(json!({
            "status": "ignored",
            "reason": "unsupported event",
        }));
    }

    match state.dispatcher.accept(&envelope) {
        Some(message) => {
            let dispatcher = state.dispatcher.clone();
            tokio::spawn(async move {
                let result = dispatcher.dispatch(message).await;
                if let Some(error) = result.error {
                    log::error!("[WEBHOOK] Turn ended with error: {}", error);
                }
            });
            HttpResponse::Ok().json(json!({ "status": "accepted" }))
        }
        None => HttpResponse::Ok().json(json!({ "status": "ignored" })),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(receive);
}
