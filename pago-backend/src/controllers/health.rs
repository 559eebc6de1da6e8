use actix_web::{HttpResponse, Responder, get, web};

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "pago-backend",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health);
}
