use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenv::dotenv;
use std::sync::Arc;

mod ai;
mod channels;
mod config;
mod controllers;
mod db;
mod error;
mod formatter;
mod history;
mod http;
mod models;
mod onboarding;
mod tools;
mod web3;

use ai::{AiClient, OpenAIClient};
use channels::{MessageDispatcher, Transport, WppGatewayClient};
use config::Config;
use db::Database;
use tools::ToolDeps;
use web3::{ChainClient, EvmChain};

pub struct AppState {
    pub db: Arc<Database>,
    pub dispatcher: Arc<MessageDispatcher>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Arc::new(Database::new(&config.database_url).expect("Failed to initialize database"));

    log::info!("Initializing chain client against {}", config.rpc_url);
    let chain: Arc<dyn ChainClient> =
        Arc::new(EvmChain::new(&config).expect("Failed to initialize chain client"));

    log::info!("Initializing WhatsApp gateway client at {}", config.wpp_base_url);
    let transport: Arc<dyn Transport> = Arc::new(WppGatewayClient::new(&config));

    let ai = AiClient::OpenAI(
        OpenAIClient::new(
            config.ai_api_key.as_deref().unwrap_or(""),
            Some(&config.ai_endpoint),
            Some(&config.ai_model),
        )
        .expect("Failed to initialize completion client"),
    );

    log::info!("Initializing tool registry");
    let registry = Arc::new(tools::create_registry(&ToolDeps {
        db: db.clone(),
        chain: chain.clone(),
        explorer_tx_url: config.explorer_tx_url.clone(),
    }));
    log::info!("Registered {} tools", registry.len());

    let dispatcher = Arc::new(MessageDispatcher::new(
        db.clone(),
        transport,
        registry,
        ai,
        config.bound_handle.clone(),
        config.history_limit,
    ));

    log::info!("Starting pago-backend on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                dispatcher: Arc::clone(&dispatcher),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::webhook::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
