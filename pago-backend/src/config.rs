use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    // Completion provider (OpenAI-compatible chat completions)
    pub const AI_ENDPOINT: &str = "PAGO_AI_ENDPOINT";
    pub const AI_API_KEY: &str = "PAGO_AI_API_KEY";
    pub const AI_MODEL: &str = "PAGO_AI_MODEL";
    // WhatsApp HTTP gateway (WPPConnect-style server)
    pub const WPP_BASE_URL: &str = "PAGO_WPP_BASE_URL";
    pub const WPP_SESSION: &str = "PAGO_WPP_SESSION";
    pub const WPP_TOKEN: &str = "PAGO_WPP_TOKEN";
    // The single authorized sender this deployment serves; unset = accept all
    pub const BOUND_HANDLE: &str = "PAGO_BOUND_HANDLE";
    // Chain access
    pub const RPC_URL: &str = "PAGO_RPC_URL";
    pub const CHAIN_ID: &str = "PAGO_CHAIN_ID";
    pub const TOKEN_ADDRESS: &str = "PAGO_TOKEN_ADDRESS";
    pub const TOKEN_DECIMALS: &str = "PAGO_TOKEN_DECIMALS";
    pub const TREASURY_PRIVATE_KEY: &str = "PAGO_TREASURY_PRIVATE_KEY";
    pub const BOOTSTRAP_FUND_WEI: &str = "PAGO_BOOTSTRAP_FUND_WEI";
    pub const EXPLORER_TX_URL: &str = "PAGO_EXPLORER_TX_URL";
    // Conversation context
    pub const HISTORY_LIMIT: &str = "PAGO_HISTORY_LIMIT";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/pago.db";
    pub const AI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
    pub const AI_MODEL: &str = "gpt-4o";
    pub const WPP_BASE_URL: &str = "http://localhost:21465";
    pub const WPP_SESSION: &str = "pago";
    pub const RPC_URL: &str = "https://polygon-rpc.com";
    pub const CHAIN_ID: u64 = 137;
    // Native USDC on Polygon PoS
    pub const TOKEN_ADDRESS: &str = "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359";
    pub const TOKEN_DECIMALS: u8 = 6;
    // 0.002 POL, enough gas for a handful of token transfers
    pub const BOOTSTRAP_FUND_WEI: &str = "2000000000000000";
    pub const EXPLORER_TX_URL: &str = "https://polygonscan.com/tx/";
    pub const HISTORY_LIMIT: usize = 10;
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub ai_endpoint: String,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub wpp_base_url: String,
    pub wpp_session: String,
    pub wpp_token: Option<String>,
    pub bound_handle: Option<String>,
    pub rpc_url: String,
    pub chain_id: u64,
    pub token_address: String,
    pub token_decimals: u8,
    pub treasury_private_key: Option<String>,
    pub bootstrap_fund_wei: String,
    pub explorer_tx_url: String,
    pub history_limit: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parse_or(env_vars::PORT, defaults::PORT),
            database_url: var_or(env_vars::DATABASE_URL, defaults::DATABASE_URL),
            ai_endpoint: var_or(env_vars::AI_ENDPOINT, defaults::AI_ENDPOINT),
            ai_api_key: env::var(env_vars::AI_API_KEY).ok(),
            ai_model: var_or(env_vars::AI_MODEL, defaults::AI_MODEL),
            wpp_base_url: var_or(env_vars::WPP_BASE_URL, defaults::WPP_BASE_URL),
            wpp_session: var_or(env_vars::WPP_SESSION, defaults::WPP_SESSION),
            wpp_token: env::var(env_vars::WPP_TOKEN).ok(),
            bound_handle: env::var(env_vars::BOUND_HANDLE).ok().filter(|v| !v.is_empty()),
            rpc_url: var_or(env_vars::RPC_URL, defaults::RPC_URL),
            chain_id: parse_or(env_vars::CHAIN_ID, defaults::CHAIN_ID),
            token_address: var_or(env_vars::TOKEN_ADDRESS, defaults::TOKEN_ADDRESS),
            token_decimals: parse_or(env_vars::TOKEN_DECIMALS, defaults::TOKEN_DECIMALS),
            treasury_private_key: env::var(env_vars::TREASURY_PRIVATE_KEY).ok(),
            bootstrap_fund_wei: var_or(env_vars::BOOTSTRAP_FUND_WEI, defaults::BOOTSTRAP_FUND_WEI),
            explorer_tx_url: var_or(env_vars::EXPLORER_TX_URL, defaults::EXPLORER_TX_URL),
            history_limit: parse_or(env_vars::HISTORY_LIMIT, defaults::HISTORY_LIMIT),
        }
    }
}
