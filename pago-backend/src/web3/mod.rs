//! Chain access for custodial wallets and the stablecoin token.
//!
//! Everything the conversation core needs from the chain sits behind the
//! `ChainClient` trait so tests can substitute a recording fake. The real
//! implementation talks to an EVM RPC endpoint through ethers: wallet
//! generation, native-coin bootstrap funding from the treasury, and ERC-20
//! `balanceOf`/`transfer` against the configured token contract.

use crate::config::Config;
use crate::models::WalletRef;
use async_trait::async_trait;
use ethers::abi::Abi;
use ethers::prelude::*;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on waiting for a transaction to confirm.
const TX_WAIT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub tx_hash: String,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Create a fresh custodial wallet. Pure key generation, no chain call.
    async fn generate_wallet(&self) -> Result<WalletRef, String>;

    /// Send the fixed bootstrap amount of gas currency from the treasury to
    /// a newly created wallet so it can participate in later transfers.
    async fn fund_wallet(&self, address: &str) -> Result<(), String>;

    /// Token balance at an address, in whole-token units.
    async fn get_balance(&self, address: &str) -> Result<f64, String>;

    /// ERC-20 transfer signed with the sender's custodial key. Blocks until
    /// the transaction is mined or the wait deadline passes.
    async fn transfer(
        &self,
        from: &WalletRef,
        to_address: &str,
        amount: f64,
    ) -> Result<TransferReceipt, String>;
}

fn erc20_abi() -> Abi {
    ethers::abi::parse_abi(&[
        "function balanceOf(address owner) external view returns (uint256)",
        "function transfer(address to, uint256 value) external returns (bool)",
    ])
    .expect("static ERC-20 ABI")
}

fn parse_address(address: &str) -> Result<Address, String> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|_| format!("invalid address: {}", address))
}

fn parse_wallet(private_key: &str) -> Result<LocalWallet, String> {
    let key_hex = private_key.strip_prefix("0x").unwrap_or(private_key);
    key_hex
        .parse::<LocalWallet>()
        .map_err(|e| format!("invalid private key: {}", e))
}

/// Whole-token amount to raw token units, via decimal strings so float
/// representation error never changes the transferred value.
pub fn to_token_units(amount: f64, decimals: u8) -> Result<U256, String> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("invalid token amount: {}", amount));
    }
    let fixed = format!("{:.*}", decimals as usize, amount);
    let digits: String = fixed.chars().filter(|c| c.is_ascii_digit()).collect();
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_dec_str(trimmed).map_err(|e| format!("invalid token amount {}: {}", amount, e))
}

/// Raw token units back to a whole-token amount.
pub fn from_token_units(value: U256, decimals: u8) -> f64 {
    let raw = value.to_string();
    let d = decimals as usize;
    let with_point = if raw.len() <= d {
        format!("0.{}{}", "0".repeat(d - raw.len()), raw)
    } else {
        format!("{}.{}", &raw[..raw.len() - d], &raw[raw.len() - d..])
    };
    with_point.parse::<f64>().unwrap_or(0.0)
}

pub struct EvmChain {
    provider: Provider<Http>,
    chain_id: u64,
    token_address: Address,
    token_decimals: u8,
    /// Operator wallet that pays for bootstrap funding. Optional so a
    /// read-only deployment can still serve balances.
    treasury: Option<LocalWallet>,
    bootstrap_fund_wei: U256,
}

impl EvmChain {
    pub fn new(config: &Config) -> Result<Self, String> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| format!("invalid RPC URL '{}': {}", config.rpc_url, e))?;

        let token_address = parse_address(&config.token_address)?;

        let treasury = match config.treasury_private_key.as_deref() {
            Some(key) if !key.is_empty() => {
                Some(parse_wallet(key)?.with_chain_id(config.chain_id))
            }
            _ => {
                log::warn!("[CHAIN] No treasury key configured - wallet funding disabled");
                None
            }
        };

        let bootstrap_fund_wei = U256::from_dec_str(&config.bootstrap_fund_wei)
            .map_err(|e| format!("invalid bootstrap fund amount: {}", e))?;

        Ok(Self {
            provider,
            chain_id: config.chain_id,
            token_address,
            token_decimals: config.token_decimals,
            treasury,
            bootstrap_fund_wei,
        })
    }
}

#[async_trait]
impl ChainClient for EvmChain {
    async fn generate_wallet(&self) -> Result<WalletRef, String> {
        let wallet = LocalWallet::new(&mut rand::thread_rng());
        let address = format!("{:?}", wallet.address());
        log::info!("[CHAIN] Generated wallet {}", address);
        Ok(WalletRef {
            address,
            secret: hex::encode(wallet.signer().to_bytes()),
        })
    }

    async fn fund_wallet(&self, address: &str) -> Result<(), String> {
        let treasury = self
            .treasury
            .clone()
            .ok_or_else(|| "treasury wallet not configured".to_string())?;
        let to = parse_address(address)?;

        let client = SignerMiddleware::new(self.provider.clone(), treasury);
        let tx = TransactionRequest::new().to(to).value(self.bootstrap_fund_wei);

        let pending = client
            .send_transaction(tx, None)
            .await
            .map_err(|e| format!("funding tx rejected: {}", e))?;

        let receipt = tokio::time::timeout(TX_WAIT, pending)
            .await
            .map_err(|_| "funding tx confirmation timed out".to_string())?
            .map_err(|e| format!("funding tx failed: {}", e))?
            .ok_or_else(|| "funding tx dropped from mempool".to_string())?;

        log::info!(
            "[CHAIN] Funded {} with {} wei (tx {:?})",
            address,
            self.bootstrap_fund_wei,
            receipt.transaction_hash
        );
        Ok(())
    }

    async fn get_balance(&self, address: &str) -> Result<f64, String> {
        let owner = parse_address(address)?;
        let contract = Contract::new(
            self.token_address,
            erc20_abi(),
            Arc::new(self.provider.clone()),
        );

        let raw: U256 = contract
            .method::<_, U256>("balanceOf", owner)
            .map_err(|e| format!("balanceOf encoding failed: {}", e))?
            .call()
            .await
            .map_err(|e| format!("balanceOf call failed: {}", e))?;

        Ok(from_token_units(raw, self.token_decimals))
    }

    async fn transfer(
        &self,
        from: &WalletRef,
        to_address: &str,
        amount: f64,
    ) -> Result<TransferReceipt, String> {
        let to = parse_address(to_address)?;
        let value = to_token_units(amount, self.token_decimals)?;
        let wallet = parse_wallet(&from.secret)?.with_chain_id(self.chain_id);

        let client = Arc::new(SignerMiddleware::new(self.provider.clone(), wallet));
        let contract = Contract::new(self.token_address, erc20_abi(), client);

        let call = contract
            .method::<_, bool>("transfer", (to, value))
            .map_err(|e| format!("transfer encoding failed: {}", e))?;

        let pending = call
            .send()
            .await
            .map_err(|e| format!("transfer rejected: {}", e))?;

        let receipt = tokio::time::timeout(TX_WAIT, pending)
            .await
            .map_err(|_| "transfer confirmation timed out".to_string())?
            .map_err(|e| format!("transfer failed: {}", e))?
            .ok_or_else(|| "transfer dropped from mempool".to_string())?;

        Ok(TransferReceipt {
            tx_hash: format!("{:?}", receipt.transaction_hash),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_units_scales_by_decimals() {
        assert_eq!(to_token_units(500.0, 6).unwrap(), U256::from(500_000_000u64));
        assert_eq!(to_token_units(0.5, 6).unwrap(), U256::from(500_000u64));
        assert_eq!(to_token_units(0.0, 6).unwrap(), U256::zero());
    }

    #[test]
    fn to_units_rejects_negative_and_nan() {
        assert!(to_token_units(-1.0, 6).is_err());
        assert!(to_token_units(f64::NAN, 6).is_err());
    }

    #[test]
    fn from_units_round_trips() {
        assert_eq!(from_token_units(U256::from(500_000_000u64), 6), 500.0);
        assert_eq!(from_token_units(U256::from(1u64), 6), 0.000001);
        assert_eq!(from_token_units(U256::zero(), 6), 0.0);
    }

    #[test]
    fn from_units_handles_zero_decimals() {
        assert_eq!(from_token_units(U256::from(42u64), 0), 42.0);
    }
}
