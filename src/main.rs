//! Multi-source price oracle
//!
//! Loads a token configuration, connects to an RPC endpoint and reports the
//! verified and unverified price of every configured token.
//! Features:
//! - Aggregator feeds, Curve EMA pools and Uniswap V2/V3 pools
//! - Staleness, bounds and delta verification
//! - Optional parity comparison against a second configuration

use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use oracle_chain::{FeedReader, PoolReader, ProviderManager};
use oracle_core::{
    compare_engines, load_registry, u256_math::wad_to_f64, OracleEngine, OracleFileConfig,
    PriceQuote,
};

/// Environment variable names.
mod env {
    pub const ORACLE_CONFIG: &str = "ORACLE_CONFIG";
    pub const RPC_URL: &str = "RPC_URL";
    pub const COMPARE_CONFIG: &str = "COMPARE_CONFIG";
}

const DEFAULT_CONFIG: &str = "config/oracle.example.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,oracle_core=debug,oracle_chain=debug")),
        )
        .init();

    let config_path =
        std::env::var(env::ORACLE_CONFIG).unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let (config, registry) = load_registry(&config_path)?;

    let rpc_url = std::env::var(env::RPC_URL).unwrap_or_else(|_| config.oracle.rpc_url.clone());
    let provider = ProviderManager::new(&rpc_url)
        .await
        .context("Failed to connect to RPC")?;
    let chain_id = provider.chain_id().await?;
    let block = provider.block_number().await?;
    info!(chain_id = chain_id, block = block, "Provider initialized");

    let reader = Arc::new(provider.reader()?);
    let feeds: Arc<dyn FeedReader> = reader.clone();
    let pools: Arc<dyn PoolReader> = reader;

    let engine = OracleEngine::new(Arc::new(registry), feeds.clone(), pools.clone());
    let report = price_report(&engine, &config).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Ok(compare_path) = std::env::var(env::COMPARE_CONFIG) {
        let (compare_config, compare_registry) = load_registry(&compare_path)?;
        let other = OracleEngine::new(Arc::new(compare_registry), feeds, pools);

        let mut tokens = token_addresses(&config)?;
        for token in token_addresses(&compare_config)? {
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }

        let parity = compare_engines(&engine, &other, &tokens).await;
        println!("{}", serde_json::to_string_pretty(&parity)?);
        if !parity.is_clean() {
            anyhow::bail!(
                "{} parity mismatches between {} and {}",
                parity.mismatches.len(),
                config_path,
                compare_path
            );
        }
    }

    Ok(())
}

/// One line of the price report.
#[derive(Debug, Serialize)]
struct TokenReport {
    symbol: String,
    token: Address,
    verified: Option<PriceQuote>,
    unverified: Option<PriceQuote>,
    error: Option<String>,
}

async fn price_report(engine: &OracleEngine, config: &OracleFileConfig) -> Vec<TokenReport> {
    let reports = config.tokens.iter().map(|entry| async move {
        let token = match entry.token_address() {
            Ok(token) => token,
            Err(e) => {
                return TokenReport {
                    symbol: entry.symbol.clone(),
                    token: Address::ZERO,
                    verified: None,
                    unverified: None,
                    error: Some(e.to_string()),
                }
            }
        };

        let (verified, unverified) = futures::join!(
            engine.get_quote_verified(token),
            engine.get_quote_unverified(token)
        );

        match &verified {
            Ok(quote) => info!(
                symbol = %entry.symbol,
                price = wad_to_f64(quote.price),
                updated = %format_timestamp(quote.source_timestamp),
                "Verified price"
            ),
            Err(e) => warn!(symbol = %entry.symbol, error = %e, "Verification failed"),
        }

        TokenReport {
            symbol: entry.symbol.clone(),
            token,
            error: verified.as_ref().err().map(|e| e.to_string()),
            verified: verified.ok(),
            unverified: unverified.ok(),
        }
    });

    join_all(reports).await
}

fn token_addresses(config: &OracleFileConfig) -> Result<Vec<Address>> {
    config.tokens.iter().map(|t| t.token_address()).collect()
}

fn format_timestamp(ts: u64) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
