//! Builds a populated registry from a deployment file.

use alloy::primitives::Address;
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use super::OracleFileConfig;
use crate::registry::{ConfigRegistry, SingleGovernor};

impl OracleFileConfig {
    /// Create a registry governed by `[oracle] governor` and configure every token.
    ///
    /// Every cross-token reference (the ETH token for ETH-related entries,
    /// each `stables_to_check` entry) must itself be configured in the file.
    pub fn build_registry(&self) -> Result<ConfigRegistry> {
        let governor = self.governor_address().context("Invalid [oracle] governor")?;
        let eth_token = self.eth_token_address().context("Invalid [oracle] eth_token")?;
        let registry = ConfigRegistry::new(SingleGovernor(governor), eth_token);

        let mut configured = HashSet::new();
        let mut references: Vec<(String, Address)> = Vec::new();

        for entry in &self.tokens {
            let token = entry.token_address()?;
            if !configured.insert(token) {
                bail!("Token {} ({}) configured twice", entry.symbol, token);
            }

            let params = entry
                .to_params(|reference| self.resolve(reference))
                .with_context(|| format!("Invalid config for {}", entry.symbol))?;

            if params.common().is_eth_price_related {
                references.push((entry.symbol.clone(), eth_token));
            }
            for stable in params.stables_to_check() {
                references.push((entry.symbol.clone(), *stable));
            }

            registry
                .configure(governor, token, params)
                .with_context(|| format!("Rejected config for {}", entry.symbol))?;
        }

        for (symbol, reference) in &references {
            if !configured.contains(reference) {
                bail!("{} references {} which is not configured", symbol, reference);
            }
        }

        if !configured.contains(&eth_token) {
            warn!(eth_token = %eth_token, "ETH token not configured, ETH-related prices unavailable");
        }

        info!(
            name = %self.oracle.name,
            tokens = registry.snapshot().len(),
            version = registry.version(),
            "Registry loaded"
        );

        Ok(registry)
    }
}

/// Load a deployment file and build its registry.
pub fn load_registry(path: impl AsRef<Path>) -> Result<(OracleFileConfig, ConfigRegistry)> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading oracle configuration");

    let config = OracleFileConfig::from_file(path)
        .with_context(|| format!("Failed to load oracle config from {:?}", path))?;
    let registry = config.build_registry()?;
    Ok((config, registry))
}
