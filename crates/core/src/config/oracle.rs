//! Oracle deployment file.

use alloy::primitives::Address;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::token::{parse_address, TokenConfig};

/// Top-level structure of an oracle TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleFileConfig {
    pub oracle: OracleSection,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
}

/// `[oracle]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleSection {
    /// Deployment name (for logging/identification)
    #[serde(default = "default_name")]
    pub name: String,
    /// HTTP RPC endpoint, `${VAR}` references are expanded
    pub rpc_url: String,
    /// Token whose price converts ETH-denominated prices
    pub eth_token: String,
    /// Address allowed to change the registry
    pub governor: String,
}

fn default_name() -> String {
    "default".to_string()
}

impl OracleFileConfig {
    /// Parse a TOML string and expand environment references.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: OracleFileConfig = toml::from_str(content)?;
        config.expand_env_vars();
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Expand environment variables in config values.
    pub fn expand_env_vars(&mut self) {
        self.oracle.rpc_url = expand_env(&self.oracle.rpc_url);
    }

    pub fn eth_token_address(&self) -> Result<Address> {
        parse_address(&self.oracle.eth_token)
    }

    pub fn governor_address(&self) -> Result<Address> {
        parse_address(&self.oracle.governor)
    }

    /// Look up a token entry by symbol.
    pub fn token(&self, symbol: &str) -> Option<&TokenConfig> {
        self.tokens.iter().find(|t| t.symbol == symbol)
    }

    /// Resolve a reference that is either a `0x` address or a symbol in this file.
    pub fn resolve(&self, reference: &str) -> Result<Address> {
        if reference.starts_with("0x") {
            return parse_address(reference);
        }
        self.token(reference)
            .ok_or_else(|| anyhow!("Unknown token symbol '{}'", reference))?
            .token_address()
    }
}

/// Expand ${VAR_NAME} patterns with environment variable values.
fn expand_env(s: &str) -> String {
    let mut result = s.to_string();
    let Ok(re) = regex_lite::Regex::new(r"\$\{([^}]+)\}") else {
        return result;
    };

    for cap in re.captures_iter(s) {
        if let (Some(full_match), Some(var_match)) = (cap.get(0), cap.get(1)) {
            if let Ok(value) = std::env::var(var_match.as_str()) {
                result = result.replace(full_match.as_str(), &value);
            }
        }
    }

    result
}
