//! Configuration loading for the oracle.
//!
//! This module provides:
//! - The deployment file structure (`[oracle]` plus `[[tokens]]`)
//! - Per-token entries converted into strategy params
//! - Registry construction from a file

mod loader;
mod oracle;
mod token;

pub use loader::load_registry;
pub use oracle::{OracleFileConfig, OracleSection};
pub use token::TokenConfig;
