//! Side-by-side comparison of two engines.
//!
//! Used when migrating a token set between configurations (for example
//! legacy Curve pools to their NG deployments): both engines answer the
//! same queries and every disagreement in price or error kind is reported.

use alloy::primitives::{Address, U256};
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::engine::{OracleEngine, QueryMode};
use crate::error::OracleError;

/// Outcome of one query on one engine, reduced to what is compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Price(U256),
    Error { kind: &'static str, message: String },
}

impl From<&Result<U256, OracleError>> for Outcome {
    fn from(result: &Result<U256, OracleError>) -> Self {
        match result {
            Ok(price) => Self::Price(*price),
            Err(e) => Self::Error {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }
}

impl Outcome {
    /// Same price, or same error variant regardless of message.
    fn agrees_with(&self, other: &Outcome) -> bool {
        match (self, other) {
            (Self::Price(a), Self::Price(b)) => a == b,
            (Self::Error { kind: a, .. }, Self::Error { kind: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// A token/mode pair on which the engines disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub token: Address,
    pub mode: QueryMode,
    pub left: Outcome,
    pub right: Outcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParityReport {
    /// Queries compared (tokens x modes)
    pub checked: usize,
    pub mismatches: Vec<Mismatch>,
}

impl ParityReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Query every token in both modes on both engines and diff the results.
pub async fn compare_engines(
    left: &OracleEngine,
    right: &OracleEngine,
    tokens: &[Address],
) -> ParityReport {
    let mut report = ParityReport::default();

    for mode in [QueryMode::Verified, QueryMode::Unverified] {
        let (left_results, right_results) = futures::join!(
            join_all(tokens.iter().map(|t| price(left, *t, mode))),
            join_all(tokens.iter().map(|t| price(right, *t, mode)))
        );

        for ((token, l), r) in tokens.iter().zip(left_results).zip(right_results) {
            report.checked += 1;
            let (l, r) = (Outcome::from(&l), Outcome::from(&r));
            if !l.agrees_with(&r) {
                warn!(token = %token, mode = mode.as_str(), left = ?l, right = ?r, "Parity mismatch");
                report.mismatches.push(Mismatch {
                    token: *token,
                    mode,
                    left: l,
                    right: r,
                });
            }
        }
    }

    info!(
        checked = report.checked,
        mismatches = report.mismatches.len(),
        "Parity comparison complete"
    );
    report
}

async fn price(engine: &OracleEngine, token: Address, mode: QueryMode) -> Result<U256, OracleError> {
    engine.get_quote(token, mode).await.map(|q| q.price)
}
