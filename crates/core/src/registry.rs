//! Governance-controlled pricing configuration.
//!
//! The registry maps each token to its strategy kind and holds the params
//! for every (token, kind) pair. Writes are gated by a [`Governance`]
//! policy and published as immutable, versioned [`RegistrySnapshot`]s:
//! a price query takes one snapshot up front and never sees a half-applied
//! update.

use alloy::primitives::Address;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::OracleError;
use crate::params::{
    CurveDuoParams, CurveTriParams, StableParams, StrategyKind, StrategyParams, UniV2Params,
    UniV3Params,
};

/// Decides who may change the configuration.
pub trait Governance: Send + Sync {
    fn is_governor(&self, caller: &Address) -> bool;
}

/// A single privileged address.
#[derive(Debug, Clone, Copy)]
pub struct SingleGovernor(pub Address);

impl Governance for SingleGovernor {
    fn is_governor(&self, caller: &Address) -> bool {
        *caller == self.0
    }
}

/// A fixed set of privileged addresses.
#[derive(Debug, Clone, Default)]
pub struct GovernorSet(pub Vec<Address>);

impl Governance for GovernorSet {
    fn is_governor(&self, caller: &Address) -> bool {
        self.0.contains(caller)
    }
}

/// Immutable view of the configuration at one version.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    version: u64,
    assignments: HashMap<Address, StrategyKind>,
    params: HashMap<(Address, StrategyKind), StrategyParams>,
}

impl RegistrySnapshot {
    /// Monotonic version, bumped on every successful write.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Strategy kind assigned to `token`.
    pub fn assignment(&self, token: Address) -> Result<StrategyKind, OracleError> {
        self.assignments
            .get(&token)
            .copied()
            .ok_or(OracleError::Unconfigured { token })
    }

    /// Params for the strategy currently assigned to `token`.
    pub fn entry(&self, token: Address) -> Result<&StrategyParams, OracleError> {
        let kind = self.assignment(token)?;
        self.params
            .get(&(token, kind))
            .ok_or(OracleError::ParamsNotSet { token, kind })
    }

    /// Params stored for `(token, kind)`, whether or not `kind` is assigned.
    pub fn params(&self, token: Address, kind: StrategyKind) -> Option<&StrategyParams> {
        self.params.get(&(token, kind))
    }

    /// Every assigned token, in address order.
    pub fn tokens(&self) -> Vec<Address> {
        let mut tokens: Vec<Address> = self.assignments.keys().copied().collect();
        tokens.sort();
        tokens
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// One row of [`ConfigRegistry::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub token: Address,
    pub kind: StrategyKind,
    /// `None` when the kind is assigned but its params were never set
    pub params: Option<StrategyParams>,
}

/// Authoritative store of per-token pricing configuration.
pub struct ConfigRegistry {
    governance: Box<dyn Governance>,
    /// Token the `is_eth_price_related` conversion is priced through
    eth_token: Address,
    state: RwLock<Arc<RegistrySnapshot>>,
}

impl std::fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("ConfigRegistry")
            .field("eth_token", &self.eth_token)
            .field("version", &snapshot.version)
            .field("tokens", &snapshot.len())
            .finish()
    }
}

impl ConfigRegistry {
    /// Create an empty registry.
    pub fn new(governance: impl Governance + 'static, eth_token: Address) -> Self {
        Self {
            governance: Box::new(governance),
            eth_token,
            state: RwLock::new(Arc::new(RegistrySnapshot::default())),
        }
    }

    pub fn eth_token(&self) -> Address {
        self.eth_token
    }

    /// Current configuration. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.state.read())
    }

    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    /// Strategy kind assigned to `token`.
    pub fn get_assignment(&self, token: Address) -> Result<StrategyKind, OracleError> {
        self.state.read().assignment(token)
    }

    /// Every assigned token with its kind and params, in address order.
    pub fn entries(&self) -> Vec<RegistryEntry> {
        let snapshot = self.snapshot();
        snapshot
            .tokens()
            .into_iter()
            .filter_map(|token| {
                let kind = snapshot.assignments.get(&token).copied()?;
                Some(RegistryEntry {
                    token,
                    kind,
                    params: snapshot.params(token, kind).cloned(),
                })
            })
            .collect()
    }

    /// Assign `kind` to `token`, replacing any previous assignment.
    ///
    /// Params stored for other kinds are kept, so switching back restores
    /// the earlier configuration.
    pub fn set_pool_type(
        &self,
        caller: Address,
        token: Address,
        kind: StrategyKind,
    ) -> Result<u64, OracleError> {
        self.authorize(caller)?;
        let version = self.update(|next| {
            next.assignments.insert(token, kind);
            Ok(())
        })?;

        info!(token = %token, kind = %kind, version = version, "Pool type assigned");
        Ok(version)
    }

    /// Store params for `token`. The params' kind must match the assignment.
    pub fn set_params(
        &self,
        caller: Address,
        token: Address,
        params: StrategyParams,
    ) -> Result<u64, OracleError> {
        self.authorize(caller)?;
        params.validate(token, self.eth_token)?;

        let kind = params.kind();
        let version = self.update(|next| {
            let assigned = next.assignment(token)?;
            if assigned != kind {
                return Err(OracleError::WrongPoolType {
                    token,
                    assigned,
                    provided: kind,
                });
            }
            next.params.insert((token, kind), params);
            Ok(())
        })?;

        info!(token = %token, kind = %kind, version = version, "Params updated");
        Ok(version)
    }

    /// Assign the params' kind and store them in one atomic step.
    pub fn configure(
        &self,
        caller: Address,
        token: Address,
        params: StrategyParams,
    ) -> Result<u64, OracleError> {
        self.authorize(caller)?;
        params.validate(token, self.eth_token)?;

        let kind = params.kind();
        let version = self.update(|next| {
            next.assignments.insert(token, kind);
            next.params.insert((token, kind), params);
            Ok(())
        })?;

        info!(token = %token, kind = %kind, version = version, "Token configured");
        Ok(version)
    }

    pub fn set_stable_params(
        &self,
        caller: Address,
        token: Address,
        params: StableParams,
    ) -> Result<u64, OracleError> {
        self.set_params(caller, token, StrategyParams::Stable(params))
    }

    pub fn set_curve_duo_params(
        &self,
        caller: Address,
        token: Address,
        params: CurveDuoParams,
    ) -> Result<u64, OracleError> {
        self.set_params(caller, token, StrategyParams::CurveDuo(params))
    }

    pub fn set_curve_tri_params(
        &self,
        caller: Address,
        token: Address,
        params: CurveTriParams,
    ) -> Result<u64, OracleError> {
        self.set_params(caller, token, StrategyParams::CurveTri(params))
    }

    pub fn set_uni_v2_params(
        &self,
        caller: Address,
        token: Address,
        params: UniV2Params,
    ) -> Result<u64, OracleError> {
        self.set_params(caller, token, StrategyParams::UniV2(params))
    }

    pub fn set_uni_v3_params(
        &self,
        caller: Address,
        token: Address,
        params: UniV3Params,
    ) -> Result<u64, OracleError> {
        self.set_params(caller, token, StrategyParams::UniV3(params))
    }

    fn authorize(&self, caller: Address) -> Result<(), OracleError> {
        if self.governance.is_governor(&caller) {
            Ok(())
        } else {
            debug!(caller = %caller, "Rejected unauthorized registry write");
            Err(OracleError::Unauthorized { caller })
        }
    }

    /// Apply `change` to a copy of the current snapshot and publish it.
    ///
    /// The write lock is held for the whole copy-modify-publish so
    /// concurrent writers serialize; readers keep their old `Arc`.
    fn update(
        &self,
        change: impl FnOnce(&mut RegistrySnapshot) -> Result<(), OracleError>,
    ) -> Result<u64, OracleError> {
        let mut state = self.state.write();
        let mut next = RegistrySnapshot::clone(&state);
        change(&mut next)?;
        next.version += 1;
        let version = next.version;
        *state = Arc::new(next);
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::CommonParams;
    use crate::u256_math::WAD;
    use alloy::primitives::U256;
    use smallvec::smallvec;

    const GOV: Address = Address::new([0x90; 20]);
    const ETH: Address = Address::new([0xee; 20]);
    const TOKEN: Address = Address::new([0xaa; 20]);

    fn registry() -> ConfigRegistry {
        ConfigRegistry::new(SingleGovernor(GOV), ETH)
    }

    fn common() -> CommonParams {
        CommonParams::bounded(WAD / U256::from(2u8), WAD * U256::from(2u8), 3600)
    }

    fn stable() -> StableParams {
        StableParams {
            common: common(),
            aggregator_oracle: Address::repeat_byte(0x01),
        }
    }

    fn duo() -> CurveDuoParams {
        CurveDuoParams {
            common: common(),
            pool_address: Address::repeat_byte(0x02),
            is_ng: true,
            stables_to_check: smallvec![],
        }
    }

    #[test]
    fn test_unconfigured_token() {
        let registry = registry();
        assert_eq!(
            registry.get_assignment(TOKEN),
            Err(OracleError::Unconfigured { token: TOKEN })
        );
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_assignment_then_params() {
        let registry = registry();
        registry
            .set_pool_type(GOV, TOKEN, StrategyKind::Stable)
            .unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(
            snapshot.entry(TOKEN),
            Err(OracleError::ParamsNotSet {
                token: TOKEN,
                kind: StrategyKind::Stable
            })
        );

        registry.set_stable_params(GOV, TOKEN, stable()).unwrap();
        let entry = registry.snapshot().entry(TOKEN).cloned().unwrap();
        assert_eq!(entry, StrategyParams::Stable(stable()));
    }

    #[test]
    fn test_wrong_pool_type_rejected() {
        let registry = registry();
        registry
            .set_pool_type(GOV, TOKEN, StrategyKind::Stable)
            .unwrap();

        let err = registry.set_curve_duo_params(GOV, TOKEN, duo()).unwrap_err();
        assert_eq!(
            err,
            OracleError::WrongPoolType {
                token: TOKEN,
                assigned: StrategyKind::Stable,
                provided: StrategyKind::CurveDuo,
            }
        );
    }

    #[test]
    fn test_set_params_requires_assignment() {
        let registry = registry();
        let err = registry.set_stable_params(GOV, TOKEN, stable()).unwrap_err();
        assert_eq!(err, OracleError::Unconfigured { token: TOKEN });
    }

    #[test]
    fn test_unauthorized_writes() {
        let registry = registry();
        let intruder = Address::repeat_byte(0x66);

        assert_eq!(
            registry.set_pool_type(intruder, TOKEN, StrategyKind::Stable),
            Err(OracleError::Unauthorized { caller: intruder })
        );
        assert!(registry
            .configure(intruder, TOKEN, StrategyParams::Stable(stable()))
            .is_err());
        assert_eq!(registry.version(), 0);
    }

    #[test]
    fn test_invalid_params_leave_state_untouched() {
        let registry = registry();
        registry
            .configure(GOV, TOKEN, StrategyParams::Stable(stable()))
            .unwrap();
        let before = registry.version();

        let mut bad = stable();
        bad.common.min_price = WAD * U256::from(10u8);
        assert!(matches!(
            registry.set_stable_params(GOV, TOKEN, bad),
            Err(OracleError::InvalidParams { .. })
        ));
        assert_eq!(registry.version(), before);
        assert_eq!(
            registry.snapshot().entry(TOKEN).cloned().unwrap(),
            StrategyParams::Stable(stable())
        );
    }

    #[test]
    fn test_reassignment_keeps_other_params() {
        let registry = registry();
        registry
            .configure(GOV, TOKEN, StrategyParams::Stable(stable()))
            .unwrap();
        registry
            .configure(GOV, TOKEN, StrategyParams::CurveDuo(duo()))
            .unwrap();
        assert_eq!(
            registry.get_assignment(TOKEN).unwrap(),
            StrategyKind::CurveDuo
        );

        registry
            .set_pool_type(GOV, TOKEN, StrategyKind::Stable)
            .unwrap();
        assert_eq!(
            registry.snapshot().entry(TOKEN).cloned().unwrap(),
            StrategyParams::Stable(stable())
        );
    }

    #[test]
    fn test_snapshot_isolation() {
        let registry = registry();
        registry
            .configure(GOV, TOKEN, StrategyParams::Stable(stable()))
            .unwrap();

        let held = registry.snapshot();
        registry
            .configure(GOV, TOKEN, StrategyParams::CurveDuo(duo()))
            .unwrap();

        assert_eq!(held.assignment(TOKEN).unwrap(), StrategyKind::Stable);
        assert_eq!(
            registry.get_assignment(TOKEN).unwrap(),
            StrategyKind::CurveDuo
        );
        assert!(registry.version() > held.version());
    }

    #[test]
    fn test_entries() {
        let registry = registry();
        let other = Address::repeat_byte(0x0b);
        registry
            .configure(GOV, TOKEN, StrategyParams::Stable(stable()))
            .unwrap();
        registry
            .set_pool_type(GOV, other, StrategyKind::UniV2)
            .unwrap();

        let entries = registry.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].token, other);
        assert!(entries[0].params.is_none());
        assert_eq!(entries[1].kind, StrategyKind::Stable);
    }

    #[test]
    fn test_governor_set() {
        let second = Address::repeat_byte(0x91);
        let registry = ConfigRegistry::new(GovernorSet(vec![GOV, second]), ETH);
        assert!(registry
            .set_pool_type(second, TOKEN, StrategyKind::Stable)
            .is_ok());
    }
}
