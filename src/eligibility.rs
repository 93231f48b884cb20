//! Read-only eligibility queries against the deployed drop contract.
//!
//! Each query is independently retryable and independently failable; the
//! aggregate wallet status never crashes on a failed read. A failed read
//! degrades to a conservative default (zero remaining supply, zero price)
//! and is reported through the `partial` flag and `degraded` notes.

use alloy::primitives::{Address, B256, U256};
use alloy::providers::Provider;

use crate::contract::{ClaimCondition, IDropERC721};
use crate::error::QueryError;
use crate::resolver::{resolve, Resolution, Tier};

/// On-chain state of one tier, as relevant to a specific wallet.
#[derive(Debug, Clone)]
pub struct TierStatus {
    pub tier_id: u64,
    pub gated: bool,
    pub merkle_root: B256,
    pub price_wei: U256,
    pub currency: Address,
    /// The tier's blanket per-wallet limit. Zero means the limit comes from
    /// the allowlist entry (or is unlimited on a public tier).
    pub quantity_limit_per_wallet: U256,
    pub remaining_supply: U256,
    pub claimed_by_wallet: U256,
}

impl TierStatus {
    pub fn from_condition(tier_id: u64, cond: &ClaimCondition, claimed_by_wallet: U256) -> Self {
        Self {
            tier_id,
            gated: cond.is_gated(),
            merkle_root: cond.merkleRoot,
            price_wei: cond.pricePerToken,
            currency: cond.currency,
            quantity_limit_per_wallet: cond.quantityLimitPerWallet,
            remaining_supply: cond.remaining_supply(),
            claimed_by_wallet,
        }
    }

    /// Conservative stand-in for a tier whose condition could not be read:
    /// nothing left to claim, zero price.
    pub fn unavailable(tier_id: u64) -> Self {
        Self {
            tier_id,
            gated: false,
            merkle_root: B256::ZERO,
            price_wei: U256::ZERO,
            currency: Address::ZERO,
            quantity_limit_per_wallet: U256::ZERO,
            remaining_supply: U256::ZERO,
            claimed_by_wallet: U256::ZERO,
        }
    }
}

/// Aggregate claim status for one wallet.
#[derive(Debug)]
pub struct WalletStatus {
    /// Which tier the wallet resolved to, if any tier list was supplied
    /// with a public fallback.
    pub resolution: Option<Resolution>,
    pub tier: Option<TierStatus>,
    pub active_tier_id: Option<u64>,
    /// True when the wallet's eligible tier is the chain's currently active
    /// tier. An eligible tier that is not yet active is *not* an error; it
    /// reads as "eligible but not yet open".
    pub open: bool,
    /// True when any individual read failed and a default was substituted.
    pub partial: bool,
    pub degraded: Vec<String>,
}

fn note<T>(result: Result<T, QueryError>, what: &str, degraded: &mut Vec<String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            degraded.push(format!("{what}: {e}"));
            None
        }
    }
}

fn compose_status(
    resolution: Resolution,
    active_tier_id: Option<u64>,
    condition: Option<ClaimCondition>,
    claimed: Option<U256>,
    degraded: Vec<String>,
) -> WalletStatus {
    let tier_id = resolution.tier_id;
    let claimed = claimed.unwrap_or(U256::ZERO);
    let tier = match condition {
        Some(cond) => TierStatus::from_condition(tier_id, &cond, claimed),
        None => TierStatus::unavailable(tier_id),
    };
    WalletStatus {
        open: active_tier_id == Some(tier_id),
        resolution: Some(resolution),
        tier: Some(tier),
        active_tier_id,
        partial: !degraded.is_empty(),
        degraded,
    }
}

/// Typed read-only client over the drop contract.
pub struct EligibilityClient<P: Provider> {
    drop: IDropERC721::IDropERC721Instance<P>,
}

impl<P: Provider> EligibilityClient<P> {
    pub fn new(contract: Address, provider: P) -> Self {
        Self {
            drop: IDropERC721::new(contract, provider),
        }
    }

    /// The chain's currently active claim condition id.
    pub async fn active_tier(&self) -> Result<U256, QueryError> {
        Ok(self.drop.getActiveClaimConditionId().call().await?)
    }

    /// One tier's full on-chain claim condition, decoded at the boundary.
    pub async fn tier_info(&self, tier_id: u64) -> Result<ClaimCondition, QueryError> {
        Ok(self
            .drop
            .getClaimConditionById(U256::from(tier_id))
            .call()
            .await?)
    }

    /// Units this wallet has already claimed under a tier.
    pub async fn claimed_by_wallet(
        &self,
        tier_id: u64,
        wallet: Address,
    ) -> Result<U256, QueryError> {
        Ok(self
            .drop
            .getSupplyClaimedByWallet(U256::from(tier_id), wallet)
            .call()
            .await?)
    }

    /// Aggregate status for a wallet across a prioritized tier list.
    ///
    /// The three reads are independent and side-effect-free, so they are
    /// issued concurrently; a failure in one degrades only its own field.
    pub async fn wallet_status(&self, wallet: Address, tiers: &[Tier]) -> WalletStatus {
        let Some(resolution) = resolve(wallet, tiers) else {
            return WalletStatus {
                resolution: None,
                tier: None,
                active_tier_id: None,
                open: false,
                partial: false,
                degraded: Vec::new(),
            };
        };
        let tier_id = resolution.tier_id;

        let (active, condition, claimed) = tokio::join!(
            self.active_tier(),
            self.tier_info(tier_id),
            self.claimed_by_wallet(tier_id, wallet),
        );

        let mut degraded = Vec::new();
        let active_tier_id = note(active, "active tier read failed", &mut degraded)
            .and_then(|id| match u64::try_from(id) {
                Ok(id) => Some(id),
                Err(_) => {
                    degraded.push(format!("active tier id {id} out of range"));
                    None
                }
            });
        let condition = note(
            condition,
            &format!("tier {tier_id} condition read failed"),
            &mut degraded,
        );
        let claimed = note(
            claimed,
            &format!("tier {tier_id} claimed-by-wallet read failed"),
            &mut degraded,
        );

        compose_status(resolution, active_tier_id, condition, claimed, degraded)
    }
}
