//! Claim request construction.
//!
//! Packages a resolved entitlement and its regenerated Merkle proof into the
//! exact argument tuple the contract's `claim` function expects. The proof
//! is verified locally against the published root before the request is
//! handed back, so an encoding drift between this crate and the on-chain
//! verifier is caught here instead of as a reverted transaction.

use alloy::primitives::{Address, Bytes, B256, U256};

use crate::contract::AllowlistProof;
use crate::error::ClaimError;
use crate::leaf::leaf_hash;
use crate::merkle::{verify, TreeCache};
use crate::resolver::Resolution;

/// The tier's own on-chain terms, read from its claim condition. Used
/// directly for public claims; for gated claims only the published root is
/// consulted (the entry's overrides take precedence over the tier's terms).
#[derive(Debug, Clone, Copy)]
pub struct TierTerms {
    pub price_per_token: U256,
    pub currency: Address,
    /// The root published on-chain for this tier, when gated. When absent,
    /// the locally built root is used for the preflight check only.
    pub merkle_root: Option<B256>,
}

/// The fully assembled argument set for one `claim` call.
#[derive(Debug, Clone)]
pub struct ClaimRequest {
    pub tier_id: u64,
    pub receiver: Address,
    pub quantity: U256,
    pub currency: Address,
    pub price_per_token: U256,
    pub allowlist_proof: AllowlistProof,
    pub data: Bytes,
    /// Native value to attach: `price_per_token * quantity` when the
    /// currency is the native sentinel, zero otherwise.
    pub value: U256,
}

/// Builds the claim request for a resolved tier.
///
/// Gated path: rejects quantities above the entry's cap before any network
/// call, regenerates the proof from the matched allowlist, and verifies it
/// against the published root (or the locally built one when no published
/// root was supplied). The price inside the proof and the top-level price
/// are the same `U256`, read from the entry's single exact conversion.
///
/// Public path: empty proof, zero `quantityLimitPerWallet` (defer to the
/// tier's blanket limit), tier price and currency echoed into the proof.
pub fn build_claim_request(
    resolution: &Resolution,
    receiver: Address,
    quantity: U256,
    terms: &TierTerms,
    cache: &mut TreeCache,
) -> Result<ClaimRequest, ClaimError> {
    let (currency, price_per_token, allowlist_proof) = match (&resolution.entry, &resolution.allowlist) {
        (Some(entry), Some(allowlist)) => {
            if quantity > entry.max_claimable {
                return Err(ClaimError::EntitlementExceeded {
                    address: entry.address,
                    requested: quantity,
                    max_claimable: entry.max_claimable,
                });
            }

            let tree = cache.tree_for(allowlist)?;
            let leaf = leaf_hash(entry, allowlist.layout());
            let proof = tree.prove(leaf)?;
            let root = terms.merkle_root.unwrap_or_else(|| tree.root());
            if !verify(leaf, &proof, root) {
                return Err(ClaimError::ProofMismatch {
                    tier_id: resolution.tier_id,
                    layout: allowlist.layout(),
                    root,
                });
            }

            let proof = AllowlistProof {
                proof,
                // The leaf commits to the entry's personal cap, and the
                // verifying contract checks the proof fields against the
                // leaf, so this must be the entry's value, never zero.
                quantityLimitPerWallet: entry.max_claimable,
                pricePerToken: entry.price_wei,
                currency: entry.currency,
            };
            (entry.currency, entry.price_wei, proof)
        }
        _ => {
            let proof = AllowlistProof {
                proof: Vec::new(),
                quantityLimitPerWallet: U256::ZERO,
                pricePerToken: terms.price_per_token,
                currency: terms.currency,
            };
            (terms.currency, terms.price_per_token, proof)
        }
    };

    let cost = price_per_token
        .checked_mul(quantity)
        .ok_or(ClaimError::ValueOverflow)?;
    let value = if currency == Address::ZERO {
        cost
    } else {
        U256::ZERO
    };

    Ok(ClaimRequest {
        tier_id: resolution.tier_id,
        receiver,
        quantity,
        currency,
        price_per_token,
        allowlist_proof,
        data: Bytes::new(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::{parse_allowlist_csv, Allowlist, LoadMode};
    use crate::merkle::MerkleTree;
    use crate::resolver::{resolve, Tier};
    use alloy::primitives::address;
    use std::sync::Arc;

    const ALICE: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");

    const DISCOUNTED: &str = "\
address,maxClaimable,price,currencyAddress
0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa,15,0.002,0x0000000000000000000000000000000000000000
0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb,10,0.05,0x0000000000000000000000000000000000000000
";

    fn discounted() -> Arc<Allowlist> {
        Arc::new(
            parse_allowlist_csv(DISCOUNTED, LoadMode::Strict)
                .unwrap()
                .allowlist,
        )
    }

    fn gated_terms(list: &Arc<Allowlist>) -> TierTerms {
        TierTerms {
            price_per_token: U256::ZERO,
            currency: Address::ZERO,
            merkle_root: Some(MerkleTree::build(list.leaves()).unwrap().root()),
        }
    }

    #[test]
    fn gated_request_uses_one_price_for_proof_and_call() {
        let list = discounted();
        let tiers = vec![Tier::gated(2, Arc::clone(&list)), Tier::public(0)];
        let resolution = resolve(ALICE, &tiers).unwrap();
        let mut cache = TreeCache::new();

        let req = build_claim_request(
            &resolution,
            ALICE,
            U256::from(3),
            &gated_terms(&list),
            &mut cache,
        )
        .unwrap();

        let expected_price = U256::from(2_000_000_000_000_000u64);
        assert_eq!(req.price_per_token, expected_price);
        assert_eq!(req.allowlist_proof.pricePerToken, expected_price);
        assert_eq!(req.allowlist_proof.quantityLimitPerWallet, U256::from(15));
        assert_eq!(req.currency, Address::ZERO);
        assert_eq!(req.value, expected_price * U256::from(3));
        assert!(!req.allowlist_proof.proof.is_empty());
    }

    #[test]
    fn quantity_above_entitlement_fails_fast() {
        let list = discounted();
        let tiers = vec![Tier::gated(2, Arc::clone(&list)), Tier::public(0)];
        let resolution = resolve(ALICE, &tiers).unwrap();
        let mut cache = TreeCache::new();

        let err = build_claim_request(
            &resolution,
            ALICE,
            U256::from(16),
            &gated_terms(&list),
            &mut cache,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ClaimError::EntitlementExceeded { requested, max_claimable, .. }
                if requested == U256::from(16) && max_claimable == U256::from(15)
        ));
    }

    #[test]
    fn drifted_published_root_is_caught_before_submission() {
        let list = discounted();
        let tiers = vec![Tier::gated(2, Arc::clone(&list)), Tier::public(0)];
        let resolution = resolve(ALICE, &tiers).unwrap();
        let mut cache = TreeCache::new();

        let terms = TierTerms {
            price_per_token: U256::ZERO,
            currency: Address::ZERO,
            merkle_root: Some(B256::repeat_byte(0x42)),
        };
        let err =
            build_claim_request(&resolution, ALICE, U256::from(1), &terms, &mut cache)
                .unwrap_err();
        assert!(matches!(
            err,
            ClaimError::ProofMismatch { tier_id: 2, .. }
        ));
    }

    #[test]
    fn public_request_has_empty_proof_and_tier_terms() {
        let tiers = vec![Tier::public(0)];
        let resolution = resolve(ALICE, &tiers).unwrap();
        let mut cache = TreeCache::new();

        let terms = TierTerms {
            price_per_token: U256::from(10_000_000_000_000_000u64),
            currency: Address::ZERO,
            merkle_root: None,
        };
        let req = build_claim_request(&resolution, ALICE, U256::from(2), &terms, &mut cache)
            .unwrap();

        assert!(req.allowlist_proof.proof.is_empty());
        assert_eq!(req.allowlist_proof.quantityLimitPerWallet, U256::ZERO);
        assert_eq!(req.allowlist_proof.pricePerToken, terms.price_per_token);
        assert_eq!(req.price_per_token, terms.price_per_token);
        assert_eq!(req.value, terms.price_per_token * U256::from(2));
    }

    #[test]
    fn erc20_priced_entry_attaches_no_native_value() {
        let csv = "\
address,maxClaimable,price,currencyAddress
0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa,15,0.002,0xdddddddddddddddddddddddddddddddddddddddd
";
        let list = Arc::new(
            parse_allowlist_csv(csv, LoadMode::Strict).unwrap().allowlist,
        );
        let tiers = vec![Tier::gated(2, Arc::clone(&list)), Tier::public(0)];
        let resolution = resolve(ALICE, &tiers).unwrap();
        let mut cache = TreeCache::new();

        let req = build_claim_request(
            &resolution,
            ALICE,
            U256::from(1),
            &gated_terms(&list),
            &mut cache,
        )
        .unwrap();
        assert_eq!(
            req.currency,
            address!("dddddddddddddddddddddddddddddddddddddddd")
        );
        assert_eq!(req.value, U256::ZERO);
    }

    #[test]
    fn single_entry_tree_claims_with_empty_proof() {
        let csv = "\
address,maxClaimable,price,currencyAddress
0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa,15,0.002,0x0000000000000000000000000000000000000000
";
        let list = Arc::new(
            parse_allowlist_csv(csv, LoadMode::Strict).unwrap().allowlist,
        );
        let tiers = vec![Tier::gated(1, Arc::clone(&list)), Tier::public(0)];
        let resolution = resolve(ALICE, &tiers).unwrap();
        let mut cache = TreeCache::new();

        let req = build_claim_request(
            &resolution,
            ALICE,
            U256::from(1),
            &gated_terms(&list),
            &mut cache,
        )
        .unwrap();
        // One leaf: the leaf is the root and the proof is empty.
        assert!(req.allowlist_proof.proof.is_empty());
    }
}
