//! Tier resolution: which allowlist, if any, applies to a claimant.

use std::sync::Arc;

use alloy::primitives::Address;

use crate::allowlist::{Allowlist, AllowlistEntry};

/// One claim tier, in priority order. A tier is either gated by an
/// allowlist or open to the public (the untiered fallback).
#[derive(Debug, Clone)]
pub struct Tier {
    pub id: u64,
    pub gate: Option<Arc<Allowlist>>,
}

impl Tier {
    pub fn gated(id: u64, allowlist: Arc<Allowlist>) -> Self {
        Self {
            id,
            gate: Some(allowlist),
        }
    }

    pub fn public(id: u64) -> Self {
        Self { id, gate: None }
    }

    pub fn is_public(&self) -> bool {
        self.gate.is_none()
    }
}

/// The tier a claimant resolved to, with the matched entitlement when the
/// tier is gated. Holds its own handle on the allowlist so a proof can be
/// regenerated later against the exact list that matched.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub tier_id: u64,
    pub allowlist: Option<Arc<Allowlist>>,
    pub entry: Option<AllowlistEntry>,
}

impl Resolution {
    pub fn is_public(&self) -> bool {
        self.entry.is_none()
    }
}

/// Walks `tiers` in priority order and returns the first match: the first
/// gated tier whose allowlist contains `address`, or the public fallback.
/// Entitlements are never merged across tiers — a higher-priority match
/// wins outright. Returns `None` only when no public fallback was supplied
/// and no gated tier matched.
pub fn resolve(address: Address, tiers: &[Tier]) -> Option<Resolution> {
    for tier in tiers {
        match &tier.gate {
            Some(allowlist) => {
                if let Some(entry) = allowlist.get(address) {
                    return Some(Resolution {
                        tier_id: tier.id,
                        allowlist: Some(Arc::clone(allowlist)),
                        entry: Some(entry.clone()),
                    });
                }
            }
            None => {
                return Some(Resolution {
                    tier_id: tier.id,
                    allowlist: None,
                    entry: None,
                })
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::{parse_allowlist_csv, LoadMode};
    use alloy::primitives::{address, U256};

    fn list(csv: &str) -> Arc<Allowlist> {
        Arc::new(parse_allowlist_csv(csv, LoadMode::Strict).unwrap().allowlist)
    }

    const ALICE: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    const BOB: Address = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

    const FREE: &str = "\
address,maxClaimable,price,currencyAddress
0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa,2,0,0x0000000000000000000000000000000000000000
";
    const DISCOUNTED: &str = "\
address,maxClaimable,price,currencyAddress
0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa,15,0.002,0x0000000000000000000000000000000000000000
0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb,15,0.002,0x0000000000000000000000000000000000000000
";

    #[test]
    fn higher_priority_tier_wins_without_merging() {
        let tiers = vec![
            Tier::gated(1, list(FREE)),
            Tier::gated(2, list(DISCOUNTED)),
            Tier::public(0),
        ];
        // Alice is in both gated tiers; the free tier's entitlement applies.
        let res = resolve(ALICE, &tiers).unwrap();
        assert_eq!(res.tier_id, 1);
        let entry = res.entry.unwrap();
        assert_eq!(entry.max_claimable, U256::from(2));
        assert_eq!(entry.price_wei, U256::ZERO);
    }

    #[test]
    fn falls_through_to_lower_priority_gated_tier() {
        let tiers = vec![
            Tier::gated(1, list(FREE)),
            Tier::gated(2, list(DISCOUNTED)),
            Tier::public(0),
        ];
        let res = resolve(BOB, &tiers).unwrap();
        assert_eq!(res.tier_id, 2);
        assert!(!res.is_public());
    }

    #[test]
    fn unlisted_address_gets_the_public_fallback() {
        let tiers = vec![Tier::gated(2, list(DISCOUNTED)), Tier::public(0)];
        let stranger = address!("cccccccccccccccccccccccccccccccccccccccc");
        let res = resolve(stranger, &tiers).unwrap();
        assert_eq!(res.tier_id, 0);
        assert!(res.is_public());
        assert!(res.allowlist.is_none());
    }

    #[test]
    fn no_match_without_public_fallback() {
        let tiers = vec![Tier::gated(2, list(DISCOUNTED))];
        let stranger = address!("cccccccccccccccccccccccccccccccccccccccc");
        assert!(resolve(stranger, &tiers).is_none());
    }
}
