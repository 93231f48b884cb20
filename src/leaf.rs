//! Leaf encoding for the allowlist Merkle tree.
//!
//! The verifying contract reconstructs each leaf as
//! `keccak256(abi.encodePacked(claimer, quantityLimitPerWallet,
//! pricePerToken, currency))` (or the legacy 2-field form), so the packed
//! byte layout here must match that convention bit for bit. This is the only
//! leaf encoder in the crate: the offline root-publishing path and the
//! claim-time proof generator both go through [`leaf_hash`], so the two can
//! never drift apart.

use alloy::primitives::B256;
use sha3::{Digest, Keccak256};

use crate::allowlist::{AllowlistEntry, LeafLayout};

/// Packed-encodes one entry and hashes it to its 32-byte leaf value.
///
/// Full layout: `address (20) ‖ maxClaimable (32, big-endian uint256) ‖
/// priceWei (32, big-endian uint256) ‖ currency (20)`. Legacy layout stops
/// after `maxClaimable`. No padding between fields beyond the types'
/// natural widths.
pub fn leaf_hash(entry: &AllowlistEntry, layout: LeafLayout) -> B256 {
    let mut packed = Vec::with_capacity(104);
    packed.extend_from_slice(entry.address.as_slice());
    packed.extend_from_slice(&entry.max_claimable.to_be_bytes::<32>());
    if layout == LeafLayout::PriceAndCurrency {
        packed.extend_from_slice(&entry.price_wei.to_be_bytes::<32>());
        packed.extend_from_slice(entry.currency.as_slice());
    }
    B256::from_slice(&Keccak256::digest(&packed))
}
