use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

use crate::allowlist::LeafLayout;

/// Errors raised while loading or constructing an allowlist.
///
/// Any of these is fatal to the whole allowlist: a tree must never be built
/// over a partially-valid entry set, since a published root would then commit
/// to a different leaf set than the one proofs are later generated from.
#[derive(Debug, Error)]
pub enum AllowlistError {
    #[error("row {line}: {source}")]
    Row {
        line: usize,
        #[source]
        source: Box<AllowlistError>,
    },

    #[error("invalid address '{value}': {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("zero address not allowed")]
    ZeroAddress,

    #[error("invalid quantity '{value}'")]
    InvalidQuantity { value: String },

    #[error("invalid price '{value}': {reason}")]
    InvalidPrice { value: String, reason: String },

    #[error("duplicate address {address}")]
    DuplicateAddress { address: Address },

    #[error("allowlist file has no address column")]
    MissingAddressColumn,

    #[error("invalid allowlist JSON: {reason}")]
    InvalidJson { reason: String },

    #[error("allowlist is empty")]
    Empty,

    #[error("entries mix price/currency fields with the plain (address, quantity) layout")]
    MixedLayout,
}

/// Errors from Merkle tree construction and proof generation.
#[derive(Debug, Error)]
pub enum MerkleError {
    #[error("cannot build a Merkle tree with no leaves")]
    EmptyTree,

    #[error("leaf {leaf} not found in tree")]
    LeafNotFound { leaf: B256 },
}

/// Errors from resolving an entitlement and building a claim request.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("no public fallback tier supplied")]
    NoFallbackTier,

    #[error(
        "quantity {requested} exceeds entitlement of {max_claimable} for {address}"
    )]
    EntitlementExceeded {
        address: Address,
        requested: U256,
        max_claimable: U256,
    },

    #[error(
        "proof for tier {tier_id} (leaf layout: {layout}) does not reconstruct \
         root {root}; refusing to submit — local encoding has drifted from the \
         published root"
    )]
    ProofMismatch {
        tier_id: u64,
        layout: LeafLayout,
        root: B256,
    },

    #[error("pricePerToken * quantity overflows uint256")]
    ValueOverflow,

    #[error(transparent)]
    Merkle(#[from] MerkleError),
}

/// Errors from read-only contract queries.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("contract read failed: {0}")]
    Read(#[from] alloy::contract::Error),
}
