//! Typed bindings for the drop contract's claim-condition interface.
//!
//! Every read is decoded once, here, into the generated structs; downstream
//! code never touches raw ABI data.

use alloy::primitives::{B256, U256};
use alloy::sol;

sol! {
    /// One claim tier's on-chain parameters. A zero merkle root means the
    /// tier has no allowlist gate (public tier).
    #[derive(Debug)]
    struct ClaimCondition {
        uint256 startTimestamp;
        uint256 maxClaimableSupply;
        uint256 supplyClaimed;
        uint256 quantityLimitPerWallet;
        bytes32 merkleRoot;
        uint256 pricePerToken;
        address currency;
        string metadata;
    }

    /// Inclusion proof plus the per-entry overrides the leaf commits to.
    #[derive(Debug)]
    struct AllowlistProof {
        bytes32[] proof;
        uint256 quantityLimitPerWallet;
        uint256 pricePerToken;
        address currency;
    }

    #[sol(rpc)]
    interface IDropERC721 {
        function claim(
            address receiver,
            uint256 quantity,
            address currency,
            uint256 pricePerToken,
            AllowlistProof calldata allowlistProof,
            bytes calldata data
        ) external payable;

        function getActiveClaimConditionId() external view returns (uint256);

        function getClaimConditionById(uint256 conditionId)
            external
            view
            returns (ClaimCondition memory);

        function getSupplyClaimedByWallet(uint256 conditionId, address claimer)
            external
            view
            returns (uint256);
    }
}

impl ClaimCondition {
    /// Whether this tier is gated by an allowlist. The zero-filled root is
    /// the on-chain sentinel for "no allowlist".
    pub fn is_gated(&self) -> bool {
        self.merkleRoot != B256::ZERO
    }

    /// Supply still claimable under this tier, saturating at zero.
    pub fn remaining_supply(&self) -> U256 {
        self.maxClaimableSupply.saturating_sub(self.supplyClaimed)
    }
}
