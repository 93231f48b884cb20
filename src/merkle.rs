//! Sorted-pair Merkle tree over allowlist leaves.
//!
//! Construction matches the on-chain verifier's expectation: at each level
//! adjacent nodes are paired, each pair is hashed as
//! `keccak256(min(a, b) ‖ max(a, b))`, and an odd node out promotes to the
//! next level unchanged. Pair sorting makes the root invariant to leaf
//! order, so two trees built from the same entry set loaded in any order
//! commit to the same root.

use std::sync::Arc;

use alloy::primitives::B256;
use sha3::{Digest, Keccak256};

use crate::allowlist::Allowlist;
use crate::error::MerkleError;

/// Hashes two nodes in lexicographic order.
pub fn hash_pair(a: B256, b: B256) -> B256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let digest = Keccak256::new().chain_update(lo).chain_update(hi).finalize();
    B256::from_slice(&digest)
}

/// An immutable Merkle tree. Level 0 holds the leaves in input order;
/// the last level holds the single root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<B256>>,
}

impl MerkleTree {
    /// Builds the tree bottom-up. Fails on an empty leaf set.
    pub fn build(leaves: Vec<B256>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyTree);
        }
        let mut levels = vec![leaves];
        while levels.last().map(Vec::len).unwrap_or(0) > 1 {
            let level = levels.last().map(Vec::as_slice).unwrap_or(&[]);
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            for chunk in level.chunks(2) {
                match chunk {
                    [left, right] => next.push(hash_pair(*left, *right)),
                    // Odd node out promotes unchanged.
                    [single] => next.push(*single),
                    _ => unreachable!("chunks(2) yields 1 or 2 elements"),
                }
            }
            levels.push(next);
        }
        Ok(Self { levels })
    }

    pub fn root(&self) -> B256 {
        self.levels[self.levels.len() - 1][0]
    }

    pub fn leaves(&self) -> &[B256] {
        &self.levels[0]
    }

    /// Sibling hash sequence from `leaf` up to (but excluding) the root.
    /// A single-leaf tree yields the empty proof.
    pub fn prove(&self, leaf: B256) -> Result<Vec<B256>, MerkleError> {
        let mut index = self
            .leaves()
            .iter()
            .position(|l| *l == leaf)
            .ok_or(MerkleError::LeafNotFound { leaf })?;

        let mut proof = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = index ^ 1;
            if sibling < level.len() {
                proof.push(level[sibling]);
            }
            index /= 2;
        }
        Ok(proof)
    }
}

/// Recomputes the root from a leaf and its proof, sorting each pair the way
/// the on-chain verifier does. Runs locally before every submission to catch
/// encoding drift before spending gas.
pub fn verify(leaf: B256, proof: &[B256], root: B256) -> bool {
    let mut acc = leaf;
    for sibling in proof {
        acc = hash_pair(acc, *sibling);
    }
    acc == root
}

/// Caller-owned cache of the last tree built for an allowlist.
///
/// Keyed by allowlist *identity* (the `Arc` pointer), not deep equality:
/// allowlists are immutable once loaded, so a new load is a new `Arc` and
/// the stale tree is discarded. A mutated-but-reference-equal allowlist
/// would be served a stale tree, which is why mutation after load is a
/// contract violation on the caller's side.
#[derive(Debug, Default)]
pub struct TreeCache {
    slot: Option<(usize, Arc<MerkleTree>)>,
}

impl TreeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached tree for this allowlist, building it if the cache
    /// is empty or holds a tree for a different allowlist.
    pub fn tree_for(&mut self, allowlist: &Arc<Allowlist>) -> Result<Arc<MerkleTree>, MerkleError> {
        let key = Arc::as_ptr(allowlist) as usize;
        if let Some((cached_key, tree)) = &self.slot {
            if *cached_key == key {
                return Ok(Arc::clone(tree));
            }
        }
        let tree = Arc::new(MerkleTree::build(allowlist.leaves())?);
        self.slot = Some((key, Arc::clone(&tree)));
        Ok(tree)
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::{parse_allowlist_csv, LoadMode};

    fn leaves(n: u8) -> Vec<B256> {
        (1..=n).map(|i| B256::repeat_byte(i)).collect()
    }

    #[test]
    fn single_leaf_tree_root_is_leaf_and_proof_is_empty() {
        let leaf = B256::repeat_byte(1);
        let tree = MerkleTree::build(vec![leaf]).unwrap();
        assert_eq!(tree.root(), leaf);
        let proof = tree.prove(leaf).unwrap();
        assert!(proof.is_empty());
        assert!(verify(leaf, &proof, tree.root()));
    }

    #[test]
    fn empty_leaf_set_rejected() {
        assert!(matches!(
            MerkleTree::build(Vec::new()).unwrap_err(),
            MerkleError::EmptyTree
        ));
    }

    #[test]
    fn every_leaf_proves_against_the_root() {
        for n in [2u8, 3, 4, 5, 8, 13] {
            let set = leaves(n);
            let tree = MerkleTree::build(set.clone()).unwrap();
            for leaf in set {
                let proof = tree.prove(leaf).unwrap();
                assert!(verify(leaf, &proof, tree.root()), "n={n} leaf={leaf}");
            }
        }
    }

    #[test]
    fn root_is_order_independent() {
        let forward = leaves(7);
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut shuffled = forward.clone();
        shuffled.swap(0, 4);
        shuffled.swap(2, 6);

        let root = MerkleTree::build(forward).unwrap().root();
        assert_eq!(root, MerkleTree::build(reversed).unwrap().root());
        assert_eq!(root, MerkleTree::build(shuffled).unwrap().root());
    }

    #[test]
    fn absent_leaf_is_not_found() {
        let tree = MerkleTree::build(leaves(4)).unwrap();
        let absent = B256::repeat_byte(0x99);
        assert!(matches!(
            tree.prove(absent).unwrap_err(),
            MerkleError::LeafNotFound { leaf } if leaf == absent
        ));
    }

    #[test]
    fn verify_rejects_wrong_root() {
        let set = leaves(4);
        let tree = MerkleTree::build(set.clone()).unwrap();
        let proof = tree.prove(set[0]).unwrap();
        assert!(!verify(set[0], &proof, B256::repeat_byte(0xff)));
    }

    #[test]
    fn verify_rejects_tampered_proof() {
        let set = leaves(4);
        let tree = MerkleTree::build(set.clone()).unwrap();
        let mut proof = tree.prove(set[0]).unwrap();
        proof[0] = B256::repeat_byte(0xee);
        assert!(!verify(set[0], &proof, tree.root()));
    }

    #[test]
    fn reversed_csv_rows_give_identical_roots() {
        let forward = "\
address,maxClaimable,price,currencyAddress
0xaaaAAAaAaaAAAaaaAaAaAAaAAAaaAaaaAAAAaAaA,15,0.002,0x0000000000000000000000000000000000000000
0xBbbBBBbbBBBbbbBbbBbbBBbBBBbbBbbbBBBBbBbB,5,0.05,0x0000000000000000000000000000000000000000
0xCccCCCccCCCcccCccCccCCcCCCccCcccCCCCcCcC,1,0,0x0000000000000000000000000000000000000000
";
        let backward = "\
address,maxClaimable,price,currencyAddress
0xCccCCCccCCCcccCccCccCCcCCCccCcccCCCCcCcC,1,0,0x0000000000000000000000000000000000000000
0xBbbBBBbbBBBbbbBbbBbbBBbBBBbbBbbbBBBBbBbB,5,0.05,0x0000000000000000000000000000000000000000
0xaaaAAAaAaaAAAaaaAaAaAAaAAAaaAaaaAAAAaAaA,15,0.002,0x0000000000000000000000000000000000000000
";
        let a = parse_allowlist_csv(forward, LoadMode::Strict).unwrap().allowlist;
        let b = parse_allowlist_csv(backward, LoadMode::Strict).unwrap().allowlist;
        let root_a = MerkleTree::build(a.leaves()).unwrap().root();
        let root_b = MerkleTree::build(b.leaves()).unwrap().root();
        assert_eq!(root_a, root_b);
    }

    #[test]
    fn cache_reuses_tree_for_same_allowlist_identity() {
        let csv = "\
address,maxClaimable
0xaaaAAAaAaaAAAaaaAaAaAAaAAAaaAaaaAAAAaAaA,15
";
        let list = Arc::new(
            parse_allowlist_csv(csv, LoadMode::Strict).unwrap().allowlist,
        );
        let mut cache = TreeCache::new();
        let first = cache.tree_for(&list).unwrap();
        let second = cache.tree_for(&list).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // A fresh load is a new identity, so the tree is rebuilt.
        let reloaded = Arc::new(
            parse_allowlist_csv(csv, LoadMode::Strict).unwrap().allowlist,
        );
        let third = cache.tree_for(&reloaded).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(first.root(), third.root());
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let csv = "\
address,maxClaimable
0xaaaAAAaAaaAAAaaaAaAaAAaAAAaaAaaaAAAAaAaA,15
";
        let list = Arc::new(
            parse_allowlist_csv(csv, LoadMode::Strict).unwrap().allowlist,
        );
        let mut cache = TreeCache::new();
        let first = cache.tree_for(&list).unwrap();
        cache.invalidate();
        let second = cache.tree_for(&list).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
