//! Regenerate and locally verify the inclusion proof for one address.

use std::path::PathBuf;
use std::str::FromStr;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use mintgate::{
    leaf_hash, load_allowlist_file, parse_root, verify, write_file_atomic, LoadMode, MerkleTree,
};

#[derive(Parser, Debug)]
#[command(name = "prove")]
#[command(about = "Generate a claim proof for an allowlisted address", long_about = None)]
pub struct Cli {
    /// Allowlist file the published root was built from
    #[arg(short, long)]
    input: PathBuf,

    /// Claimant address
    #[arg(short, long)]
    address: String,

    /// Published Merkle root to verify against (hex). Defaults to the
    /// locally rebuilt root.
    #[arg(short, long)]
    root: Option<String>,

    /// Output JSON file
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Debug, Serialize)]
struct ProofOutput {
    merkle_root: String,
    leaf_layout: String,
    address: String,
    max_claimable: String,
    price: String,
    price_wei: String,
    currency: String,
    leaf: String,
    proof: Vec<String>,
}

pub fn run(args: &Cli) -> Result<()> {
    println!("Loading allowlist from {:?}...", args.input);
    // Strict: proofs must be generated against the exact entry set the
    // published root committed to.
    let list = load_allowlist_file(&args.input, LoadMode::Strict)?.allowlist;

    let address = Address::from_str(args.address.trim()).context("Invalid claimant address")?;
    let entry = list
        .get(address)
        .context("Address not found in allowlist")?;

    println!("Building Merkle tree...");
    let tree = MerkleTree::build(list.leaves()).context("Failed to build Merkle tree")?;
    let root = match &args.root {
        Some(root_str) => parse_root(root_str).context("Invalid Merkle root")?,
        None => tree.root(),
    };

    println!("Generating proof...");
    let leaf = leaf_hash(entry, list.layout());
    let proof = tree.prove(leaf).context("Failed to generate proof")?;

    if !verify(leaf, &proof, root) {
        anyhow::bail!(
            "Proof does not reconstruct root 0x{} (leaf layout: {}); \
             the allowlist file does not match the published root",
            hex::encode(root),
            list.layout()
        );
    }

    let output = ProofOutput {
        merkle_root: format!("0x{}", hex::encode(root)),
        leaf_layout: list.layout().to_string(),
        address: format!("0x{}", hex::encode(entry.address)),
        max_claimable: entry.max_claimable.to_string(),
        price: entry.price.clone(),
        price_wei: entry.price_wei.to_string(),
        currency: format!("0x{}", hex::encode(entry.currency)),
        leaf: format!("0x{}", hex::encode(leaf)),
        proof: proof.iter().map(|h| format!("0x{}", hex::encode(h))).collect(),
    };

    println!("Writing proof to {:?}...", args.output);
    let json = serde_json::to_string_pretty(&output).context("Failed to serialize proof")?;
    write_file_atomic(&args.output, &json).context("Failed to write proof file")?;

    println!("\nProof generated and locally verified!");
    println!("Address: {}", output.address);
    println!("Proof length: {} nodes", output.proof.len());
    Ok(())
}
