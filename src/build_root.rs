//! Offline administrative path: build the allowlist Merkle root that gets
//! published on-chain via `setClaimConditions`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use mintgate::{load_allowlist_file, write_file_atomic, LoadMode, MerkleTree};

#[derive(Parser, Debug)]
#[command(name = "build-root")]
#[command(about = "Build the allowlist Merkle root for publishing on-chain", long_about = None)]
pub struct Cli {
    /// Allowlist file (headered CSV, or a JSON entry array)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file for the Merkle root
    #[arg(short, long)]
    root_output: Option<PathBuf>,

    /// Output file for a JSON manifest (root, entries, sample proofs)
    #[arg(short, long)]
    manifest_output: Option<PathBuf>,

    /// Warn and exclude malformed rows instead of rejecting the file.
    /// Only safe before the root is published.
    #[arg(long)]
    tolerant: bool,
}

#[derive(Debug, Serialize)]
struct Manifest {
    list_name: String,
    merkle_root: String,
    leaf_layout: String,
    total_entries: usize,
    generated_at_unix: u64,
    entries: Vec<ManifestEntry>,
    /// Proofs for the first few entries only, to keep the file small.
    /// Full proofs are always regenerable with `mintgate prove`.
    sample_proofs: BTreeMap<String, SampleProof>,
}

#[derive(Debug, Serialize)]
struct ManifestEntry {
    address: String,
    max_claimable: String,
    price: String,
    currency: String,
}

#[derive(Debug, Serialize)]
struct SampleProof {
    max_claimable: String,
    proof: Vec<String>,
}

const SAMPLE_PROOF_COUNT: usize = 10;

pub fn run(args: Cli) -> Result<()> {
    println!("Reading allowlist from {:?}...", args.input);
    let mode = if args.tolerant {
        LoadMode::Tolerant
    } else {
        LoadMode::Strict
    };
    let report = load_allowlist_file(&args.input, mode)?;
    for warning in &report.skipped {
        eprintln!("Warning: excluded {warning}");
    }
    let list = report.allowlist;
    println!("Loaded {} entries ({})", list.len(), list.layout());

    println!("Building Merkle tree...");
    let tree = MerkleTree::build(list.leaves()).context("Failed to build Merkle tree")?;
    let root = format!("0x{}", hex::encode(tree.root()));
    println!("Merkle root: {root}");

    if let Some(path) = &args.root_output {
        write_file_atomic(path, &format!("{root}\n")).context("Failed to write root file")?;
        println!("Wrote root to {path:?}");
    }

    if let Some(path) = &args.manifest_output {
        let leaves = list.leaves();
        let mut sample_proofs = BTreeMap::new();
        for (entry, leaf) in list.entries().iter().zip(&leaves).take(SAMPLE_PROOF_COUNT) {
            let proof = tree.prove(*leaf).context("Failed to generate sample proof")?;
            sample_proofs.insert(
                format!("0x{}", hex::encode(entry.address)),
                SampleProof {
                    max_claimable: entry.max_claimable.to_string(),
                    proof: proof
                        .iter()
                        .map(|h| format!("0x{}", hex::encode(h)))
                        .collect(),
                },
            );
        }

        let manifest = Manifest {
            list_name: args
                .input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            merkle_root: root.clone(),
            leaf_layout: list.layout().to_string(),
            total_entries: list.len(),
            generated_at_unix: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .context("System clock is before the Unix epoch")?
                .as_secs(),
            entries: list
                .entries()
                .iter()
                .map(|e| ManifestEntry {
                    address: format!("0x{}", hex::encode(e.address)),
                    max_claimable: e.max_claimable.to_string(),
                    price: e.price.clone(),
                    currency: format!("0x{}", hex::encode(e.currency)),
                })
                .collect(),
            sample_proofs,
        };
        let json = serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
        write_file_atomic(path, &json).context("Failed to write manifest file")?;
        println!("Wrote manifest to {path:?}");
    }

    println!("Done! Use this root in setClaimConditions().");
    Ok(())
}
