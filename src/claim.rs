//! Resolve, prove, and submit a claim transaction.
//!
//! The regenerated proof is verified locally before anything touches the
//! network, so an encoding drift surfaces here instead of as a reverted
//! (and paid-for) transaction. A reverted claim is reported verbatim and
//! never retried automatically.

use std::str::FromStr;

use alloy::primitives::{utils::format_ether, Address, U256};
use alloy::providers::ProviderBuilder;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use clap::Parser;
use zeroize::Zeroize;

use mintgate::contract::IDropERC721;
use mintgate::{build_claim_request, load_tiers, resolve, EligibilityClient, TierTerms, TreeCache};

#[derive(Parser, Debug)]
#[command(name = "claim")]
#[command(about = "Build, verify and submit a claim transaction", long_about = None)]
pub struct Cli {
    /// JSON-RPC endpoint URL
    #[arg(long)]
    rpc_url: String,

    /// Drop contract address
    #[arg(short, long)]
    contract: String,

    /// Private key (hex, with or without 0x prefix), or "-" to read from
    /// stdin (more secure)
    #[arg(short = 'k', long)]
    private_key: String,

    /// Recipient of the minted tokens (defaults to the signer's address)
    #[arg(short, long)]
    receiver: Option<String>,

    /// Number of tokens to claim
    #[arg(short, long)]
    quantity: u64,

    /// Tier spec `ID:ALLOWLIST_PATH` (gated) or `ID` (public fallback),
    /// repeatable, highest priority first
    #[arg(long = "tier", required = true)]
    tiers: Vec<String>,

    /// Build and verify the request but do not submit it
    #[arg(long)]
    dry_run: bool,
}

fn read_private_key(arg: &str) -> Result<PrivateKeySigner> {
    let mut key_str = if arg == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read private key from stdin")?;
        let trimmed = buffer.trim().to_string();
        buffer.zeroize();
        trimmed
    } else {
        arg.to_string()
    };
    if key_str.is_empty() {
        anyhow::bail!("Private key is empty");
    }
    let signer = PrivateKeySigner::from_str(key_str.trim_start_matches("0x"))
        .context("Invalid private key");
    key_str.zeroize();
    signer
}

pub async fn run(args: Cli) -> Result<()> {
    let tiers = load_tiers(&args.tiers)?;
    let contract = Address::from_str(args.contract.trim()).context("Invalid contract address")?;

    let signer = read_private_key(&args.private_key)?;
    let wallet = signer.address();
    let receiver = match &args.receiver {
        Some(r) => Address::from_str(r.trim()).context("Invalid receiver address")?,
        None => wallet,
    };

    println!("Connecting to {}...", args.rpc_url);
    let provider = ProviderBuilder::new()
        .wallet(signer)
        .connect(&args.rpc_url)
        .await
        .context("Failed to connect to RPC endpoint")?;

    println!("Resolving tier for 0x{}...", hex::encode(wallet));
    let resolution = resolve(wallet, &tiers)
        .context("No tier matched; supply a public fallback tier (e.g. --tier 0)")?;
    println!(
        "Resolved to tier {} ({})",
        resolution.tier_id,
        if resolution.is_public() { "public" } else { "allowlisted" }
    );

    let client = EligibilityClient::new(contract, &provider);
    let condition = client
        .tier_info(resolution.tier_id)
        .await
        .context("Failed to read the tier's claim condition")?;
    match client.active_tier().await {
        Ok(active) if active != U256::from(resolution.tier_id) => {
            eprintln!(
                "Warning: tier {} is not yet open (active tier is {active}); \
                 the contract will reject this claim until it opens.",
                resolution.tier_id
            );
        }
        Ok(_) => {}
        Err(e) => eprintln!("Warning: could not read the active tier: {e}"),
    }

    let terms = TierTerms {
        price_per_token: condition.pricePerToken,
        currency: condition.currency,
        merkle_root: condition.is_gated().then_some(condition.merkleRoot),
    };

    println!("Building claim request...");
    let mut cache = TreeCache::new();
    let request = build_claim_request(
        &resolution,
        receiver,
        U256::from(args.quantity),
        &terms,
        &mut cache,
    )?;

    println!("Receiver: 0x{}", hex::encode(request.receiver));
    println!("Quantity: {}", request.quantity);
    println!("Price per token: {} ETH", format_ether(request.price_per_token));
    println!("Value to send: {} ETH", format_ether(request.value));
    println!(
        "Proof: {} nodes (locally verified)",
        request.allowlist_proof.proof.len()
    );

    if args.dry_run {
        println!("\nDry run: not submitting.");
        return Ok(());
    }

    println!("Submitting claim...");
    let drop = IDropERC721::new(contract, &provider);
    let pending = drop
        .claim(
            request.receiver,
            request.quantity,
            request.currency,
            request.price_per_token,
            request.allowlist_proof.clone(),
            request.data.clone(),
        )
        .value(request.value)
        .send()
        .await
        .context("Claim transaction was rejected")?;
    println!("Transaction sent: 0x{}", hex::encode(*pending.tx_hash()));

    let tx_hash = pending
        .watch()
        .await
        .context("Claim transaction failed or was not confirmed")?;
    println!("\nClaim confirmed: 0x{}", hex::encode(tx_hash));
    Ok(())
}
