//! Eligibility report for a wallet: which tier it resolves to, the tier's
//! on-chain state, and whether a claim would currently be accepted.

use std::str::FromStr;

use alloy::primitives::{utils::format_ether, Address, U256};
use alloy::providers::ProviderBuilder;
use anyhow::{Context, Result};
use clap::Parser;

use mintgate::{load_tiers, EligibilityClient};

#[derive(Parser, Debug)]
#[command(name = "status")]
#[command(about = "Show a wallet's claim eligibility and tier state", long_about = None)]
pub struct Cli {
    /// JSON-RPC endpoint URL
    #[arg(long)]
    rpc_url: String,

    /// Drop contract address
    #[arg(short, long)]
    contract: String,

    /// Wallet address to report on
    #[arg(short, long)]
    wallet: String,

    /// Tier spec `ID:ALLOWLIST_PATH` (gated) or `ID` (public fallback),
    /// repeatable, highest priority first
    #[arg(long = "tier", required = true)]
    tiers: Vec<String>,
}

pub async fn run(args: Cli) -> Result<()> {
    let tiers = load_tiers(&args.tiers)?;
    let contract = Address::from_str(args.contract.trim()).context("Invalid contract address")?;
    let wallet = Address::from_str(args.wallet.trim()).context("Invalid wallet address")?;

    println!("Connecting to {}...", args.rpc_url);
    let provider = ProviderBuilder::new()
        .connect(&args.rpc_url)
        .await
        .context("Failed to connect to RPC endpoint")?;
    let client = EligibilityClient::new(contract, provider);

    let status = client.wallet_status(wallet, &tiers).await;

    for warning in &status.degraded {
        eprintln!("Warning: {warning}");
    }

    let Some(resolution) = &status.resolution else {
        println!("No tier matched and no public fallback was supplied.");
        return Ok(());
    };
    let Some(tier) = &status.tier else {
        // wallet_status always pairs a resolution with a tier status.
        anyhow::bail!("Tier state missing for resolved tier {}", resolution.tier_id);
    };

    println!("\nWallet: 0x{}", hex::encode(wallet));
    match &resolution.entry {
        Some(entry) => {
            println!(
                "Eligible tier: {} (allowlisted, up to {} at {} ETH each)",
                resolution.tier_id,
                entry.max_claimable,
                entry.price_display()
            );
        }
        None => println!("Eligible tier: {} (public)", resolution.tier_id),
    }

    match status.active_tier_id {
        Some(active) if status.open => println!("Tier {active} is open now."),
        Some(active) => println!(
            "Eligible but not yet open: tier {active} is currently active on-chain."
        ),
        None => println!("Active tier unknown (read failed)."),
    }

    println!("\nOn-chain tier state:");
    println!("  Gated: {}", if tier.gated { "yes" } else { "no (public)" });
    println!("  Price: {} ETH", format_ether(tier.price_wei));
    println!("  Remaining supply: {}", tier.remaining_supply);
    let limit = if tier.quantity_limit_per_wallet == U256::ZERO {
        "unlimited".to_string()
    } else {
        tier.quantity_limit_per_wallet.to_string()
    };
    println!("  Per-wallet limit: {limit}");
    println!("  Already claimed by wallet: {}", tier.claimed_by_wallet);

    if status.partial {
        println!("\nNote: some reads failed; values above use conservative defaults.");
    }
    Ok(())
}
