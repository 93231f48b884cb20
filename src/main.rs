#![forbid(unsafe_code)]
#![allow(unreachable_pub)]

use clap::{Parser, Subcommand};

mod build_root;
mod claim;
mod prove;
mod status;

#[derive(Parser, Debug)]
#[command(name = "mintgate")]
#[command(about = "Allowlist-gated NFT drop claim tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    BuildRoot(build_root::Cli),
    Prove(prove::Cli),
    Status(status::Cli),
    Claim(claim::Cli),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::BuildRoot(args) => build_root::run(args)?,
        Commands::Prove(args) => prove::run(&args)?,
        Commands::Status(args) => status::run(args).await?,
        Commands::Claim(args) => claim::run(args).await?,
    }

    Ok(())
}
