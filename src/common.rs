//! Shared helpers for the CLI commands.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::B256;
use anyhow::Context;

use crate::allowlist::{parse_allowlist_csv, parse_allowlist_json, LoadMode, LoadReport};
use crate::resolver::Tier;

/// Parses a 32-byte Merkle root from a hex string, with or without the
/// "0x" prefix.
pub fn parse_root(root_str: &str) -> anyhow::Result<B256> {
    let cleaned = root_str.trim();
    let cleaned = cleaned.strip_prefix("0x").unwrap_or(cleaned);
    if cleaned.len() != 64 {
        anyhow::bail!(
            "Invalid root length: expected 64 hex chars, got {}",
            cleaned.len()
        );
    }
    let mut root = [0u8; 32];
    hex::decode_to_slice(cleaned, &mut root)
        .map_err(|e| anyhow::anyhow!("Invalid hex encoding: {}", e))?;
    Ok(B256::from(root))
}

/// Writes a file via a temp-file-and-rename so a crash mid-write never
/// leaves a truncated artifact behind.
pub fn write_file_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    use std::io::Write;

    let temp_path = path.with_extension("tmp");
    let mut file = std::fs::File::create(&temp_path).context("Failed to create temp file")?;
    file.write_all(contents.as_bytes())
        .context("Failed to write to temp file")?;
    file.flush().context("Failed to flush temp file")?;
    std::fs::rename(&temp_path, path).context("Failed to move temp file into place")?;
    Ok(())
}

/// Loads an allowlist file, dispatching on extension: `.json` files hold an
/// entry array, anything else is parsed as headered CSV.
pub fn load_allowlist_file(path: &Path, mode: LoadMode) -> anyhow::Result<LoadReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read allowlist file {path:?}"))?;
    let is_json = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let report = if is_json {
        LoadReport {
            allowlist: parse_allowlist_json(&content)
                .with_context(|| format!("Invalid allowlist in {path:?}"))?,
            skipped: Vec::new(),
        }
    } else {
        parse_allowlist_csv(&content, mode)
            .with_context(|| format!("Invalid allowlist in {path:?}"))?
    };
    Ok(report)
}

/// Parses a tier spec of the form `ID:PATH` (gated) or `ID` (public).
pub fn parse_tier_spec(spec: &str) -> anyhow::Result<(u64, Option<PathBuf>)> {
    let (id_str, path) = match spec.split_once(':') {
        Some((id, path)) => (id, Some(PathBuf::from(path))),
        None => (spec, None),
    };
    let id = u64::from_str(id_str.trim())
        .map_err(|_| anyhow::anyhow!("Invalid tier id in spec '{}'", spec))?;
    Ok((id, path))
}

/// Loads a prioritized tier list from CLI `--tier ID[:PATH]` specs, in the
/// order given. Gated allowlists are loaded strictly: a claim-time tool must
/// never silently drop rows that were part of the published root.
pub fn load_tiers(specs: &[String]) -> anyhow::Result<Vec<Tier>> {
    let mut tiers = Vec::with_capacity(specs.len());
    for spec in specs {
        let (id, path) = parse_tier_spec(spec)?;
        match path {
            Some(path) => {
                let report = load_allowlist_file(&path, LoadMode::Strict)?;
                tiers.push(Tier::gated(id, Arc::new(report.allowlist)));
            }
            None => tiers.push(Tier::public(id)),
        }
    }
    if tiers.is_empty() {
        anyhow::bail!("At least one --tier spec is required");
    }
    Ok(tiers)
}
