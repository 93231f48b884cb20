//! Allowlist entries and loading.
//!
//! An allowlist is the canonical input to the Merkle commitment: an ordered
//! set of (address, entitlement) records plus the leaf layout the verifying
//! contract expects. Once loaded it is treated as immutable — the tree cache
//! (see [`crate::merkle::TreeCache`]) keys on allowlist identity, so callers
//! must never mutate entries after construction.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use alloy::primitives::{
    utils::{format_ether, parse_ether},
    Address, U256,
};
use serde::Deserialize;

use crate::error::AllowlistError;
use crate::leaf::leaf_hash;

/// Packed leaf layout used by the verifying contract.
///
/// Fixed once per allowlist, never inferred per entry. A file without
/// price/currency columns selects the legacy layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafLayout {
    /// `(address, maxClaimable, pricePerToken, currency)` — the DropERC721
    /// allowlist override layout.
    PriceAndCurrency,
    /// `(address, maxClaimable)` — legacy 2-field layout.
    AddressQuantity,
}

impl fmt::Display for LeafLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafLayout::PriceAndCurrency => write!(f, "address+quantity+price+currency"),
            LeafLayout::AddressQuantity => write!(f, "address+quantity"),
        }
    }
}

/// One claimant's entitlement record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowlistEntry {
    pub address: Address,
    /// Upper bound on units this address may claim under this tier.
    pub max_claimable: U256,
    /// Price in decimal native units, exactly as loaded (e.g. "0.002").
    pub price: String,
    /// `price` converted once, exactly, to the native currency's smallest
    /// unit. Both the leaf encoding and the claim request read this field,
    /// so the price embedded in the proof can never diverge from the price
    /// passed at the top level of the claim call.
    pub price_wei: U256,
    /// Zero address means the chain's native currency.
    pub currency: Address,
}

impl AllowlistEntry {
    /// Builds an entry, converting `price` to wei with exact fixed-point
    /// arithmetic (18 decimal places). Floating point is never involved.
    pub fn new(
        address: Address,
        max_claimable: U256,
        price: &str,
        currency: Address,
    ) -> Result<Self, AllowlistError> {
        let price = if price.is_empty() { "0" } else { price };
        let price_wei = parse_ether(price).map_err(|e| AllowlistError::InvalidPrice {
            value: price.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            address,
            max_claimable,
            price: price.to_string(),
            price_wei,
            currency,
        })
    }

    /// The entry's price rendered back as a decimal native-unit string.
    pub fn price_display(&self) -> String {
        format_ether(self.price_wei)
    }
}

/// Controls how malformed rows are treated while loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Any malformed row rejects the whole allowlist. Required whenever a
    /// root derived from this list has been (or will be) published.
    Strict,
    /// Malformed rows are excluded with a warning, before any tree is built.
    /// Only for offline tooling; never after a root has been published.
    Tolerant,
}

/// An immutable, validated allowlist: entries in stable input order plus a
/// case-insensitive address index.
#[derive(Debug)]
pub struct Allowlist {
    layout: LeafLayout,
    entries: Vec<AllowlistEntry>,
    index: HashMap<Address, usize>,
}

impl Allowlist {
    /// Validates and indexes a set of entries. Duplicate addresses
    /// (case-insensitive — [`Address`] is compared bytewise after parsing)
    /// and empty entry sets are construction errors.
    pub fn new(layout: LeafLayout, entries: Vec<AllowlistEntry>) -> Result<Self, AllowlistError> {
        if entries.is_empty() {
            return Err(AllowlistError::Empty);
        }
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.address, i).is_some() {
                return Err(AllowlistError::DuplicateAddress {
                    address: entry.address,
                });
            }
        }
        Ok(Self {
            layout,
            entries,
            index,
        })
    }

    pub fn layout(&self) -> LeafLayout {
        self.layout
    }

    pub fn entries(&self) -> &[AllowlistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the entry for an address, if any.
    pub fn get(&self, address: Address) -> Option<&AllowlistEntry> {
        self.index.get(&address).map(|&i| &self.entries[i])
    }

    /// Leaf hashes for every entry, in input order. This is the single
    /// encoding path shared by the offline root-publishing tool and the
    /// claim-time proof generator.
    pub fn leaves(&self) -> Vec<alloy::primitives::B256> {
        self.entries
            .iter()
            .map(|e| leaf_hash(e, self.layout))
            .collect()
    }
}

/// Result of loading an allowlist, including rows excluded in tolerant mode.
#[derive(Debug)]
pub struct LoadReport {
    pub allowlist: Allowlist,
    /// Human-readable notes for rows excluded in [`LoadMode::Tolerant`].
    /// Always empty in strict mode.
    pub skipped: Vec<String>,
}

fn parse_entry_address(value: &str) -> Result<Address, AllowlistError> {
    let address = Address::from_str(value.trim()).map_err(|e| AllowlistError::InvalidAddress {
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    if address == Address::ZERO {
        return Err(AllowlistError::ZeroAddress);
    }
    Ok(address)
}

fn parse_quantity(value: &str) -> Result<U256, AllowlistError> {
    U256::from_str(value.trim()).map_err(|_| AllowlistError::InvalidQuantity {
        value: value.to_string(),
    })
}

fn row_error(line: usize, source: AllowlistError) -> AllowlistError {
    AllowlistError::Row {
        line,
        source: Box::new(source),
    }
}

/// Parses an allowlist from CSV text with a header row:
/// `address, maxClaimable[, price][, currencyAddress]` (column names are
/// case-insensitive). Absence of both price and currency columns selects
/// the legacy [`LeafLayout::AddressQuantity`] layout for the whole file.
pub fn parse_allowlist_csv(content: &str, mode: LoadMode) -> Result<LoadReport, AllowlistError> {
    let mut lines = content.lines().enumerate();
    let header = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => continue,
            Some((_, line)) => break line,
            None => return Err(AllowlistError::Empty),
        }
    };

    let columns: Vec<String> = header
        .split(',')
        .map(|c| c.trim().to_ascii_lowercase())
        .collect();
    let address_idx = columns
        .iter()
        .position(|c| c == "address")
        .ok_or(AllowlistError::MissingAddressColumn)?;
    let quantity_idx = columns.iter().position(|c| c == "maxclaimable");
    let price_idx = columns.iter().position(|c| c == "price");
    let currency_idx = columns.iter().position(|c| c == "currencyaddress");

    let layout = if price_idx.is_some() || currency_idx.is_some() {
        LeafLayout::PriceAndCurrency
    } else {
        LeafLayout::AddressQuantity
    };

    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for (i, raw) in lines {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.split(',').map(str::trim).collect();
        let parsed = parse_csv_row(&cols, address_idx, quantity_idx, price_idx, currency_idx);
        match parsed {
            Ok(entry) => entries.push(entry),
            Err(e) => match mode {
                LoadMode::Strict => return Err(row_error(line_no, e)),
                LoadMode::Tolerant => skipped.push(format!("row {line_no}: {e}")),
            },
        }
    }

    let allowlist = Allowlist::new(layout, entries)?;
    Ok(LoadReport { allowlist, skipped })
}

fn parse_csv_row(
    cols: &[&str],
    address_idx: usize,
    quantity_idx: Option<usize>,
    price_idx: Option<usize>,
    currency_idx: Option<usize>,
) -> Result<AllowlistEntry, AllowlistError> {
    let address = parse_entry_address(cols.get(address_idx).copied().unwrap_or_default())?;
    let max_claimable = match quantity_idx.and_then(|i| cols.get(i)).copied() {
        Some(v) if !v.is_empty() => parse_quantity(v)?,
        _ => U256::from(1),
    };
    let price = price_idx
        .and_then(|i| cols.get(i))
        .copied()
        .unwrap_or_default();
    let currency = match currency_idx.and_then(|i| cols.get(i)).copied() {
        Some(v) if !v.is_empty() => {
            Address::from_str(v).map_err(|e| AllowlistError::InvalidAddress {
                value: v.to_string(),
                reason: e.to_string(),
            })?
        }
        _ => Address::ZERO,
    };
    AllowlistEntry::new(address, max_claimable, price, currency)
}

#[derive(Debug, Deserialize)]
struct RawJsonEntry {
    address: String,
    #[serde(rename = "maxClaimable")]
    max_claimable: Option<u64>,
    price: Option<String>,
    #[serde(rename = "currencyAddress")]
    currency_address: Option<String>,
}

/// Parses an allowlist from a JSON array of entry objects (the format the
/// csv-to-json conversion produces). The layout is fixed for the whole
/// file: entries must uniformly carry price/currency fields or uniformly
/// omit them.
pub fn parse_allowlist_json(content: &str) -> Result<Allowlist, AllowlistError> {
    let raw: Vec<RawJsonEntry> =
        serde_json::from_str(content).map_err(|e| AllowlistError::InvalidJson {
            reason: e.to_string(),
        })?;
    if raw.is_empty() {
        return Err(AllowlistError::Empty);
    }

    let with_overrides = raw[0].price.is_some() || raw[0].currency_address.is_some();
    let layout = if with_overrides {
        LeafLayout::PriceAndCurrency
    } else {
        LeafLayout::AddressQuantity
    };

    let mut entries = Vec::with_capacity(raw.len());
    for (i, raw_entry) in raw.iter().enumerate() {
        let line_no = i + 1;
        let entry_overrides =
            raw_entry.price.is_some() || raw_entry.currency_address.is_some();
        if entry_overrides != with_overrides {
            return Err(row_error(line_no, AllowlistError::MixedLayout));
        }
        let address =
            parse_entry_address(&raw_entry.address).map_err(|e| row_error(line_no, e))?;
        let max_claimable = U256::from(raw_entry.max_claimable.unwrap_or(1));
        let price = raw_entry.price.as_deref().unwrap_or("");
        let currency = match raw_entry.currency_address.as_deref() {
            Some(v) if !v.is_empty() => Address::from_str(v.trim())
                .map_err(|e| {
                    row_error(
                        line_no,
                        AllowlistError::InvalidAddress {
                            value: v.to_string(),
                            reason: e.to_string(),
                        },
                    )
                })?,
            _ => Address::ZERO,
        };
        entries.push(
            AllowlistEntry::new(address, max_claimable, price, currency)
                .map_err(|e| row_error(line_no, e))?,
        );
    }

    Allowlist::new(layout, entries)
}
