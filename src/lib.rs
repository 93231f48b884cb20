pub mod allowlist;
pub mod common;
pub mod contract;
pub mod eligibility;
pub mod error;
pub mod leaf;
pub mod merkle;
pub mod request;
pub mod resolver;

pub use allowlist::{
    parse_allowlist_csv, parse_allowlist_json, Allowlist, AllowlistEntry, LeafLayout, LoadMode,
    LoadReport,
};
pub use common::{load_allowlist_file, load_tiers, parse_root, parse_tier_spec, write_file_atomic};
pub use eligibility::{EligibilityClient, TierStatus, WalletStatus};
pub use error::{AllowlistError, ClaimError, MerkleError, QueryError};
pub use leaf::leaf_hash;
pub use merkle::{hash_pair, verify, MerkleTree, TreeCache};
pub use request::{build_claim_request, ClaimRequest, TierTerms};
pub use resolver::{resolve, Resolution, Tier};
