//! Infrastructure Data Layer
//!
//! This crate provides the local data adapters for the claims workflow:
//!
//! - **CSV snapshot**: the patients, claims, and coverage rule tables are read
//!   once at startup into an immutable [`DataSnapshot`](domain_claims::DataSnapshot)
//! - **Policy documents**: `*.txt` files are split into overlapping passages
//! - **Lexical index**: an in-process [`RetrievalPort`](domain_claims::RetrievalPort)
//!   over those passages, used when no external vector index is configured
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_data::{load_snapshot, LexicalPolicyIndex};
//!
//! let snapshot = load_snapshot("data")?;
//! let index = LexicalPolicyIndex::from_dir("data/policyDocs")?;
//! ```

pub mod error;
pub mod csv_loader;
pub mod policy_docs;
pub mod lexical_index;

pub use error::DataError;
pub use csv_loader::{load_snapshot, snapshot_from_readers, CLAIMS_FILE, PATIENTS_FILE, RULES_FILE};
pub use policy_docs::{load_policy_docs, PolicyChunk, TextSplitter};
pub use lexical_index::LexicalPolicyIndex;
