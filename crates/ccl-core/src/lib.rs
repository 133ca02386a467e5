//! # ccl-core — Foundational Types for the Confidential Carbon Ledger
//!
//! This crate is the bedrock of the CCL workspace. It defines the
//! type-system primitives every other crate builds on; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `CreditId`, `ListingId`,
//!    `AccountId`, `ProjectHash`, `Vintage` — all newtypes with validated
//!    constructors. No bare strings or integers for identifiers.
//!
//! 2. **UTC-only timestamps.** The `Timestamp` type enforces UTC with Z
//!    suffix and seconds precision, so issuance attestations and event
//!    records have one deterministic encoding.
//!
//! 3. **Stable error codes.** Every error enum in the workspace implements
//!    [`ErrorCode`], mapping each variant to a machine-readable code that
//!    callers can match on without parsing reason strings.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ccl-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use error::{CoreError, EncodingError, ErrorCode};
pub use identity::{AccountId, CreditId, ListingId, ProjectHash};
pub use temporal::{Timestamp, Vintage};
