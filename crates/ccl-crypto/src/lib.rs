//! # ccl-crypto — Cryptographic Primitives
//!
//! Provides the cryptographic building blocks for the confidential ledger:
//!
//! - **Field-element codec** (`field.rs`): the decimal-string encoding of
//!   256-bit values used throughout the proof wire format, with strict
//!   canonical-form validation.
//! - **Notes** (`note.rs`): the `(balance, secret, nonce)` value notes of
//!   the shielded pool, with domain-separated SHA-256 commitment and
//!   nullifier derivation.
//!
//! ## Crate Policy
//!
//! - Depends only on `ccl-core` internally.
//! - No mocking of cryptographic operations in tests — all tests use real
//!   SHA-256 over real note material.
//! - `unsafe` prohibited.

pub mod field;
pub mod note;

pub use field::FieldElement;
pub use note::{Commitment, Note, NoteNonce, NoteSecret, Nullifier};
