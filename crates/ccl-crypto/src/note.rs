//! # Value Notes — Commitments and Nullifiers
//!
//! A note is the unit of confidential value: `(balance, secret, nonce)`.
//! Publishing a note's commitment registers the value without revealing
//! it; publishing its nullifier spends it without revealing which
//! commitment was opened.
//!
//! ## Derivation
//!
//! Domain-separated SHA-256, reduced to the decimal wire encoding:
//!
//! - Commitment: `SHA256(0x00 || balance_le || secret || nonce)`
//! - Nullifier:  `SHA256(0x01 || secret || nonce)`
//!
//! The nullifier deliberately omits the balance: it must be derivable by
//! the note holder alone and must not leak the amount when published.
//!
//! ## Security Invariant
//!
//! `NoteSecret` never leaves this module in `Debug` output or error
//! payloads. Only the derived commitment and nullifier are public.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use ccl_core::error::EncodingError;

use crate::field::FieldElement;

/// Domain tag for commitment derivation.
const COMMITMENT_DOMAIN: u8 = 0x00;
/// Domain tag for nullifier derivation.
const NULLIFIER_DOMAIN: u8 = 0x01;

/// The secret half of a note. Knowledge of the secret is ownership.
#[derive(Clone, PartialEq, Eq)]
pub struct NoteSecret([u8; 32]);

/// Per-note randomness. A fresh nonce per note keeps equal balances from
/// producing equal commitments.
#[derive(Clone, PartialEq, Eq)]
pub struct NoteNonce([u8; 32]);

impl NoteSecret {
    /// Generate a fresh random secret.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Construct from raw bytes (wallet import paths).
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Access the raw bytes. Callers must not log or serialize these.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for NoteSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NoteSecret(..)")
    }
}

impl NoteNonce {
    /// Generate a fresh random nonce.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Construct from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for NoteNonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NoteNonce(..)")
    }
}

/// An unspent value note: the opening of a commitment.
///
/// Lives on the prover/wallet side. The ledger only ever sees the derived
/// [`Commitment`] and, at spend time, the derived [`Nullifier`].
#[derive(Debug, Clone)]
pub struct Note {
    /// The confidential balance, in credit units.
    pub balance: u64,
    /// Ownership secret.
    pub secret: NoteSecret,
    /// Per-note randomness.
    pub nonce: NoteNonce,
}

impl Note {
    /// Create a note with fresh random secret material.
    pub fn random(balance: u64) -> Self {
        Self {
            balance,
            secret: NoteSecret::random(),
            nonce: NoteNonce::random(),
        }
    }

    /// Derive the note's public commitment.
    pub fn commitment(&self) -> Commitment {
        let mut hasher = Sha256::new();
        hasher.update([COMMITMENT_DOMAIN]);
        hasher.update(self.balance.to_le_bytes());
        hasher.update(self.secret.as_bytes());
        hasher.update(self.nonce.as_bytes());
        Commitment(FieldElement::from_bytes(&hasher.finalize().into()))
    }

    /// Derive the note's nullifier, the canonical spend marker.
    pub fn nullifier(&self) -> Nullifier {
        let mut hasher = Sha256::new();
        hasher.update([NULLIFIER_DOMAIN]);
        hasher.update(self.secret.as_bytes());
        hasher.update(self.nonce.as_bytes());
        Nullifier(FieldElement::from_bytes(&hasher.finalize().into()))
    }
}

/// A published note commitment in its wire encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Commitment(pub FieldElement);

/// A published spend marker in its wire encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nullifier(pub FieldElement);

impl Commitment {
    /// Parse a commitment from its decimal wire encoding.
    pub fn parse(s: &str) -> Result<Self, EncodingError> {
        Ok(Self(FieldElement::parse(s)?))
    }

    /// The underlying field element.
    pub fn as_field(&self) -> &FieldElement {
        &self.0
    }
}

impl Nullifier {
    /// Parse a nullifier from its decimal wire encoding.
    pub fn parse(s: &str) -> Result<Self, EncodingError> {
        Ok(Self(FieldElement::parse(s)?))
    }

    /// The underlying field element.
    pub fn as_field(&self) -> &FieldElement {
        &self.0
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cm:{}", self.0)
    }
}

impl std::fmt::Display for Nullifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "nf:{}", self.0)
    }
}
