//! # Commitment Registry and Nullifier Set
//!
//! The two append-only sets that anchor note validity and spend-once
//! semantics:
//!
//! - A **commitment** enters the registry when a note is created (mint, or
//!   an output of a private transfer) and is never deleted.
//! - A **nullifier** enters the set when a note is spent. Insertion is the
//!   canonical spend event; a nullifier can enter at most once.
//!
//! Both types here are plain single-threaded stores. Thread safety and
//! the composite-mutation critical section live in
//! [`ShieldedPool`](crate::pool::ShieldedPool), which owns one of each
//! behind a single lock.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use ccl_core::{ErrorCode, Timestamp};
use ccl_crypto::{Commitment, Nullifier};

/// Errors from the commitment registry and nullifier set.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The commitment is already registered.
    #[error("commitment already registered: {commitment}")]
    CommitmentAlreadyExists {
        /// The duplicate commitment, wire-encoded.
        commitment: Commitment,
    },

    /// The referenced commitment has never been registered.
    #[error("unknown commitment: {commitment}")]
    CommitmentUnknown {
        /// The missing commitment, wire-encoded.
        commitment: Commitment,
    },

    /// The nullifier has already been spent.
    #[error("nullifier already spent: {nullifier}")]
    NullifierReused {
        /// The replayed nullifier, wire-encoded.
        nullifier: Nullifier,
    },
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::CommitmentAlreadyExists { .. } => "COMMITMENT_EXISTS",
            Self::CommitmentUnknown { .. } => "COMMITMENT_UNKNOWN",
            Self::NullifierReused { .. } => "NULLIFIER_REUSED",
        }
    }
}

/// Append-only store of note commitments with registration timestamps.
#[derive(Debug, Clone, Default)]
pub struct CommitmentRegistry {
    entries: HashMap<Commitment, Timestamp>,
}

impl CommitmentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a commitment. Fails if it is already present; a registered
    /// commitment is never removed or overwritten.
    pub fn register(&mut self, commitment: Commitment) -> Result<(), RegistryError> {
        if self.entries.contains_key(&commitment) {
            return Err(RegistryError::CommitmentAlreadyExists { commitment });
        }
        self.entries.insert(commitment, Timestamp::now());
        Ok(())
    }

    /// Whether the commitment is registered.
    pub fn is_valid(&self, commitment: &Commitment) -> bool {
        self.entries.contains_key(commitment)
    }

    /// When the commitment was registered, if it is.
    pub fn registered_at(&self, commitment: &Commitment) -> Option<Timestamp> {
        self.entries.get(commitment).copied()
    }

    /// Number of registered commitments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Set of spent-note markers. Rejects any nullifier seen twice.
#[derive(Debug, Clone, Default)]
pub struct NullifierSet {
    spent: HashSet<Nullifier>,
}

impl NullifierSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spend a nullifier: check-and-insert in one step on `&mut self`.
    ///
    /// This is the linchpin against double-spends. Exactly one call for
    /// any given nullifier ever returns `Ok`.
    pub fn spend(&mut self, nullifier: Nullifier) -> Result<(), RegistryError> {
        if self.spent.contains(&nullifier) {
            return Err(RegistryError::NullifierReused { nullifier });
        }
        self.spent.insert(nullifier);
        Ok(())
    }

    /// Whether the nullifier has been spent.
    pub fn is_used(&self, nullifier: &Nullifier) -> bool {
        self.spent.contains(nullifier)
    }

    /// Number of spent nullifiers.
    pub fn len(&self) -> usize {
        self.spent.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}
