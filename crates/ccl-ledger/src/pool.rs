//! # Shielded Pool
//!
//! One lock over the commitment registry and the nullifier set. Every
//! confidential mutation — registering a mint commitment, or the
//! composite spend-one-note-create-two-notes of a private transfer — runs
//! as a single critical section against this pool.
//!
//! ## Security Invariant
//!
//! Two concurrent submissions of the same nullifier resolve to exactly
//! one success and one `NullifierReused`, never two successes. A private
//! transfer validates *every* precondition (spent commitment registered,
//! nullifier unseen, outputs fresh) before mutating anything, so no error
//! path leaves a nullifier spent without its outputs registered or vice
//! versa.

use std::sync::{Mutex, MutexGuard, PoisonError};

use ccl_crypto::{Commitment, Nullifier};
use ccl_zkp::TransferSignals;

use crate::registry::{CommitmentRegistry, NullifierSet, RegistryError};

#[derive(Debug, Default)]
struct PoolState {
    commitments: CommitmentRegistry,
    nullifiers: NullifierSet,
}

/// Thread-safe shielded-pool state: commitments and nullifiers behind one
/// mutex.
#[derive(Debug, Default)]
pub struct ShieldedPool {
    state: Mutex<PoolState>,
}

impl ShieldedPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    // Critical sections validate fully before mutating, so a poisoned
    // lock cannot be hiding a half-applied transfer; recover the guard.
    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a single commitment (the mint path).
    pub fn register_commitment(&self, commitment: Commitment) -> Result<(), RegistryError> {
        self.state().commitments.register(commitment)
    }

    /// Whether a commitment is registered.
    pub fn is_commitment_valid(&self, commitment: &Commitment) -> bool {
        self.state().commitments.is_valid(commitment)
    }

    /// Spend a single nullifier: atomic check-and-insert.
    pub fn spend_nullifier(&self, nullifier: Nullifier) -> Result<(), RegistryError> {
        self.state().nullifiers.spend(nullifier)
    }

    /// Whether a nullifier has been spent.
    pub fn is_nullifier_used(&self, nullifier: &Nullifier) -> bool {
        self.state().nullifiers.is_used(nullifier)
    }

    /// Apply a verified private transfer as one critical section:
    /// consume the nullifier and register both output commitments.
    ///
    /// Preconditions checked under the lock, before any mutation:
    /// - the spent commitment is registered,
    /// - the nullifier is unseen,
    /// - neither output commitment is already registered.
    ///
    /// # Errors
    ///
    /// [`RegistryError::CommitmentUnknown`], [`RegistryError::NullifierReused`],
    /// or [`RegistryError::CommitmentAlreadyExists`] — in every case the
    /// pool is left exactly as it was.
    pub fn apply_private_transfer(&self, signals: &TransferSignals) -> Result<(), RegistryError> {
        let mut state = self.state();

        if !state.commitments.is_valid(&signals.spent_commitment) {
            return Err(RegistryError::CommitmentUnknown {
                commitment: signals.spent_commitment.clone(),
            });
        }
        if state.nullifiers.is_used(&signals.nullifier) {
            return Err(RegistryError::NullifierReused {
                nullifier: signals.nullifier.clone(),
            });
        }
        for output in [&signals.new_sender_commitment, &signals.receiver_commitment] {
            if state.commitments.is_valid(output) {
                return Err(RegistryError::CommitmentAlreadyExists {
                    commitment: output.clone(),
                });
            }
        }

        // All preconditions hold; the mutations below cannot fail.
        state.nullifiers.spend(signals.nullifier.clone())?;
        state
            .commitments
            .register(signals.new_sender_commitment.clone())?;
        state
            .commitments
            .register(signals.receiver_commitment.clone())?;
        Ok(())
    }

    /// Number of registered commitments.
    pub fn commitment_count(&self) -> usize {
        self.state().commitments.len()
    }

    /// Number of spent nullifiers.
    pub fn nullifier_count(&self) -> usize {
        self.state().nullifiers.len()
    }
}
