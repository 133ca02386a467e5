//! # Proof System Trait (Sealed)
//!
//! The abstraction point between the gate and a concrete proof-system
//! backend.
//!
//! ## Sealed Trait
//!
//! `ProofSystem` is **sealed**: only implementations defined within
//! `ccl-zkp` can exist. External crates cannot implement it, so an
//! unauthorized verifier backend cannot be injected into a gate — a
//! security requirement for anything that authorizes ledger mutations.

use thiserror::Error;

use crate::vk::VerificationKey;
use crate::wire::ProofBundle;

/// Error during proof verification.
///
/// Distinguishes proofs that could not be interpreted from proofs that
/// were interpreted and found false. Both are terminal for the submission.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The proof is structurally malformed for this backend.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// Verification could not complete.
    #[error("proof verification failed: {0}")]
    VerificationFailed(String),
}

/// Private module that seals the [`ProofSystem`] trait.
pub(crate) mod private {
    /// Sealing marker trait. Not accessible outside `ccl-zkp`.
    pub trait Sealed {}
}

/// Sealed trait defining a zero-knowledge proof verification backend.
///
/// Verification is pure: a backend examines the key, the proof, and the
/// proof's public signals, and reports whether the proof holds. It never
/// touches ledger state and holds no mutable state of its own.
///
/// Requires `Send + Sync` so the gate can run verification on a blocking
/// worker thread.
pub trait ProofSystem: private::Sealed + Send + Sync {
    /// Short identifier for this backend (log and error context).
    fn backend_name(&self) -> &'static str;

    /// Verify a proof against a verification key.
    ///
    /// Returns `Ok(true)` if the proof is valid, `Ok(false)` if the proof
    /// is well-formed but false.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::MalformedProof`] if the proof cannot be
    /// interpreted by this backend, [`VerifyError::VerificationFailed`]
    /// if verification could not complete.
    fn verify(&self, vk: &VerificationKey, proof: &ProofBundle) -> Result<bool, VerifyError>;
}

// ---- Sealed trait implementations for authorized backends ----

#[cfg(feature = "mock")]
impl private::Sealed for crate::mock::MockProofSystem {}
