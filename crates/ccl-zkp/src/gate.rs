//! # Proof Gate
//!
//! `ProofGate` is the single checkpoint between a submitted proof and a
//! ledger mutation. It selects the verification key for the claimed
//! circuit, checks arity, and asks the backend whether the proof holds.
//!
//! ## Contract
//!
//! - Verification is pure. The gate holds no registry state and mutates
//!   nothing; callers commit state changes only after `Ok(())`.
//! - Verification is CPU-bound, so [`ProofGate::verify_with_timeout`]
//!   runs it on a blocking worker and bounds the wait with a
//!   caller-supplied timeout. A timed-out verification commits nothing.
//! - Failures are terminal for the submission. The gate never retries.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use ccl_core::ErrorCode;

use crate::circuits::CircuitKind;
use crate::traits::{ProofSystem, VerifyError};
use crate::vk::VerificationKeyRegistry;
use crate::wire::ProofBundle;

/// Errors from the proof gate.
#[derive(Error, Debug)]
pub enum GateError {
    /// The proof is malformed or false.
    #[error("invalid proof for {circuit}: {reason}")]
    ProofInvalid {
        /// Circuit the proof claimed to satisfy.
        circuit: CircuitKind,
        /// Why the proof was rejected.
        reason: String,
    },

    /// No key is configured for the circuit, or the configured key does
    /// not fit the submitted proof.
    #[error("verification key mismatch for {circuit}: {reason}")]
    VerificationKeyMismatch {
        /// Circuit whose key lookup failed.
        circuit: CircuitKind,
        /// Why the key lookup or fit check failed.
        reason: String,
    },

    /// Verification did not complete within the caller's deadline.
    #[error("verification of {circuit} timed out after {timeout:?}")]
    Timeout {
        /// Circuit whose verification timed out.
        circuit: CircuitKind,
        /// The deadline that elapsed.
        timeout: Duration,
    },
}

impl ErrorCode for GateError {
    fn code(&self) -> &'static str {
        match self {
            Self::ProofInvalid { .. } => "PROOF_INVALID",
            Self::VerificationKeyMismatch { .. } => "VERIFICATION_KEY_MISMATCH",
            Self::Timeout { .. } => "TIMEOUT",
        }
    }
}

/// The proof verification gate.
///
/// Cheap to clone; clones share the backend and key registry.
#[derive(Debug)]
pub struct ProofGate<S: ProofSystem> {
    inner: Arc<GateInner<S>>,
}

#[derive(Debug)]
struct GateInner<S> {
    system: S,
    keys: VerificationKeyRegistry,
}

impl<S: ProofSystem> Clone for ProofGate<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ProofSystem + 'static> ProofGate<S> {
    /// Build a gate from a backend and a configured key registry.
    pub fn new(system: S, keys: VerificationKeyRegistry) -> Self {
        Self {
            inner: Arc::new(GateInner { system, keys }),
        }
    }

    /// Verify a proof for the given circuit, synchronously.
    ///
    /// Pure: no state anywhere changes, whatever the outcome.
    pub fn verify(&self, circuit: CircuitKind, proof: &ProofBundle) -> Result<(), GateError> {
        self.inner.verify(circuit, proof)
    }

    /// Verify a proof on a blocking worker, bounded by `timeout`.
    ///
    /// A verification that keeps the worker busy past the deadline is abandoned:
    /// the caller gets [`GateError::Timeout`] and must treat the
    /// submission as failed.
    pub async fn verify_with_timeout(
        &self,
        circuit: CircuitKind,
        proof: &ProofBundle,
        timeout: Duration,
    ) -> Result<(), GateError> {
        let inner = Arc::clone(&self.inner);
        let proof = proof.clone();
        let task = tokio::task::spawn_blocking(move || inner.verify(circuit, &proof));

        match tokio::time::timeout(timeout, task).await {
            Err(_) => {
                tracing::warn!(%circuit, ?timeout, "proof verification timed out");
                Err(GateError::Timeout { circuit, timeout })
            }
            Ok(Err(join_err)) => Err(GateError::ProofInvalid {
                circuit,
                reason: format!("verifier task failed: {join_err}"),
            }),
            Ok(Ok(result)) => result,
        }
    }
}

impl<S: ProofSystem> GateInner<S> {
    fn verify(&self, circuit: CircuitKind, proof: &ProofBundle) -> Result<(), GateError> {
        let key = self.keys.key_for(circuit).ok_or_else(|| {
            GateError::VerificationKeyMismatch {
                circuit,
                reason: "no verification key configured".to_string(),
            }
        })?;

        if key.expected_signals() != proof.signal_count() {
            return Err(GateError::VerificationKeyMismatch {
                circuit,
                reason: format!(
                    "key expects {} public signals, proof carries {}",
                    key.expected_signals(),
                    proof.signal_count()
                ),
            });
        }

        match self.system.verify(key, proof) {
            Ok(true) => {
                tracing::debug!(
                    %circuit,
                    backend = self.system.backend_name(),
                    "proof accepted"
                );
                Ok(())
            }
            Ok(false) => {
                tracing::warn!(
                    %circuit,
                    backend = self.system.backend_name(),
                    "proof rejected"
                );
                Err(GateError::ProofInvalid {
                    circuit,
                    reason: "proof did not verify".to_string(),
                })
            }
            Err(VerifyError::MalformedProof(reason))
            | Err(VerifyError::VerificationFailed(reason)) => {
                tracing::warn!(%circuit, %reason, "proof unusable");
                Err(GateError::ProofInvalid { circuit, reason })
            }
        }
    }
}
