//! # Mock Proof System (Development and Test Backend)
//!
//! A deterministic, transparent proof system. Proofs are SHA-256 digests
//! binding the verification key and the public signals; verification
//! recomputes the digest. Provides **no zero-knowledge guarantees** — the
//! feature exists so the gate, ledger, and marketplace can be exercised
//! end-to-end without the external prover toolchain.
//!
//! Production builds disable the `mock` feature and link a real Groth16
//! backend behind the same sealed trait.

use sha2::{Digest, Sha256};

use ccl_crypto::FieldElement;

use crate::traits::{ProofSystem, VerifyError};
use crate::vk::VerificationKey;
use crate::wire::ProofBundle;

/// Domain tag for mock proof digests.
const MOCK_PROOF_DOMAIN: u8 = 0x02;

/// Deterministic SHA-256 mock backend.
///
/// A proof is valid iff its `a[0]` coordinate equals the digest of the
/// verification key and the public signals. The remaining group-element
/// slots are filled with secondary digests so bundles are structurally
/// indistinguishable from real ones on the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProofSystem;

impl MockProofSystem {
    /// Produce a bundle that will verify under `vk` for the given signals.
    ///
    /// This is the development-mode stand-in for the external prover.
    pub fn prove(vk: &VerificationKey, public_signals: &[FieldElement]) -> ProofBundle {
        let tag = proof_tag(vk, public_signals);
        let fill = |i: u8| FieldElement::from_bytes(&derive(&tag, i));
        ProofBundle {
            a: [FieldElement::from_bytes(&tag), fill(1)],
            b: [[fill(2), fill(3)], [fill(4), fill(5)]],
            c: [fill(6), fill(7)],
            public_signals: public_signals.to_vec(),
        }
    }

    /// A structurally valid verification key for development and tests.
    ///
    /// Coordinates are small constants; the mock backend never interprets
    /// them beyond the digest binding.
    pub fn insecure_key(circuit_signals: usize) -> VerificationKey {
        let fe = FieldElement::from_u64;
        VerificationKey {
            protocol: "groth16".to_string(),
            curve: "bn128".to_string(),
            n_public: circuit_signals,
            alpha: [fe(1), fe(2)],
            beta: [[fe(3), fe(4)], [fe(5), fe(6)]],
            gamma: [[fe(7), fe(8)], [fe(9), fe(10)]],
            delta: [[fe(11), fe(12)], [fe(13), fe(14)]],
            ic: (0..=circuit_signals as u64)
                .map(|i| [fe(2 * i + 1), fe(2 * i + 2)])
                .collect(),
        }
    }
}

impl ProofSystem for MockProofSystem {
    fn backend_name(&self) -> &'static str {
        "mock-sha256"
    }

    fn verify(&self, vk: &VerificationKey, proof: &ProofBundle) -> Result<bool, VerifyError> {
        let expected = FieldElement::from_bytes(&proof_tag(vk, &proof.public_signals));
        Ok(proof.a[0] == expected)
    }
}

/// Digest binding a verification key and a signal sequence.
fn proof_tag(vk: &VerificationKey, signals: &[FieldElement]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([MOCK_PROOF_DOMAIN]);
    hasher.update(key_fingerprint(vk));
    for signal in signals {
        let bytes = signal.as_str().as_bytes();
        hasher.update((bytes.len() as u32).to_le_bytes());
        hasher.update(bytes);
    }
    hasher.finalize().into()
}

/// Length-prefixed digest over every coordinate in the key.
fn key_fingerprint(vk: &VerificationKey) -> [u8; 32] {
    let mut hasher = Sha256::new();
    let mut absorb = |fe: &FieldElement| {
        let bytes = fe.as_str().as_bytes();
        hasher.update((bytes.len() as u32).to_le_bytes());
        hasher.update(bytes);
    };
    for fe in &vk.alpha {
        absorb(fe);
    }
    for pair in vk.beta.iter().chain(vk.gamma.iter()).chain(vk.delta.iter()) {
        for fe in pair {
            absorb(fe);
        }
    }
    for point in &vk.ic {
        for fe in point {
            absorb(fe);
        }
    }
    hasher.finalize().into()
}

/// Secondary digest for filling non-binding proof slots.
fn derive(tag: &[u8; 32], index: u8) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(tag);
    hasher.update([index]);
    hasher.finalize().into()
}
