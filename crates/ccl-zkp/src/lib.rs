//! # ccl-zkp — Zero-Knowledge Proof Gate
//!
//! The sole authority permitting a confidential ledger transition. A
//! submitted proof either verifies against the configured key for its
//! circuit, or the transition does not happen.
//!
//! ## Architecture
//!
//! - **Wire format** (`wire.rs`): the Groth16-style `(a, b, c,
//!   publicSignals)` proof bundle with decimal-string field elements.
//! - **Verification keys** (`vk.rs`): the JSON key artifact and the
//!   per-circuit key registry. A circuit with no configured key cannot
//!   verify anything.
//! - **Circuits** (`circuits.rs`): `CircuitKind` selection and the typed
//!   public-signal views. Effect values (commitments, nullifiers, amounts)
//!   are parsed from `publicSignals` and nowhere else.
//! - **Traits** (`traits.rs`): the sealed `ProofSystem` trait. Only
//!   backends defined in this crate can exist — unauthorized verifier
//!   backends cannot be injected.
//! - **Mock** (`mock.rs`, feature `mock`, default on): deterministic
//!   SHA-256 backend for development and tests. No zero-knowledge
//!   guarantees; production builds disable the feature and link a real
//!   Groth16 backend at this seam.
//! - **Gate** (`gate.rs`): `ProofGate` — pure verification, off-thread
//!   execution, caller-supplied timeouts. Never mutates ledger state.
//!
//! ## Crate Policy
//!
//! - Verification is side-effect-free. Callers commit state only after
//!   `Ok(())`, and derive every committed value from the public signals.
//! - Failed verifications are terminal for that submission. Nothing here
//!   retries.

pub mod circuits;
pub mod gate;
#[cfg(feature = "mock")]
pub mod mock;
pub mod traits;
pub mod vk;
pub mod wire;

pub use circuits::{CircuitKind, IssuanceSignals, SignalError, TransferSignals};
pub use gate::{GateError, ProofGate};
#[cfg(feature = "mock")]
pub use mock::MockProofSystem;
pub use traits::{ProofSystem, VerifyError};
pub use vk::{KeyError, VerificationKey, VerificationKeyRegistry};
pub use wire::ProofBundle;
