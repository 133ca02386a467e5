//! # Verification Keys
//!
//! Circuit-specific verification keys arrive as JSON artifacts produced by
//! the external trusted-setup tooling: arrays of group-element coordinates
//! plus one `ic` point per public signal. This module defines the artifact
//! format, the loader, and the per-circuit key registry.
//!
//! ## Security Invariant
//!
//! The gate refuses to verify a circuit with no configured key, and a key
//! whose `ic` arity disagrees with its circuit's signal layout is rejected
//! at configuration time — a key for the wrong circuit cannot be loaded
//! under the right circuit's name.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ccl_core::ErrorCode;
use ccl_crypto::FieldElement;

use crate::circuits::CircuitKind;

/// Errors loading or configuring a verification key.
#[derive(Error, Debug)]
pub enum KeyError {
    /// The key artifact declares a proof protocol this gate cannot use.
    #[error("unsupported proof protocol {protocol:?}, expected \"groth16\"")]
    UnsupportedProtocol {
        /// The declared protocol.
        protocol: String,
    },

    /// The key artifact is structurally inconsistent.
    #[error("malformed verification key: {0}")]
    MalformedKey(String),

    /// The key's signal arity does not match the circuit it is being
    /// configured for.
    #[error(
        "key arity mismatch for circuit {circuit}: key carries {key_signals} signals, circuit expects {circuit_signals}"
    )]
    ArityMismatch {
        /// The circuit the key was configured under.
        circuit: CircuitKind,
        /// Signals supported by the key (`ic` length minus one).
        key_signals: usize,
        /// Signals the circuit layout defines.
        circuit_signals: usize,
    },

    /// The key artifact could not be read.
    #[error("failed to read key artifact: {0}")]
    Io(#[from] std::io::Error),

    /// The key artifact could not be parsed.
    #[error("failed to parse key artifact: {0}")]
    Json(#[from] serde_json::Error),
}

impl ErrorCode for KeyError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedProtocol { .. }
            | Self::MalformedKey(_)
            | Self::ArityMismatch { .. } => "VERIFICATION_KEY_MISMATCH",
            Self::Io(_) => "KEY_ARTIFACT_IO",
            Self::Json(_) => "KEY_ARTIFACT_PARSE",
        }
    }
}

/// A Groth16 verification key in its JSON artifact shape.
///
/// Coordinates are decimal-string field elements, matching the proof wire
/// format. `ic` carries one point per public signal plus the constant
/// term, so `ic.len() == n_public + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey {
    /// Proof protocol identifier; always `"groth16"` in this system.
    pub protocol: String,
    /// Curve identifier (e.g., `"bn128"`). Opaque to the gate.
    pub curve: String,
    /// Number of public signals the key supports.
    #[serde(rename = "nPublic")]
    pub n_public: usize,
    /// G1 element alpha.
    pub alpha: [FieldElement; 2],
    /// G2 element beta.
    pub beta: [[FieldElement; 2]; 2],
    /// G2 element gamma.
    pub gamma: [[FieldElement; 2]; 2],
    /// G2 element delta.
    pub delta: [[FieldElement; 2]; 2],
    /// Per-signal G1 points, length `n_public + 1`.
    pub ic: Vec<[FieldElement; 2]>,
}

impl VerificationKey {
    /// Parse a verification key from its JSON artifact text and validate
    /// its internal consistency.
    pub fn from_json_str(json: &str) -> Result<Self, KeyError> {
        let key: VerificationKey = serde_json::from_str(json)?;
        key.validate()?;
        Ok(key)
    }

    /// Load a verification key from a JSON artifact on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Number of public signals a proof verified under this key carries.
    pub fn expected_signals(&self) -> usize {
        self.n_public
    }

    /// Validate protocol and `ic` arity.
    pub fn validate(&self) -> Result<(), KeyError> {
        if self.protocol != "groth16" {
            return Err(KeyError::UnsupportedProtocol {
                protocol: self.protocol.clone(),
            });
        }
        if self.ic.is_empty() {
            return Err(KeyError::MalformedKey("empty ic table".to_string()));
        }
        if self.ic.len() != self.n_public + 1 {
            return Err(KeyError::MalformedKey(format!(
                "ic table has {} points, expected nPublic + 1 = {}",
                self.ic.len(),
                self.n_public + 1
            )));
        }
        Ok(())
    }
}

/// The set of verification keys configured on a gate, keyed by circuit.
#[derive(Debug, Clone, Default)]
pub struct VerificationKeyRegistry {
    keys: HashMap<CircuitKind, VerificationKey>,
}

impl VerificationKeyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    /// Configure the key for a circuit.
    ///
    /// Rejects keys whose signal arity disagrees with the circuit's
    /// public-signal layout. Reconfiguring a circuit replaces its key.
    pub fn configure(&mut self, circuit: CircuitKind, key: VerificationKey) -> Result<(), KeyError> {
        key.validate()?;
        if key.expected_signals() != circuit.signal_count() {
            return Err(KeyError::ArityMismatch {
                circuit,
                key_signals: key.expected_signals(),
                circuit_signals: circuit.signal_count(),
            });
        }
        self.keys.insert(circuit, key);
        Ok(())
    }

    /// The configured key for a circuit, if any.
    pub fn key_for(&self, circuit: CircuitKind) -> Option<&VerificationKey> {
        self.keys.get(&circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_json(n_public: usize) -> String {
        let ic: Vec<String> = (0..=n_public)
            .map(|i| format!("[\"{}\", \"{}\"]", i + 1, i + 2))
            .collect();
        format!(
            r#"{{
                "protocol": "groth16",
                "curve": "bn128",
                "nPublic": {n_public},
                "alpha": ["1", "2"],
                "beta": [["3", "4"], ["5", "6"]],
                "gamma": [["7", "8"], ["9", "10"]],
                "delta": [["11", "12"], ["13", "14"]],
                "ic": [{}]
            }}"#,
            ic.join(", ")
        )
    }

    #[test]
    fn test_load_valid_key() {
        let key = VerificationKey::from_json_str(&key_json(5)).unwrap();
        assert_eq!(key.expected_signals(), 5);
        assert_eq!(key.ic.len(), 6);
        assert_eq!(key.curve, "bn128");
    }

    #[test]
    fn test_reject_unsupported_protocol() {
        let json = key_json(5).replace("groth16", "plonk");
        let err = VerificationKey::from_json_str(&json).unwrap_err();
        assert!(matches!(err, KeyError::UnsupportedProtocol { .. }));
        assert_eq!(err.code(), "VERIFICATION_KEY_MISMATCH");
    }

    #[test]
    fn test_reject_inconsistent_ic_arity() {
        // Declares 5 signals but carries only 3 ic points.
        let json = key_json(5).replace("\"nPublic\": 5", "\"nPublic\": 7");
        assert!(VerificationKey::from_json_str(&json).is_err());
    }

    #[test]
    fn test_registry_configure_and_lookup() {
        let mut registry = VerificationKeyRegistry::new();
        let key = VerificationKey::from_json_str(&key_json(
            CircuitKind::CreditIssuance.signal_count(),
        ))
        .unwrap();
        registry
            .configure(CircuitKind::CreditIssuance, key)
            .unwrap();
        assert!(registry.key_for(CircuitKind::CreditIssuance).is_some());
        assert!(registry
            .key_for(CircuitKind::ConfidentialTransfer)
            .is_none());
    }

    #[test]
    fn test_registry_rejects_wrong_arity_for_circuit() {
        let mut registry = VerificationKeyRegistry::new();
        let key = VerificationKey::from_json_str(&key_json(3)).unwrap();
        let err = registry
            .configure(CircuitKind::CreditIssuance, key)
            .unwrap_err();
        assert!(matches!(err, KeyError::ArityMismatch { .. }));
    }

    #[test]
    fn test_key_serde_roundtrip() {
        let key = VerificationKey::from_json_str(&key_json(2)).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert!(json.contains("\"nPublic\""));
        let parsed = VerificationKey::from_json_str(&json).unwrap();
        assert_eq!(parsed, key);
    }
}
