//! # Proof Wire Format
//!
//! The Groth16-style proof bundle as it crosses the process boundary:
//!
//! ```json
//! {
//!   "a": ["x", "y"],
//!   "b": [["x", "y"], ["x", "y"]],
//!   "c": ["x", "y"],
//!   "publicSignals": ["...", "..."]
//! }
//! ```
//!
//! Every element is a decimal-string field element. Parsing validates the
//! canonical encoding of every coordinate and signal; a bundle that
//! deserializes is structurally well-formed. Whether it *verifies* is the
//! gate's decision.

use serde::{Deserialize, Serialize};

use ccl_crypto::FieldElement;

/// A zero-knowledge proof plus its ordered public signals.
///
/// Immutable once parsed; single-use as input to verification. The group
/// elements `a`, `b`, `c` are opaque to everything except the proof-system
/// backend. The `public_signals` sequence is the *only* carrier of effect
/// values — commitments, nullifiers, amounts — into the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBundle {
    /// G1 element, affine coordinates.
    pub a: [FieldElement; 2],
    /// G2 element, two pairs of coordinates.
    pub b: [[FieldElement; 2]; 2],
    /// G1 element, affine coordinates.
    pub c: [FieldElement; 2],
    /// Ordered public signals, circuit-specific layout.
    #[serde(rename = "publicSignals")]
    pub public_signals: Vec<FieldElement>,
}

impl ProofBundle {
    /// Number of public signals carried by this proof.
    pub fn signal_count(&self) -> usize {
        self.public_signals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    fn sample_bundle() -> ProofBundle {
        ProofBundle {
            a: [fe(1), fe(2)],
            b: [[fe(3), fe(4)], [fe(5), fe(6)]],
            c: [fe(7), fe(8)],
            public_signals: vec![fe(100), fe(200)],
        }
    }

    #[test]
    fn test_json_roundtrip() {
        let bundle = sample_bundle();
        let json = serde_json::to_string(&bundle).unwrap();
        let parsed: ProofBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bundle);
    }

    #[test]
    fn test_wire_uses_camel_case_signals_key() {
        let json = serde_json::to_string(&sample_bundle()).unwrap();
        assert!(json.contains("\"publicSignals\""));
        assert!(!json.contains("public_signals"));
    }

    #[test]
    fn test_parse_rejects_non_canonical_elements() {
        let json = r#"{
            "a": ["007", "2"],
            "b": [["3", "4"], ["5", "6"]],
            "c": ["7", "8"],
            "publicSignals": ["100"]
        }"#;
        let parsed: Result<ProofBundle, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parse_rejects_missing_coordinates() {
        let json = r#"{
            "a": ["1"],
            "b": [["3", "4"], ["5", "6"]],
            "c": ["7", "8"],
            "publicSignals": []
        }"#;
        let parsed: Result<ProofBundle, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_signal_count() {
        assert_eq!(sample_bundle().signal_count(), 2);
    }
}
