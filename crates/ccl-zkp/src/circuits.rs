//! # Circuits and Typed Public-Signal Views
//!
//! Two circuits gate the ledger:
//!
//! - **Credit issuance**: the prover demonstrates `energy_produced >=
//!   min_energy_threshold` and `production_timestamp <= max_timestamp`
//!   over a device attestation without revealing the device secret. The
//!   public signals expose the minted note commitment, the proved energy,
//!   and the applied carbon factor.
//! - **Confidential transfer**: the prover demonstrates knowledge of a
//!   registered note, correct nullifier derivation, and conservation of
//!   value (`sender_balance == new_sender_balance + transfer_amount`)
//!   without revealing any balance. The public signals expose the
//!   nullifier, the spent commitment, and the two output commitments.
//!
//! ## Security Invariant
//!
//! These views are the *only* path from a proof to ledger effect values.
//! Ledger code never accepts a caller-supplied nullifier or commitment
//! alongside a proof — a verified proof with substituted effects is
//! unrepresentable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ccl_core::{ErrorCode, Timestamp};
use ccl_crypto::{Commitment, FieldElement, Nullifier};

/// Selects which circuit a proof claims to satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitKind {
    /// Credit issuance: energy-production claim backing a mint.
    CreditIssuance,
    /// Confidential transfer: shielded-pool value movement.
    ConfidentialTransfer,
}

impl CircuitKind {
    /// Canonical circuit identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditIssuance => "credit_issuance",
            Self::ConfidentialTransfer => "confidential_transfer",
        }
    }

    /// Number of public signals in this circuit's layout.
    pub fn signal_count(&self) -> usize {
        match self {
            Self::CreditIssuance => 5,
            Self::ConfidentialTransfer => 5,
        }
    }
}

impl std::fmt::Display for CircuitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors parsing a circuit's public signals.
///
/// A signal error means the proof, even if cryptographically valid, does
/// not encode a usable state transition — the submission is rejected and
/// never retried.
#[derive(Error, Debug)]
pub enum SignalError {
    /// Wrong number of signals for the circuit layout.
    #[error("{circuit} expects {expected} public signals, got {actual}")]
    ArityMismatch {
        /// The circuit whose layout was violated.
        circuit: CircuitKind,
        /// Signals the layout defines.
        expected: usize,
        /// Signals the proof carried.
        actual: usize,
    },

    /// A signal failed its slot's validation rule.
    #[error("malformed signal at index {index}: {reason}")]
    Malformed {
        /// Zero-based signal index.
        index: usize,
        /// Why the signal was rejected.
        reason: String,
    },
}

impl ErrorCode for SignalError {
    fn code(&self) -> &'static str {
        "MALFORMED_SIGNALS"
    }
}

/// Typed view of the credit-issuance circuit's public signals.
///
/// Layout: `[commitment, energy_wh, carbon_factor_g_per_kwh,
/// min_energy_wh, max_timestamp_epoch_secs]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceSignals {
    /// The minted note commitment.
    pub commitment: Commitment,
    /// Proved energy production in watt-hours.
    pub energy_wh: u64,
    /// Carbon factor the circuit applied, in grams CO2 per kWh.
    pub carbon_factor_g_per_kwh: u64,
    /// The minimum-energy threshold the proof was generated against.
    pub min_energy_wh: u64,
    /// Upper bound on the production timestamp the proof attests to.
    pub max_timestamp: Timestamp,
}

impl IssuanceSignals {
    /// Parse and validate the issuance layout from raw signals.
    pub fn parse(signals: &[FieldElement]) -> Result<Self, SignalError> {
        let expected = CircuitKind::CreditIssuance.signal_count();
        if signals.len() != expected {
            return Err(SignalError::ArityMismatch {
                circuit: CircuitKind::CreditIssuance,
                expected,
                actual: signals.len(),
            });
        }

        let commitment = Commitment(signals[0].clone());
        if commitment.as_field().is_zero() {
            return Err(SignalError::Malformed {
                index: 0,
                reason: "commitment must be non-zero".to_string(),
            });
        }

        let energy_wh = parse_u64(signals, 1, "energy_wh")?;
        let carbon_factor_g_per_kwh = parse_u64(signals, 2, "carbon_factor_g_per_kwh")?;
        let min_energy_wh = parse_u64(signals, 3, "min_energy_wh")?;
        let max_ts_secs = parse_u64(signals, 4, "max_timestamp")?;

        // The circuit constrains energy >= threshold; a proof whose public
        // signals violate that was produced against a different statement.
        if energy_wh < min_energy_wh {
            return Err(SignalError::Malformed {
                index: 1,
                reason: format!(
                    "proved energy {energy_wh} Wh below proved threshold {min_energy_wh} Wh"
                ),
            });
        }

        let max_timestamp = Timestamp::from_epoch_secs(max_ts_secs as i64).map_err(|e| {
            SignalError::Malformed {
                index: 4,
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            commitment,
            energy_wh,
            carbon_factor_g_per_kwh,
            min_energy_wh,
            max_timestamp,
        })
    }

    /// Render back into the raw signal layout (prover-side input building).
    pub fn to_signals(&self) -> Vec<FieldElement> {
        vec![
            self.commitment.as_field().clone(),
            FieldElement::from_u64(self.energy_wh),
            FieldElement::from_u64(self.carbon_factor_g_per_kwh),
            FieldElement::from_u64(self.min_energy_wh),
            FieldElement::from_u64(self.max_timestamp.epoch_secs().max(0) as u64),
        ]
    }
}

/// Typed view of the confidential-transfer circuit's public signals.
///
/// Layout: `[nullifier, spent_commitment, new_sender_commitment,
/// receiver_commitment, merkle_root]`.
///
/// Conservation of value and correct derivation of the nullifier and
/// output commitments are constrained inside the circuit; this view
/// re-asserts the structural rules visible from outside (non-zero values,
/// distinct outputs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSignals {
    /// Spend marker for the consumed note.
    pub nullifier: Nullifier,
    /// The commitment being spent; must already be registered.
    pub spent_commitment: Commitment,
    /// The sender's change-output commitment.
    pub new_sender_commitment: Commitment,
    /// The receiver's output commitment.
    pub receiver_commitment: Commitment,
    /// Accumulator root the membership proof was generated against.
    /// Carried through the wire format; membership in this system is
    /// established by direct registry lookup of `spent_commitment`.
    pub merkle_root: FieldElement,
}

impl TransferSignals {
    /// Parse and validate the transfer layout from raw signals.
    pub fn parse(signals: &[FieldElement]) -> Result<Self, SignalError> {
        let expected = CircuitKind::ConfidentialTransfer.signal_count();
        if signals.len() != expected {
            return Err(SignalError::ArityMismatch {
                circuit: CircuitKind::ConfidentialTransfer,
                expected,
                actual: signals.len(),
            });
        }

        let nullifier = Nullifier(signals[0].clone());
        if nullifier.as_field().is_zero() {
            return Err(SignalError::Malformed {
                index: 0,
                reason: "nullifier must be non-zero".to_string(),
            });
        }

        let spent_commitment = parse_commitment(signals, 1)?;
        let new_sender_commitment = parse_commitment(signals, 2)?;
        let receiver_commitment = parse_commitment(signals, 3)?;

        if new_sender_commitment == receiver_commitment {
            return Err(SignalError::Malformed {
                index: 3,
                reason: "output commitments must be distinct".to_string(),
            });
        }
        if new_sender_commitment == spent_commitment || receiver_commitment == spent_commitment {
            return Err(SignalError::Malformed {
                index: 1,
                reason: "output commitment repeats the spent commitment".to_string(),
            });
        }

        Ok(Self {
            nullifier,
            spent_commitment,
            new_sender_commitment,
            receiver_commitment,
            merkle_root: signals[4].clone(),
        })
    }

    /// Render back into the raw signal layout (prover-side input building).
    pub fn to_signals(&self) -> Vec<FieldElement> {
        vec![
            self.nullifier.as_field().clone(),
            self.spent_commitment.as_field().clone(),
            self.new_sender_commitment.as_field().clone(),
            self.receiver_commitment.as_field().clone(),
            self.merkle_root.clone(),
        ]
    }
}

fn parse_u64(signals: &[FieldElement], index: usize, name: &str) -> Result<u64, SignalError> {
    signals[index].as_u64().ok_or_else(|| SignalError::Malformed {
        index,
        reason: format!("{name} does not fit in u64: {}", signals[index]),
    })
}

fn parse_commitment(signals: &[FieldElement], index: usize) -> Result<Commitment, SignalError> {
    let commitment = Commitment(signals[index].clone());
    if commitment.as_field().is_zero() {
        return Err(SignalError::Malformed {
            index,
            reason: "commitment must be non-zero".to_string(),
        });
    }
    Ok(commitment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccl_crypto::Note;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    fn issuance_fixture() -> Vec<FieldElement> {
        let commitment = Note::random(400).commitment();
        vec![
            commitment.as_field().clone(),
            fe(1000), // energy_wh
            fe(400),  // carbon_factor_g_per_kwh
            fe(500),  // min_energy_wh
            fe(1_750_000_000),
        ]
    }

    fn transfer_fixture() -> (Note, Note, Note, Vec<FieldElement>) {
        let spent = Note::random(1000);
        let change = Note::random(700);
        let output = Note::random(300);
        let signals = vec![
            spent.nullifier().as_field().clone(),
            spent.commitment().as_field().clone(),
            change.commitment().as_field().clone(),
            output.commitment().as_field().clone(),
            fe(0),
        ];
        (spent, change, output, signals)
    }

    // ---- issuance ----

    #[test]
    fn test_issuance_parse_roundtrip() {
        let raw = issuance_fixture();
        let parsed = IssuanceSignals::parse(&raw).unwrap();
        assert_eq!(parsed.energy_wh, 1000);
        assert_eq!(parsed.carbon_factor_g_per_kwh, 400);
        assert_eq!(parsed.min_energy_wh, 500);
        assert_eq!(parsed.to_signals(), raw);
    }

    #[test]
    fn test_issuance_rejects_wrong_arity() {
        let mut raw = issuance_fixture();
        raw.pop();
        let err = IssuanceSignals::parse(&raw).unwrap_err();
        assert!(matches!(err, SignalError::ArityMismatch { .. }));
        assert_eq!(err.code(), "MALFORMED_SIGNALS");
    }

    #[test]
    fn test_issuance_rejects_zero_commitment() {
        let mut raw = issuance_fixture();
        raw[0] = fe(0);
        assert!(IssuanceSignals::parse(&raw).is_err());
    }

    #[test]
    fn test_issuance_rejects_energy_below_threshold() {
        let mut raw = issuance_fixture();
        raw[1] = fe(100); // below min_energy_wh = 500
        let err = IssuanceSignals::parse(&raw).unwrap_err();
        assert!(err.to_string().contains("below proved threshold"));
    }

    #[test]
    fn test_issuance_rejects_oversized_energy() {
        let mut raw = issuance_fixture();
        raw[1] = FieldElement::from_bytes(&[0xff; 32]);
        assert!(IssuanceSignals::parse(&raw).is_err());
    }

    // ---- transfer ----

    #[test]
    fn test_transfer_parse_roundtrip() {
        let (spent, change, output, raw) = transfer_fixture();
        let parsed = TransferSignals::parse(&raw).unwrap();
        assert_eq!(parsed.nullifier, spent.nullifier());
        assert_eq!(parsed.spent_commitment, spent.commitment());
        assert_eq!(parsed.new_sender_commitment, change.commitment());
        assert_eq!(parsed.receiver_commitment, output.commitment());
        assert_eq!(parsed.to_signals(), raw);
    }

    #[test]
    fn test_transfer_rejects_zero_nullifier() {
        let (_, _, _, mut raw) = transfer_fixture();
        raw[0] = fe(0);
        assert!(TransferSignals::parse(&raw).is_err());
    }

    #[test]
    fn test_transfer_rejects_duplicate_outputs() {
        let (_, _, _, mut raw) = transfer_fixture();
        raw[3] = raw[2].clone();
        let err = TransferSignals::parse(&raw).unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }

    #[test]
    fn test_transfer_rejects_output_equal_to_spent() {
        let (_, _, _, mut raw) = transfer_fixture();
        raw[2] = raw[1].clone();
        assert!(TransferSignals::parse(&raw).is_err());
    }

    #[test]
    fn test_transfer_accepts_zero_merkle_root() {
        // Directly-addressed registry: the root slot may legitimately be 0.
        let (_, _, _, raw) = transfer_fixture();
        let parsed = TransferSignals::parse(&raw).unwrap();
        assert!(parsed.merkle_root.is_zero());
    }

    #[test]
    fn test_circuit_kind_identifiers() {
        assert_eq!(CircuitKind::CreditIssuance.to_string(), "credit_issuance");
        assert_eq!(
            CircuitKind::ConfidentialTransfer.to_string(),
            "confidential_transfer"
        );
    }
}
