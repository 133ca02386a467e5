//! # Ledger Events
//!
//! The externally observable record of successful ledger transitions,
//! emitted for downstream indexers. Events and the state itself are the
//! only observable side effects of the ledger.
//!
//! Private-transfer events carry only wire-public values — the nullifier
//! and the output commitments. No amounts, no parties.

use serde::{Deserialize, Serialize};

use ccl_core::{AccountId, CreditId, Timestamp};
use ccl_crypto::{Commitment, Nullifier};

/// A successful ledger transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A credit was minted against a verified issuance proof.
    CreditMinted {
        /// The new credit.
        credit_id: CreditId,
        /// Initial owner.
        owner: AccountId,
        /// Carbon offset in grams of CO2.
        carbon_amount_g: u64,
        /// Verified energy production in watt-hours.
        energy_wh: u64,
        /// The note commitment registered for the mint.
        commitment: Commitment,
        /// When the mint committed.
        at: Timestamp,
    },

    /// A credit was permanently retired.
    CreditRetired {
        /// The retired credit.
        credit_id: CreditId,
        /// Why it was retired.
        reason: String,
        /// When the retirement committed.
        at: Timestamp,
    },

    /// A confidential transfer consumed one note and created two.
    PrivateTransfer {
        /// The spend marker consumed.
        nullifier: Nullifier,
        /// The sender's change-output commitment.
        new_sender_commitment: Commitment,
        /// The receiver's output commitment.
        receiver_commitment: Commitment,
        /// When the transfer committed.
        at: Timestamp,
    },
}

impl LedgerEvent {
    /// Short event name for logs and indexers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreditMinted { .. } => "CreditMinted",
            Self::CreditRetired { .. } => "CreditRetired",
            Self::PrivateTransfer { .. } => "PrivateTransfer",
        }
    }
}
