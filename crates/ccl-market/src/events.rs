//! # Marketplace Events
//!
//! The externally observable record of successful marketplace
//! transitions, emitted for downstream indexing alongside the ledger's
//! own events.

use serde::{Deserialize, Serialize};

use ccl_core::{AccountId, CreditId, ListingId, Timestamp};

/// A successful marketplace transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketEvent {
    /// A credit was listed for sale.
    ListingCreated {
        /// The new listing.
        listing_id: ListingId,
        /// The escrowed credit.
        token_id: CreditId,
        /// The offering account.
        seller: AccountId,
        /// Price per unit of carbon.
        price_per_unit: u64,
        /// Units offered.
        amount: u64,
        /// When the listing was created.
        at: Timestamp,
    },

    /// A listing settled: payment collected, ownership transferred.
    CreditsPurchased {
        /// The settled listing.
        listing_id: ListingId,
        /// The credit that changed hands.
        token_id: CreditId,
        /// The new owner.
        buyer: AccountId,
        /// Units purchased.
        amount: u64,
        /// Total price collected.
        total_price: u64,
        /// When settlement committed.
        at: Timestamp,
    },
}

impl MarketEvent {
    /// Short event name for logs and indexers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListingCreated { .. } => "ListingCreated",
            Self::CreditsPurchased { .. } => "CreditsPurchased",
        }
    }
}
