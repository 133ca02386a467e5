//! # Listings
//!
//! A listing offers a credit's full carbon amount (or a declared portion
//! of it) at a fixed unit price. One active listing per credit — the
//! credit's escrow lock enforces this on the ledger side.

use serde::{Deserialize, Serialize};

use ccl_core::{AccountId, CreditId, ListingId, Timestamp};

/// A fixed-price marketplace listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Unique listing identifier.
    pub id: ListingId,
    /// The credit being offered.
    pub token_id: CreditId,
    /// The offering account; only the seller may cancel.
    pub seller: AccountId,
    /// Price per unit of carbon, in payment minor units.
    pub price_per_unit: u64,
    /// Units offered.
    pub amount: u64,
    /// Total settlement price (`price_per_unit * amount`, validated
    /// against overflow at creation).
    pub total_price: u64,
    /// Whether the listing can still be purchased or cancelled.
    pub active: bool,
    /// Whether a purchase is currently settling. Serializes `purchase`
    /// against `cancel_listing`; cleared when settlement finishes either
    /// way.
    pub settling: bool,
    /// When the listing was created.
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_serde_roundtrip() {
        let listing = Listing {
            id: ListingId::new(),
            token_id: CreditId::new(),
            seller: AccountId::new("producer-1").unwrap(),
            price_per_unit: 25,
            amount: 400,
            total_price: 10_000,
            active: true,
            settling: false,
            created_at: Timestamp::now(),
        };
        let json = serde_json::to_string(&listing).unwrap();
        let parsed: Listing = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, listing.id);
        assert_eq!(parsed.total_price, 10_000);
        assert!(parsed.active);
    }
}
