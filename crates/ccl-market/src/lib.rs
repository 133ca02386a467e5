//! # ccl-market — Marketplace Settlement
//!
//! Lists credits for sale and settles purchases atomically against the
//! ledger:
//!
//! - **Listings** (`listing.rs`): fixed-price listing records. Creating a
//!   listing escrows the credit; there is no order book and no partial
//!   fill.
//! - **Payments** (`payment.rs`): the `PaymentGateway` boundary to the
//!   external payment processor, plus the in-memory implementation used
//!   in development and fault-injection tests.
//! - **Marketplace** (`market.rs`): `create_listing`, `purchase`,
//!   `cancel_listing`. Purchase is two-phase — reserve, charge under a
//!   deadline, then a synchronous commit — with a compensating refund if
//!   the commit cannot complete after a successful charge.
//! - **Events** (`events.rs`): `ListingCreated` and `CreditsPurchased`.
//!
//! ## Crate Policy
//!
//! - Either payment is accepted *and* ownership transfers *and* the
//!   listing deactivates, or none of the three. No error path leaves a
//!   mixed state.
//! - A purchase and a cancellation of the same listing serialize; one of
//!   them wins, the other gets a typed error.

pub mod events;
pub mod listing;
pub mod market;
pub mod payment;

pub use events::MarketEvent;
pub use listing::Listing;
pub use market::{CancelError, ListError, Marketplace, PurchaseError};
pub use payment::{
    InMemoryGateway, Payment, PaymentError, PaymentGateway, PaymentIntent, PaymentReceipt,
};
