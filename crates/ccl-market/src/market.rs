//! # Marketplace
//!
//! Fixed-price listing and atomic settlement over the carbon ledger.
//!
//! ## Settlement Shape
//!
//! `purchase` runs in three phases:
//!
//! 1. **Reserve** — under the listings lock: the listing must be active
//!    and not already settling; the offered funds must cover the total
//!    price. The listing is marked settling, which locks out concurrent
//!    purchases and cancellations.
//! 2. **Charge** — the payment gateway is called on a blocking worker,
//!    bounded by the caller's deadline. Failure or timeout clears the
//!    reservation and commits nothing.
//! 3. **Commit** — synchronous: the ledger releases escrow to the buyer
//!    and the listing deactivates. If the ledger refuses after a
//!    successful charge, the charge is refunded before the error
//!    returns.
//!
//! A charge that completes on the processor side after the deadline has
//! already been reported as failed is not observed here; operators
//! reconcile such charges from the gateway's own records.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;

use ccl_core::{AccountId, CreditId, ErrorCode, ListingId, Timestamp};
use ccl_ledger::{CarbonLedger, EscrowError};
use ccl_zkp::ProofSystem;

use crate::events::MarketEvent;
use crate::listing::Listing;
use crate::payment::{Payment, PaymentError, PaymentGateway, PaymentIntent};

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from `create_listing`.
#[derive(Error, Debug)]
pub enum ListError {
    /// The listing terms are unusable (zero price, zero amount, amount
    /// beyond the credit, price overflow).
    #[error("invalid listing: {reason}")]
    InvalidListing {
        /// Which term was rejected.
        reason: String,
    },

    /// The credit could not be escrowed.
    #[error(transparent)]
    Escrow(#[from] EscrowError),
}

impl ErrorCode for ListError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidListing { .. } => "INVALID_LISTING",
            Self::Escrow(e) => e.code(),
        }
    }
}

/// Errors from `purchase`.
#[derive(Error, Debug)]
pub enum PurchaseError {
    /// No listing with this identifier exists.
    #[error("unknown listing: {listing_id}")]
    UnknownListing {
        /// The missing listing.
        listing_id: ListingId,
    },

    /// The listing was already purchased or cancelled.
    #[error("listing {listing_id} is not active")]
    ListingNotActive {
        /// The inactive listing.
        listing_id: ListingId,
    },

    /// Another purchase of this listing is currently settling.
    #[error("listing {listing_id} has a settlement in progress")]
    SettlementInProgress {
        /// The contested listing.
        listing_id: ListingId,
    },

    /// The payment's payer is not the purchasing account.
    #[error("payment payer {payer} does not match buyer {buyer}")]
    PayerMismatch {
        /// The purchasing account.
        buyer: AccountId,
        /// The account named in the payment.
        payer: AccountId,
    },

    /// The offered funds do not cover the listing's total price.
    #[error("insufficient payment: required {required}, offered {offered}")]
    InsufficientPayment {
        /// The listing's total price.
        required: u64,
        /// The funds offered.
        offered: u64,
    },

    /// The payment processor refused or failed the charge.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// The charge did not complete within the caller's deadline.
    #[error("payment for listing {listing_id} timed out after {timeout:?}")]
    Timeout {
        /// The listing whose settlement timed out.
        listing_id: ListingId,
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// The ledger refused the settlement transfer.
    #[error(transparent)]
    Escrow(#[from] EscrowError),
}

impl ErrorCode for PurchaseError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownListing { .. } => "LISTING_UNKNOWN",
            Self::ListingNotActive { .. } => "LISTING_NOT_ACTIVE",
            Self::SettlementInProgress { .. } => "SETTLEMENT_IN_PROGRESS",
            Self::PayerMismatch { .. } => "PAYER_MISMATCH",
            Self::InsufficientPayment { .. } => "INSUFFICIENT_PAYMENT",
            Self::Payment(e) => e.code(),
            Self::Timeout { .. } => "TIMEOUT",
            Self::Escrow(e) => e.code(),
        }
    }
}

/// Errors from `cancel_listing`.
#[derive(Error, Debug)]
pub enum CancelError {
    /// No listing with this identifier exists.
    #[error("unknown listing: {listing_id}")]
    UnknownListing {
        /// The missing listing.
        listing_id: ListingId,
    },

    /// The listing was already purchased or cancelled.
    #[error("listing {listing_id} is not active")]
    ListingNotActive {
        /// The inactive listing.
        listing_id: ListingId,
    },

    /// A purchase of this listing is currently settling.
    #[error("listing {listing_id} has a settlement in progress")]
    SettlementInProgress {
        /// The contested listing.
        listing_id: ListingId,
    },

    /// Only the original seller may cancel.
    #[error("account {account} is not the seller of listing {listing_id}")]
    NotSeller {
        /// The listing in question.
        listing_id: ListingId,
        /// The account that attempted the cancellation.
        account: AccountId,
    },

    /// The escrow release was refused by the ledger.
    #[error(transparent)]
    Escrow(#[from] EscrowError),
}

impl ErrorCode for CancelError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownListing { .. } => "LISTING_UNKNOWN",
            Self::ListingNotActive { .. } => "LISTING_NOT_ACTIVE",
            Self::SettlementInProgress { .. } => "SETTLEMENT_IN_PROGRESS",
            Self::NotSeller { .. } => "NOT_OWNER",
            Self::Escrow(e) => e.code(),
        }
    }
}

// ─── Marketplace ─────────────────────────────────────────────────────

/// The marketplace store: listings over a shared ledger and payment
/// gateway.
///
/// An explicit store struct; no process-wide instance.
#[derive(Debug)]
pub struct Marketplace<S: ProofSystem + 'static, G: PaymentGateway + 'static> {
    ledger: Arc<CarbonLedger<S>>,
    gateway: Arc<G>,
    listings: Mutex<HashMap<ListingId, Listing>>,
    events: Mutex<Vec<MarketEvent>>,
}

impl<S: ProofSystem + 'static, G: PaymentGateway + 'static> Marketplace<S, G> {
    /// Build a marketplace over a ledger and a payment gateway.
    pub fn new(ledger: Arc<CarbonLedger<S>>, gateway: Arc<G>) -> Self {
        Self {
            ledger,
            gateway,
            listings: Mutex::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of a listing by identifier.
    pub fn listing(&self, listing_id: ListingId) -> Option<Listing> {
        self.listings().get(&listing_id).cloned()
    }

    /// Snapshot of the event log.
    pub fn events(&self) -> Vec<MarketEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn listings(&self) -> MutexGuard<'_, HashMap<ListingId, Listing>> {
        self.listings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: MarketEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn clear_settling(&self, listing_id: ListingId) {
        if let Some(listing) = self.listings().get_mut(&listing_id) {
            listing.settling = false;
        }
    }

    /// List a credit for sale at a fixed unit price.
    ///
    /// Escrows the credit for the lifetime of the listing: while listed,
    /// the credit cannot be transferred, retired, or listed again.
    pub fn create_listing(
        &self,
        token_id: CreditId,
        seller: AccountId,
        price_per_unit: u64,
        amount: u64,
    ) -> Result<ListingId, ListError> {
        if price_per_unit == 0 {
            return Err(ListError::InvalidListing {
                reason: "price_per_unit must be positive".to_string(),
            });
        }
        if amount == 0 {
            return Err(ListError::InvalidListing {
                reason: "amount must be positive".to_string(),
            });
        }
        let total_price = price_per_unit.checked_mul(amount).ok_or_else(|| {
            ListError::InvalidListing {
                reason: "total price overflows".to_string(),
            }
        })?;

        // Carbon amounts are immutable after mint, so this bound holds
        // even if the credit changes state before the escrow below.
        let credit = self
            .ledger
            .credit(token_id)
            .ok_or(EscrowError::UnknownCredit { credit_id: token_id })?;
        if amount > credit.carbon_amount_g {
            return Err(ListError::InvalidListing {
                reason: format!(
                    "amount {} exceeds credit carbon amount {}",
                    amount, credit.carbon_amount_g
                ),
            });
        }

        let listing_id = ListingId::new();
        self.ledger.begin_listing(token_id, &seller, listing_id)?;

        let created_at = Timestamp::now();
        self.listings().insert(
            listing_id,
            Listing {
                id: listing_id,
                token_id,
                seller: seller.clone(),
                price_per_unit,
                amount,
                total_price,
                active: true,
                settling: false,
                created_at,
            },
        );

        tracing::info!(%listing_id, %token_id, seller = %seller, price_per_unit, amount, "listing created");
        self.emit(MarketEvent::ListingCreated {
            listing_id,
            token_id,
            seller,
            price_per_unit,
            amount,
            at: created_at,
        });
        Ok(listing_id)
    }

    /// Purchase a listing: collect payment and transfer ownership, all
    /// or nothing.
    pub async fn purchase(
        &self,
        listing_id: ListingId,
        buyer: AccountId,
        payment: Payment,
        timeout: Duration,
    ) -> Result<(), PurchaseError> {
        // Phase 1: reserve the listing.
        let (token_id, total_price, amount) = {
            let mut listings = self.listings();
            let listing = listings
                .get_mut(&listing_id)
                .ok_or(PurchaseError::UnknownListing { listing_id })?;
            if listing.settling {
                return Err(PurchaseError::SettlementInProgress { listing_id });
            }
            if !listing.active {
                return Err(PurchaseError::ListingNotActive { listing_id });
            }
            if payment.payer != buyer {
                return Err(PurchaseError::PayerMismatch {
                    buyer: buyer.clone(),
                    payer: payment.payer.clone(),
                });
            }
            if payment.amount < listing.total_price {
                return Err(PurchaseError::InsufficientPayment {
                    required: listing.total_price,
                    offered: payment.amount,
                });
            }
            listing.settling = true;
            (listing.token_id, listing.total_price, listing.amount)
        };

        // Phase 2: charge the gateway, deadline-bounded.
        let intent = PaymentIntent {
            listing_id,
            payer: buyer.clone(),
            amount: total_price,
        };
        let gateway = Arc::clone(&self.gateway);
        let task = tokio::task::spawn_blocking(move || gateway.charge(&intent));
        let receipt = match tokio::time::timeout(timeout, task).await {
            Err(_) => {
                self.clear_settling(listing_id);
                tracing::warn!(%listing_id, ?timeout, "payment charge timed out");
                return Err(PurchaseError::Timeout {
                    listing_id,
                    timeout,
                });
            }
            Ok(Err(join_err)) => {
                self.clear_settling(listing_id);
                return Err(PaymentError::Unavailable {
                    reason: format!("payment task failed: {join_err}"),
                }
                .into());
            }
            Ok(Ok(Err(payment_err))) => {
                self.clear_settling(listing_id);
                tracing::warn!(%listing_id, %payment_err, "payment charge refused");
                return Err(payment_err.into());
            }
            Ok(Ok(Ok(receipt))) => receipt,
        };

        // Phase 3: commit. The escrow lock makes the settlement transfer
        // infallible here; the refund path compensates if that assumption
        // is ever violated.
        if let Err(escrow_err) = self
            .ledger
            .settle_listing(token_id, listing_id, buyer.clone())
        {
            if let Err(refund_err) = self.gateway.refund(&receipt) {
                tracing::error!(
                    %listing_id,
                    %refund_err,
                    "refund after failed settlement also failed; charge requires manual reconciliation"
                );
            }
            self.clear_settling(listing_id);
            return Err(escrow_err.into());
        }

        {
            let mut listings = self.listings();
            if let Some(listing) = listings.get_mut(&listing_id) {
                listing.active = false;
                listing.settling = false;
            }
        }

        tracing::info!(%listing_id, %token_id, buyer = %buyer, total_price, "listing purchased");
        self.emit(MarketEvent::CreditsPurchased {
            listing_id,
            token_id,
            buyer,
            amount,
            total_price,
            at: Timestamp::now(),
        });
        Ok(())
    }

    /// Cancel a listing and release its escrow. Only the seller may
    /// cancel, and not while a purchase is settling.
    pub fn cancel_listing(
        &self,
        listing_id: ListingId,
        requester: &AccountId,
    ) -> Result<(), CancelError> {
        let mut listings = self.listings();
        let listing = listings
            .get_mut(&listing_id)
            .ok_or(CancelError::UnknownListing { listing_id })?;

        if listing.settling {
            return Err(CancelError::SettlementInProgress { listing_id });
        }
        if !listing.active {
            return Err(CancelError::ListingNotActive { listing_id });
        }
        if &listing.seller != requester {
            return Err(CancelError::NotSeller {
                listing_id,
                account: requester.clone(),
            });
        }

        self.ledger.release_listing(listing.token_id, listing_id)?;
        listing.active = false;

        tracing::info!(%listing_id, token_id = %listing.token_id, "listing cancelled");
        Ok(())
    }
}
