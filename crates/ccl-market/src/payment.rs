//! # Payment Gateway Boundary
//!
//! Payments are processed by an external collaborator. The marketplace
//! talks to it through [`PaymentGateway`]: `charge` to collect funds,
//! `refund` to compensate a charge whose settlement could not complete.
//!
//! [`InMemoryGateway`] is the in-process implementation used in
//! development and tests. It records every charge and refund and can be
//! programmed to decline or stall, which is how settlement fault paths
//! are exercised.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ccl_core::{AccountId, ErrorCode, ListingId};

/// Funds offered by a buyer for a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// The paying account.
    pub payer: AccountId,
    /// Offered funds, in payment minor units.
    pub amount: u64,
}

/// A charge request sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// The listing being settled.
    pub listing_id: ListingId,
    /// The paying account.
    pub payer: AccountId,
    /// Amount to collect, in payment minor units.
    pub amount: u64,
}

/// Proof of a completed charge, required for refunds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// Gateway-assigned charge reference.
    pub reference: String,
    /// The listing the charge settled.
    pub listing_id: ListingId,
    /// Amount collected.
    pub amount: u64,
}

/// Errors from the payment processor.
#[derive(Error, Debug)]
pub enum PaymentError {
    /// The processor refused the charge.
    #[error("payment declined: {reason}")]
    Declined {
        /// Processor-supplied reason.
        reason: String,
    },

    /// The processor could not be reached or errored internally.
    #[error("payment gateway unavailable: {reason}")]
    Unavailable {
        /// What failed.
        reason: String,
    },
}

impl ErrorCode for PaymentError {
    fn code(&self) -> &'static str {
        match self {
            Self::Declined { .. } => "PAYMENT_DECLINED",
            Self::Unavailable { .. } => "PAYMENT_UNAVAILABLE",
        }
    }
}

/// The external payment processor boundary.
///
/// Implementations must be safe to call from a blocking worker thread.
/// `charge` must be atomic on the processor side: funds are either
/// collected in full or not at all.
pub trait PaymentGateway: Send + Sync {
    /// Collect the intent's amount from the payer.
    fn charge(&self, intent: &PaymentIntent) -> Result<PaymentReceipt, PaymentError>;

    /// Return a previously collected charge.
    fn refund(&self, receipt: &PaymentReceipt) -> Result<(), PaymentError>;
}

// ─── In-memory implementation ────────────────────────────────────────

#[derive(Debug, Default)]
struct GatewayState {
    charges: Vec<PaymentReceipt>,
    refunds: Vec<String>,
    next_reference: u64,
    decline_reason: Option<String>,
    stall: Option<Duration>,
}

/// In-process payment gateway for development and fault-injection tests.
///
/// Records every charge and refund. `decline_next` and `stall_for`
/// program the next charges to fail or hang, so callers can exercise
/// their rollback and timeout paths.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    state: Mutex<GatewayState>,
}

impl InMemoryGateway {
    /// Create a gateway that accepts every charge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decline all subsequent charges with the given reason.
    pub fn decline_with(&self, reason: impl Into<String>) {
        self.state().decline_reason = Some(reason.into());
    }

    /// Accept charges again after `decline_with`.
    pub fn accept(&self) {
        self.state().decline_reason = None;
    }

    /// Make every subsequent charge block for the given duration before
    /// completing.
    pub fn stall_for(&self, duration: Duration) {
        self.state().stall = Some(duration);
    }

    /// All charges collected so far.
    pub fn charges(&self) -> Vec<PaymentReceipt> {
        self.state().charges.clone()
    }

    /// References of all refunds issued so far.
    pub fn refunds(&self) -> Vec<String> {
        self.state().refunds.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PaymentGateway for InMemoryGateway {
    fn charge(&self, intent: &PaymentIntent) -> Result<PaymentReceipt, PaymentError> {
        let stall = self.state().stall;
        if let Some(duration) = stall {
            // Simulates a slow processor; the lock is not held while
            // sleeping so concurrent bookkeeping calls stay responsive.
            std::thread::sleep(duration);
        }

        let mut state = self.state();
        if let Some(reason) = state.decline_reason.clone() {
            return Err(PaymentError::Declined { reason });
        }
        state.next_reference += 1;
        let receipt = PaymentReceipt {
            reference: format!("pay-{:06}", state.next_reference),
            listing_id: intent.listing_id,
            amount: intent.amount,
        };
        state.charges.push(receipt.clone());
        Ok(receipt)
    }

    fn refund(&self, receipt: &PaymentReceipt) -> Result<(), PaymentError> {
        let mut state = self.state();
        if !state.charges.iter().any(|c| c.reference == receipt.reference) {
            return Err(PaymentError::Unavailable {
                reason: format!("unknown charge reference {}", receipt.reference),
            });
        }
        state.refunds.push(receipt.reference.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(amount: u64) -> PaymentIntent {
        PaymentIntent {
            listing_id: ListingId::new(),
            payer: AccountId::new("buyer-1").unwrap(),
            amount,
        }
    }

    #[test]
    fn test_charge_records_receipt() {
        let gateway = InMemoryGateway::new();
        let receipt = gateway.charge(&intent(10_000)).unwrap();
        assert_eq!(receipt.amount, 10_000);
        assert_eq!(gateway.charges().len(), 1);
    }

    #[test]
    fn test_charge_references_are_unique() {
        let gateway = InMemoryGateway::new();
        let a = gateway.charge(&intent(1)).unwrap();
        let b = gateway.charge(&intent(2)).unwrap();
        assert_ne!(a.reference, b.reference);
    }

    #[test]
    fn test_decline_then_accept() {
        let gateway = InMemoryGateway::new();
        gateway.decline_with("card expired");
        let err = gateway.charge(&intent(5)).unwrap_err();
        assert_eq!(err.code(), "PAYMENT_DECLINED");
        assert!(gateway.charges().is_empty());

        gateway.accept();
        assert!(gateway.charge(&intent(5)).is_ok());
    }

    #[test]
    fn test_refund_requires_known_charge() {
        let gateway = InMemoryGateway::new();
        let receipt = gateway.charge(&intent(100)).unwrap();
        gateway.refund(&receipt).unwrap();
        assert_eq!(gateway.refunds(), vec![receipt.reference.clone()]);

        let forged = PaymentReceipt {
            reference: "pay-999999".to_string(),
            listing_id: ListingId::new(),
            amount: 1,
        };
        assert!(gateway.refund(&forged).is_err());
    }
}
