//! # Carbon Credit Lifecycle State Machine
//!
//! Models the life of a minted credit:
//!
//! ```text
//! mint ──▶ Active ──list──▶ Listed ──settle──▶ Active (new owner)
//!            │                 │
//!            │                 └──cancel──▶ Active (same owner)
//!            │
//!            └──retire──▶ Retired (terminal)
//! ```
//!
//! ## Design Decision
//!
//! Three states with validated transitions rather than typestates: the
//! credit table holds credits of every state in one map, so the state
//! must be a runtime value. `Listed` carries the listing identifier and
//! doubles as the escrow lock — a listed credit cannot be transferred or
//! retired until the listing settles or is cancelled.
//!
//! `Retired` is terminal. No transition leaves it, and every mutating
//! operation on a retired credit fails with a structured error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ccl_core::{AccountId, CreditId, ErrorCode, ListingId, ProjectHash, Timestamp, Vintage};

// ─── Project Types ───────────────────────────────────────────────────

/// The renewable-energy project category backing a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectType {
    /// Photovoltaic or thermal solar.
    Solar,
    /// Onshore or offshore wind.
    Wind,
    /// Run-of-river or reservoir hydro.
    Hydro,
    /// Geothermal generation.
    Geothermal,
    /// Biomass or biogas generation.
    Biomass,
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Solar => "SOLAR",
            Self::Wind => "WIND",
            Self::Hydro => "HYDRO",
            Self::Geothermal => "GEOTHERMAL",
            Self::Biomass => "BIOMASS",
        };
        f.write_str(s)
    }
}

// ─── Credit Status ───────────────────────────────────────────────────

/// The lifecycle state of a credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditStatus {
    /// Owned, transferable, listable.
    Active,
    /// Escrowed under an active marketplace listing.
    Listed {
        /// The listing holding the escrow lock.
        listing_id: ListingId,
    },
    /// Permanently retired (terminal).
    Retired {
        /// Why the credit was retired.
        reason: String,
    },
}

impl CreditStatus {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Retired { .. })
    }

    /// The canonical state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Listed { .. } => "LISTED",
            Self::Retired { .. } => "RETIRED",
        }
    }
}

impl std::fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from credit lifecycle transitions.
#[derive(Error, Debug)]
pub enum CreditError {
    /// The credit is retired; no further transitions are permitted.
    #[error("credit {credit_id} is retired")]
    AlreadyRetired {
        /// The terminal credit.
        credit_id: CreditId,
    },

    /// The credit is escrowed under an active listing.
    #[error("credit {credit_id} is escrowed under {listing_id}")]
    Escrowed {
        /// The locked credit.
        credit_id: CreditId,
        /// The listing holding the lock.
        listing_id: ListingId,
    },

    /// The transition requires the credit to be listed, and it is not.
    #[error("credit {credit_id} is not listed")]
    NotListed {
        /// The credit that was expected to be listed.
        credit_id: CreditId,
    },

    /// The transition names a different listing than the one holding the
    /// escrow lock.
    #[error("credit {credit_id} is escrowed under {actual}, not {requested}")]
    ListingMismatch {
        /// The locked credit.
        credit_id: CreditId,
        /// The listing that holds the lock.
        actual: ListingId,
        /// The listing the caller named.
        requested: ListingId,
    },
}

impl ErrorCode for CreditError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRetired { .. } => "ALREADY_RETIRED",
            Self::Escrowed { .. } => "CREDIT_ESCROWED",
            Self::NotListed { .. } => "CREDIT_NOT_LISTED",
            Self::ListingMismatch { .. } => "CREDIT_ESCROWED",
        }
    }
}

// ─── Transition Records ──────────────────────────────────────────────

/// Record of a credit state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransitionRecord {
    /// State before the transition.
    pub from_status: CreditStatus,
    /// State after the transition.
    pub to_status: CreditStatus,
    /// When the transition occurred.
    pub timestamp: Timestamp,
    /// Short operator-facing note.
    pub note: String,
}

// ─── Carbon Credit ───────────────────────────────────────────────────

/// A tokenized carbon credit backed by a verified energy-production claim.
///
/// Owned exclusively by the ledger; mutated only through the transition
/// methods below, each of which validates the current state and appends
/// to the transition log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarbonCredit {
    /// Unique token identifier.
    pub id: CreditId,
    /// Current owner account.
    pub owner: AccountId,
    /// Carbon offset represented, in grams of CO2.
    pub carbon_amount_g: u64,
    /// Verified energy production backing the credit, in watt-hours.
    pub energy_wh: u64,
    /// Opaque identifier of the backing project.
    pub project_hash: ProjectHash,
    /// Project category.
    pub project_type: ProjectType,
    /// Free-form project location.
    pub location: String,
    /// Production year.
    pub vintage: Vintage,
    /// Whether the backing claim passed issuance verification.
    pub verified: bool,
    /// External metadata reference.
    pub metadata_uri: String,
    /// When the credit was minted.
    pub minted_at: Timestamp,
    /// Current lifecycle state.
    pub status: CreditStatus,
    /// Ordered log of all state transitions.
    pub transitions: Vec<CreditTransitionRecord>,
}

impl CarbonCredit {
    /// Whether the credit is retired.
    pub fn is_retired(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the credit is escrowed under a listing.
    pub fn is_listed(&self) -> bool {
        matches!(self.status, CreditStatus::Listed { .. })
    }

    /// Escrow the credit under a listing (ACTIVE → LISTED).
    pub fn begin_listing(&mut self, listing_id: ListingId) -> Result<(), CreditError> {
        match self.status {
            CreditStatus::Active => {
                self.do_transition(CreditStatus::Listed { listing_id }, "listed for sale");
                Ok(())
            }
            CreditStatus::Listed { listing_id } => Err(CreditError::Escrowed {
                credit_id: self.id,
                listing_id,
            }),
            CreditStatus::Retired { .. } => Err(CreditError::AlreadyRetired {
                credit_id: self.id,
            }),
        }
    }

    /// Release the escrow lock without a sale (LISTED → ACTIVE).
    pub fn release_listing(&mut self, listing_id: ListingId) -> Result<(), CreditError> {
        self.require_listed_under(listing_id)?;
        self.do_transition(CreditStatus::Active, "listing cancelled");
        Ok(())
    }

    /// Settle a sale: release escrow and reassign ownership
    /// (LISTED → ACTIVE with new owner).
    pub fn settle_sale(
        &mut self,
        listing_id: ListingId,
        buyer: AccountId,
    ) -> Result<(), CreditError> {
        self.require_listed_under(listing_id)?;
        self.owner = buyer;
        self.do_transition(CreditStatus::Active, "sold via listing");
        Ok(())
    }

    /// Reassign ownership outside the marketplace (ACTIVE → ACTIVE).
    pub fn transfer_owner(&mut self, to: AccountId) -> Result<(), CreditError> {
        match self.status {
            CreditStatus::Active => {
                self.owner = to;
                self.do_transition(CreditStatus::Active, "ownership transferred");
                Ok(())
            }
            CreditStatus::Listed { listing_id } => Err(CreditError::Escrowed {
                credit_id: self.id,
                listing_id,
            }),
            CreditStatus::Retired { .. } => Err(CreditError::AlreadyRetired {
                credit_id: self.id,
            }),
        }
    }

    /// Retire the credit permanently (ACTIVE → RETIRED).
    pub fn retire(&mut self, reason: impl Into<String>) -> Result<(), CreditError> {
        match self.status {
            CreditStatus::Active => {
                let reason = reason.into();
                self.do_transition(
                    CreditStatus::Retired {
                        reason: reason.clone(),
                    },
                    &reason,
                );
                Ok(())
            }
            CreditStatus::Listed { listing_id } => Err(CreditError::Escrowed {
                credit_id: self.id,
                listing_id,
            }),
            CreditStatus::Retired { .. } => Err(CreditError::AlreadyRetired {
                credit_id: self.id,
            }),
        }
    }

    fn require_listed_under(&self, listing_id: ListingId) -> Result<(), CreditError> {
        match self.status {
            CreditStatus::Listed { listing_id: actual } if actual == listing_id => Ok(()),
            CreditStatus::Listed { listing_id: actual } => Err(CreditError::ListingMismatch {
                credit_id: self.id,
                actual,
                requested: listing_id,
            }),
            CreditStatus::Retired { .. } => Err(CreditError::AlreadyRetired {
                credit_id: self.id,
            }),
            CreditStatus::Active => Err(CreditError::NotListed {
                credit_id: self.id,
            }),
        }
    }

    /// Record a state transition.
    fn do_transition(&mut self, to: CreditStatus, note: &str) {
        self.transitions.push(CreditTransitionRecord {
            from_status: self.status.clone(),
            to_status: to.clone(),
            timestamp: Timestamp::now(),
            note: note.to_string(),
        });
        self.status = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_credit() -> CarbonCredit {
        CarbonCredit {
            id: CreditId::new(),
            owner: AccountId::new("producer-1").unwrap(),
            carbon_amount_g: 400,
            energy_wh: 1000,
            project_hash: ProjectHash::from_bytes([0x42; 32]),
            project_type: ProjectType::Solar,
            location: "Atacama".to_string(),
            vintage: Vintage::new(2024).unwrap(),
            verified: true,
            metadata_uri: "ipfs://credit-meta".to_string(),
            minted_at: Timestamp::now(),
            status: CreditStatus::Active,
            transitions: Vec::new(),
        }
    }

    #[test]
    fn test_list_then_cancel_returns_to_active() {
        let mut credit = make_credit();
        let listing = ListingId::new();
        credit.begin_listing(listing).unwrap();
        assert!(credit.is_listed());
        credit.release_listing(listing).unwrap();
        assert_eq!(credit.status, CreditStatus::Active);
        assert_eq!(credit.transitions.len(), 2);
    }

    #[test]
    fn test_double_listing_rejected() {
        let mut credit = make_credit();
        credit.begin_listing(ListingId::new()).unwrap();
        let err = credit.begin_listing(ListingId::new()).unwrap_err();
        assert_eq!(err.code(), "CREDIT_ESCROWED");
    }

    #[test]
    fn test_settle_sale_reassigns_owner() {
        let mut credit = make_credit();
        let listing = ListingId::new();
        let buyer = AccountId::new("buyer-7").unwrap();
        credit.begin_listing(listing).unwrap();
        credit.settle_sale(listing, buyer.clone()).unwrap();
        assert_eq!(credit.owner, buyer);
        assert_eq!(credit.status, CreditStatus::Active);
    }

    #[test]
    fn test_settle_requires_matching_listing() {
        let mut credit = make_credit();
        credit.begin_listing(ListingId::new()).unwrap();
        let err = credit
            .settle_sale(ListingId::new(), AccountId::new("buyer").unwrap())
            .unwrap_err();
        assert!(matches!(err, CreditError::ListingMismatch { .. }));
    }

    #[test]
    fn test_listed_credit_cannot_transfer_or_retire() {
        let mut credit = make_credit();
        credit.begin_listing(ListingId::new()).unwrap();
        assert!(credit
            .transfer_owner(AccountId::new("thief").unwrap())
            .is_err());
        assert!(credit.retire("attempted").is_err());
    }

    #[test]
    fn test_retired_is_terminal() {
        let mut credit = make_credit();
        credit.retire("voluntary offset").unwrap();
        assert!(credit.is_retired());

        let err = credit.begin_listing(ListingId::new()).unwrap_err();
        assert_eq!(err.code(), "ALREADY_RETIRED");
        assert!(credit
            .transfer_owner(AccountId::new("late").unwrap())
            .is_err());
        assert!(credit.retire("again").is_err());
        assert!(credit.release_listing(ListingId::new()).is_err());
    }

    #[test]
    fn test_retirement_records_reason() {
        let mut credit = make_credit();
        credit.retire("2030 net-zero program").unwrap();
        match &credit.status {
            CreditStatus::Retired { reason } => assert_eq!(reason, "2030 net-zero program"),
            other => panic!("expected Retired, got {other:?}"),
        }
    }

    #[test]
    fn test_transition_log_records_all_changes() {
        let mut credit = make_credit();
        let listing = ListingId::new();
        credit.begin_listing(listing).unwrap();
        credit
            .settle_sale(listing, AccountId::new("buyer").unwrap())
            .unwrap();
        credit.retire("offset").unwrap();

        assert_eq!(credit.transitions.len(), 3);
        assert_eq!(credit.transitions[0].from_status, CreditStatus::Active);
        assert_eq!(credit.transitions[2].to_status.name(), "RETIRED");
    }

    #[test]
    fn test_status_display() {
        assert_eq!(CreditStatus::Active.to_string(), "ACTIVE");
        assert_eq!(
            CreditStatus::Listed {
                listing_id: ListingId::new()
            }
            .to_string(),
            "LISTED"
        );
        assert_eq!(
            CreditStatus::Retired {
                reason: "done".into()
            }
            .to_string(),
            "RETIRED"
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let credit = make_credit();
        let json = serde_json::to_string(&credit).unwrap();
        let parsed: CarbonCredit = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, credit.id);
        assert_eq!(parsed.status, credit.status);
    }
}
