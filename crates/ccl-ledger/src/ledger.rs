//! # Carbon Ledger Operations
//!
//! `CarbonLedger` owns the credit table, the shielded pool, and the event
//! log, and gates every confidential mutation behind the proof verifier.
//!
//! ## Operation Shape
//!
//! Proof-gated operations run in two stages: an awaited verification
//! stage (off-thread, deadline-bounded, commits nothing), then a
//! synchronous commit stage under the appropriate lock that runs to
//! completion. Abandoning the future during verification leaves the
//! ledger untouched; once commit begins there is no await point left to
//! abandon.
//!
//! ## Security Invariant
//!
//! Every value a confidential operation commits — commitment, nullifier,
//! energy, carbon factor — is parsed from the proof's public signals.
//! Caller-supplied fields are cross-checked against the signals and
//! rejected on disagreement, never trusted in their place.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ccl_core::{AccountId, CreditId, ErrorCode, ListingId, ProjectHash, Timestamp, Vintage};
use ccl_crypto::{Commitment, Nullifier};
use ccl_zkp::{
    CircuitKind, GateError, IssuanceSignals, ProofBundle, ProofGate, ProofSystem, SignalError,
    TransferSignals,
};

use crate::credit::{CarbonCredit, CreditError, CreditStatus, ProjectType};
use crate::events::LedgerEvent;
use crate::policy::MintPolicy;
use crate::pool::ShieldedPool;
use crate::registry::RegistryError;

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from `mint`.
#[derive(Error, Debug)]
pub enum MintError {
    /// Proof verification failed.
    #[error(transparent)]
    Proof(#[from] GateError),

    /// The proof's public signals do not encode a usable issuance.
    #[error(transparent)]
    Signals(#[from] SignalError),

    /// The request's energy claim disagrees with the proved value.
    #[error("requested energy {requested} Wh does not match proved energy {proved} Wh")]
    EnergyMismatch {
        /// Energy in the mint request.
        requested: u64,
        /// Energy in the proof's public signals.
        proved: u64,
    },

    /// The proof was generated against different accounting rules than
    /// this ledger enforces.
    #[error("proof policy mismatch: {reason}")]
    PolicyMismatch {
        /// Which rule disagreed.
        reason: String,
    },

    /// The proved energy is below this ledger's issuance threshold.
    #[error("proved energy {energy_wh} Wh below issuance threshold {min_energy_wh} Wh")]
    EnergyBelowThreshold {
        /// The proved energy.
        energy_wh: u64,
        /// The ledger's threshold.
        min_energy_wh: u64,
    },

    /// The requested carbon amount is not the amount implied by the
    /// proved energy and the configured carbon factor.
    #[error(
        "inconsistent carbon factor: requested {requested_carbon_g} g, expected {expected_carbon_g} g"
    )]
    InconsistentCarbonFactor {
        /// Carbon amount in the mint request.
        requested_carbon_g: u64,
        /// Carbon amount implied by policy.
        expected_carbon_g: u64,
    },

    /// The carbon computation exceeds the representable range.
    #[error("carbon amount overflows for energy {energy_wh} Wh")]
    AmountOverflow {
        /// The energy claim that overflowed.
        energy_wh: u64,
    },

    /// The mint commitment could not be registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ErrorCode for MintError {
    fn code(&self) -> &'static str {
        match self {
            Self::Proof(e) => e.code(),
            Self::Signals(e) => e.code(),
            Self::EnergyMismatch { .. } => "ENERGY_MISMATCH",
            Self::PolicyMismatch { .. } => "POLICY_MISMATCH",
            Self::EnergyBelowThreshold { .. } => "ENERGY_BELOW_THRESHOLD",
            Self::InconsistentCarbonFactor { .. } => "INCONSISTENT_CARBON_FACTOR",
            Self::AmountOverflow { .. } => "AMOUNT_OVERFLOW",
            Self::Registry(e) => e.code(),
        }
    }
}

/// Errors from public and private transfers.
#[derive(Error, Debug)]
pub enum TransferError {
    /// No credit with this identifier exists.
    #[error("unknown credit: {credit_id}")]
    UnknownCredit {
        /// The missing credit.
        credit_id: CreditId,
    },

    /// The caller does not own the credit.
    #[error("account {account} does not own credit {credit_id}")]
    NotOwner {
        /// The credit in question.
        credit_id: CreditId,
        /// The account that attempted the transfer.
        account: AccountId,
    },

    /// The credit's lifecycle state forbids the transfer.
    #[error(transparent)]
    Credit(#[from] CreditError),

    /// Proof verification failed.
    #[error(transparent)]
    Proof(#[from] GateError),

    /// The proof's public signals do not encode a usable transfer.
    #[error(transparent)]
    Signals(#[from] SignalError),

    /// The shielded-pool mutation was rejected.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ErrorCode for TransferError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownCredit { .. } => "CREDIT_UNKNOWN",
            Self::NotOwner { .. } => "NOT_OWNER",
            Self::Credit(e) => e.code(),
            Self::Proof(e) => e.code(),
            Self::Signals(e) => e.code(),
            Self::Registry(e) => e.code(),
        }
    }
}

/// Errors from `retire`.
#[derive(Error, Debug)]
pub enum RetireError {
    /// No credit with this identifier exists.
    #[error("unknown credit: {credit_id}")]
    UnknownCredit {
        /// The missing credit.
        credit_id: CreditId,
    },

    /// The caller does not own the credit.
    #[error("account {account} does not own credit {credit_id}")]
    NotOwner {
        /// The credit in question.
        credit_id: CreditId,
        /// The account that attempted the retirement.
        account: AccountId,
    },

    /// The credit's lifecycle state forbids retirement.
    #[error(transparent)]
    Credit(#[from] CreditError),
}

impl ErrorCode for RetireError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownCredit { .. } => "CREDIT_UNKNOWN",
            Self::NotOwner { .. } => "NOT_OWNER",
            Self::Credit(e) => e.code(),
        }
    }
}

/// Errors from the escrow transitions the marketplace drives.
#[derive(Error, Debug)]
pub enum EscrowError {
    /// No credit with this identifier exists.
    #[error("unknown credit: {credit_id}")]
    UnknownCredit {
        /// The missing credit.
        credit_id: CreditId,
    },

    /// The caller does not own the credit.
    #[error("account {account} does not own credit {credit_id}")]
    NotOwner {
        /// The credit in question.
        credit_id: CreditId,
        /// The account that attempted the operation.
        account: AccountId,
    },

    /// The credit's lifecycle state forbids the transition.
    #[error(transparent)]
    Credit(#[from] CreditError),
}

impl ErrorCode for EscrowError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownCredit { .. } => "CREDIT_UNKNOWN",
            Self::NotOwner { .. } => "NOT_OWNER",
            Self::Credit(e) => e.code(),
        }
    }
}

// ─── Requests and Receipts ───────────────────────────────────────────

/// Caller-side arguments to `mint`.
///
/// The energy and carbon figures here are cross-checked against the
/// proof's public signals; the committed values come from the signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintRequest {
    /// Initial owner of the credit.
    pub owner: AccountId,
    /// Requested carbon amount in grams of CO2.
    pub carbon_amount_g: u64,
    /// Claimed energy production in watt-hours.
    pub energy_wh: u64,
    /// Backing project identifier.
    pub project_hash: ProjectHash,
    /// Project category.
    pub project_type: ProjectType,
    /// Free-form project location.
    pub location: String,
    /// Production year.
    pub vintage: Vintage,
    /// External metadata reference.
    pub metadata_uri: String,
}

/// Receipt for a committed private transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateTransferReceipt {
    /// The consumed spend marker.
    pub nullifier: Nullifier,
    /// The sender's change-output commitment.
    pub new_sender_commitment: Commitment,
    /// The receiver's output commitment.
    pub receiver_commitment: Commitment,
    /// When the transfer committed.
    pub at: Timestamp,
}

// ─── Ledger ──────────────────────────────────────────────────────────

/// The confidential carbon-credit ledger.
///
/// An explicit store struct: construct one, share it by reference. There
/// is no process-wide instance.
#[derive(Debug)]
pub struct CarbonLedger<S: ProofSystem + 'static> {
    gate: ProofGate<S>,
    policy: MintPolicy,
    credits: Mutex<HashMap<CreditId, CarbonCredit>>,
    pool: ShieldedPool,
    events: Mutex<Vec<LedgerEvent>>,
}

impl<S: ProofSystem + 'static> CarbonLedger<S> {
    /// Build a ledger from a configured proof gate and mint policy.
    pub fn new(gate: ProofGate<S>, policy: MintPolicy) -> Self {
        Self {
            gate,
            policy,
            credits: Mutex::new(HashMap::new()),
            pool: ShieldedPool::new(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// The configured mint policy.
    pub fn policy(&self) -> &MintPolicy {
        &self.policy
    }

    /// The shielded pool (commitment registry + nullifier set).
    pub fn pool(&self) -> &ShieldedPool {
        &self.pool
    }

    /// Snapshot of a credit by identifier.
    pub fn credit(&self, credit_id: CreditId) -> Option<CarbonCredit> {
        self.credits().get(&credit_id).cloned()
    }

    /// Snapshot of the event log.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn credits(&self) -> MutexGuard<'_, HashMap<CreditId, CarbonCredit>> {
        self.credits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: LedgerEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Mint a credit against a verified issuance proof.
    ///
    /// Verification runs off-thread bounded by `timeout`; the commit
    /// stage registers the proved note commitment and inserts the credit
    /// record as one synchronous step.
    ///
    /// # Errors
    ///
    /// Proof, signal, policy, and registry failures — all terminal for
    /// this submission, none leaving any state behind.
    pub async fn mint(
        &self,
        request: MintRequest,
        proof: &ProofBundle,
        timeout: Duration,
    ) -> Result<CreditId, MintError> {
        let signals = IssuanceSignals::parse(&proof.public_signals)?;

        self.gate
            .verify_with_timeout(CircuitKind::CreditIssuance, proof, timeout)
            .await?;

        // The caller's claim must be the proved claim.
        if request.energy_wh != signals.energy_wh {
            return Err(MintError::EnergyMismatch {
                requested: request.energy_wh,
                proved: signals.energy_wh,
            });
        }
        if signals.carbon_factor_g_per_kwh != self.policy.carbon_factor_g_per_kwh {
            return Err(MintError::PolicyMismatch {
                reason: format!(
                    "proved carbon factor {} g/kWh, ledger requires {}",
                    signals.carbon_factor_g_per_kwh, self.policy.carbon_factor_g_per_kwh
                ),
            });
        }
        if signals.min_energy_wh != self.policy.min_energy_wh {
            return Err(MintError::PolicyMismatch {
                reason: format!(
                    "proved against threshold {} Wh, ledger requires {}",
                    signals.min_energy_wh, self.policy.min_energy_wh
                ),
            });
        }
        if signals.energy_wh < self.policy.min_energy_wh {
            return Err(MintError::EnergyBelowThreshold {
                energy_wh: signals.energy_wh,
                min_energy_wh: self.policy.min_energy_wh,
            });
        }

        // Carbon accounting is a ledger rule, not only a proof rule.
        let expected_carbon_g = self
            .policy
            .expected_carbon_g(signals.energy_wh)
            .ok_or(MintError::AmountOverflow {
                energy_wh: signals.energy_wh,
            })?;
        if request.carbon_amount_g != expected_carbon_g {
            return Err(MintError::InconsistentCarbonFactor {
                requested_carbon_g: request.carbon_amount_g,
                expected_carbon_g,
            });
        }

        // Commit stage: no await points from here on.
        self.pool.register_commitment(signals.commitment.clone())?;

        let credit_id = CreditId::new();
        let minted_at = Timestamp::now();
        let credit = CarbonCredit {
            id: credit_id,
            owner: request.owner.clone(),
            carbon_amount_g: expected_carbon_g,
            energy_wh: signals.energy_wh,
            project_hash: request.project_hash,
            project_type: request.project_type,
            location: request.location,
            vintage: request.vintage,
            verified: true,
            metadata_uri: request.metadata_uri,
            minted_at,
            status: CreditStatus::Active,
            transitions: Vec::new(),
        };
        self.credits().insert(credit_id, credit);

        tracing::info!(
            %credit_id,
            owner = %request.owner,
            carbon_amount_g = expected_carbon_g,
            energy_wh = signals.energy_wh,
            "credit minted"
        );
        self.emit(LedgerEvent::CreditMinted {
            credit_id,
            owner: request.owner,
            carbon_amount_g: expected_carbon_g,
            energy_wh: signals.energy_wh,
            commitment: signals.commitment,
            at: minted_at,
        });

        Ok(credit_id)
    }

    /// Reassign ownership of a credit in the clear.
    pub fn transfer_public(
        &self,
        credit_id: CreditId,
        from: &AccountId,
        to: AccountId,
    ) -> Result<(), TransferError> {
        let mut credits = self.credits();
        let credit = credits
            .get_mut(&credit_id)
            .ok_or(TransferError::UnknownCredit { credit_id })?;

        if credit.is_retired() {
            return Err(CreditError::AlreadyRetired { credit_id }.into());
        }
        if &credit.owner != from {
            return Err(TransferError::NotOwner {
                credit_id,
                account: from.clone(),
            });
        }
        credit.transfer_owner(to.clone())?;

        tracing::info!(%credit_id, from = %from, to = %to, "credit ownership reassigned");
        Ok(())
    }

    /// Apply a confidential transfer against a verified transfer proof.
    ///
    /// No owner field changes: ownership in the shielded pool is
    /// knowledge of a note's secret. The nullifier spend and the output
    /// registrations are one critical section.
    pub async fn transfer_private(
        &self,
        proof: &ProofBundle,
        timeout: Duration,
    ) -> Result<PrivateTransferReceipt, TransferError> {
        let signals = TransferSignals::parse(&proof.public_signals)?;

        self.gate
            .verify_with_timeout(CircuitKind::ConfidentialTransfer, proof, timeout)
            .await?;

        // Commit stage: one critical section, all-or-nothing.
        self.pool.apply_private_transfer(&signals)?;

        let at = Timestamp::now();
        tracing::info!(
            nullifier = %signals.nullifier,
            "private transfer committed"
        );
        self.emit(LedgerEvent::PrivateTransfer {
            nullifier: signals.nullifier.clone(),
            new_sender_commitment: signals.new_sender_commitment.clone(),
            receiver_commitment: signals.receiver_commitment.clone(),
            at,
        });

        Ok(PrivateTransferReceipt {
            nullifier: signals.nullifier,
            new_sender_commitment: signals.new_sender_commitment,
            receiver_commitment: signals.receiver_commitment,
            at,
        })
    }

    /// Permanently retire a credit.
    pub fn retire(
        &self,
        credit_id: CreditId,
        requester: &AccountId,
        reason: impl Into<String>,
    ) -> Result<(), RetireError> {
        let reason = reason.into();
        let mut credits = self.credits();
        let credit = credits
            .get_mut(&credit_id)
            .ok_or(RetireError::UnknownCredit { credit_id })?;

        if &credit.owner != requester {
            return Err(RetireError::NotOwner {
                credit_id,
                account: requester.clone(),
            });
        }
        credit.retire(reason.clone())?;
        drop(credits);

        tracing::info!(%credit_id, %reason, "credit retired");
        self.emit(LedgerEvent::CreditRetired {
            credit_id,
            reason,
            at: Timestamp::now(),
        });
        Ok(())
    }

    // ─── Escrow transitions (driven by the marketplace) ──────────────

    /// Escrow a credit under a listing. Fails unless the credit exists,
    /// the seller owns it, and it is active.
    pub fn begin_listing(
        &self,
        credit_id: CreditId,
        seller: &AccountId,
        listing_id: ListingId,
    ) -> Result<(), EscrowError> {
        let mut credits = self.credits();
        let credit = credits
            .get_mut(&credit_id)
            .ok_or(EscrowError::UnknownCredit { credit_id })?;

        if &credit.owner != seller {
            return Err(EscrowError::NotOwner {
                credit_id,
                account: seller.clone(),
            });
        }
        credit.begin_listing(listing_id)?;
        tracing::debug!(%credit_id, %listing_id, "credit escrowed for listing");
        Ok(())
    }

    /// Release a listing's escrow lock without a sale.
    pub fn release_listing(
        &self,
        credit_id: CreditId,
        listing_id: ListingId,
    ) -> Result<(), EscrowError> {
        let mut credits = self.credits();
        let credit = credits
            .get_mut(&credit_id)
            .ok_or(EscrowError::UnknownCredit { credit_id })?;
        credit.release_listing(listing_id)?;
        tracing::debug!(%credit_id, %listing_id, "listing escrow released");
        Ok(())
    }

    /// Settle a listing's sale: release escrow and reassign ownership to
    /// the buyer in one step.
    pub fn settle_listing(
        &self,
        credit_id: CreditId,
        listing_id: ListingId,
        buyer: AccountId,
    ) -> Result<(), EscrowError> {
        let mut credits = self.credits();
        let credit = credits
            .get_mut(&credit_id)
            .ok_or(EscrowError::UnknownCredit { credit_id })?;
        credit.settle_sale(listing_id, buyer.clone())?;
        tracing::info!(%credit_id, %listing_id, buyer = %buyer, "listing settled");
        Ok(())
    }
}
