//! Marketplace settlement flows over a live ledger: the full
//! mint-list-purchase path, payment fault injection (decline, stall,
//! timeout), cancellation rules, and purchase/cancel serialization.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use ccl_core::{AccountId, CreditId, ErrorCode, ProjectHash, Timestamp, Vintage};
use ccl_crypto::Note;
use ccl_ledger::{CarbonLedger, MintPolicy, MintRequest, ProjectType};
use ccl_market::{InMemoryGateway, MarketEvent, Marketplace, Payment};
use ccl_zkp::{
    CircuitKind, IssuanceSignals, MockProofSystem, ProofGate, VerificationKey,
    VerificationKeyRegistry,
};

const TIMEOUT: Duration = Duration::from_secs(5);

struct Fixture {
    ledger: Arc<CarbonLedger<MockProofSystem>>,
    gateway: Arc<InMemoryGateway>,
    market: Arc<Marketplace<MockProofSystem, InMemoryGateway>>,
    issuance_key: VerificationKey,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

fn fixture() -> Fixture {
    init_tracing();

    let issuance_key =
        MockProofSystem::insecure_key(CircuitKind::CreditIssuance.signal_count());
    let transfer_key =
        MockProofSystem::insecure_key(CircuitKind::ConfidentialTransfer.signal_count());

    let mut keys = VerificationKeyRegistry::new();
    keys.configure(CircuitKind::CreditIssuance, issuance_key.clone())
        .unwrap();
    keys.configure(CircuitKind::ConfidentialTransfer, transfer_key)
        .unwrap();

    let policy = MintPolicy {
        carbon_factor_g_per_kwh: 400,
        min_energy_wh: 0,
        verify_timeout_secs: 5,
    };
    let ledger = Arc::new(CarbonLedger::new(
        ProofGate::new(MockProofSystem, keys),
        policy,
    ));
    let gateway = Arc::new(InMemoryGateway::new());
    let market = Arc::new(Marketplace::new(Arc::clone(&ledger), Arc::clone(&gateway)));
    Fixture {
        ledger,
        gateway,
        market,
        issuance_key,
    }
}

fn account(name: &str) -> AccountId {
    AccountId::new(name).unwrap()
}

async fn mint_credit(fx: &Fixture, owner: &str) -> CreditId {
    let note = Note::random(400);
    let signals = IssuanceSignals {
        commitment: note.commitment(),
        energy_wh: 1000,
        carbon_factor_g_per_kwh: 400,
        min_energy_wh: 0,
        max_timestamp: Timestamp::now(),
    };
    let proof = MockProofSystem::prove(&fx.issuance_key, &signals.to_signals());
    fx.ledger
        .mint(
            MintRequest {
                owner: account(owner),
                carbon_amount_g: 400,
                energy_wh: 1000,
                project_hash: ProjectHash::from_bytes([0x42; 32]),
                project_type: ProjectType::Wind,
                location: "Gulf of Suez".to_string(),
                vintage: Vintage::new(2024).unwrap(),
                metadata_uri: "ipfs://credit-meta".to_string(),
            },
            &proof,
            TIMEOUT,
        )
        .await
        .unwrap()
}

// ─── The reference scenario ──────────────────────────────────────────

#[tokio::test]
async fn mint_list_purchase_then_listing_is_spent() -> Result<()> {
    let fx = fixture();
    let credit_id = mint_credit(&fx, "producer-1").await;

    // List at 25 per unit for the full 400 units.
    let listing_id = fx
        .market
        .create_listing(credit_id, account("producer-1"), 25, 400)?;
    assert!(fx.ledger.credit(credit_id).unwrap().is_listed());

    // Exact payment settles: ownership moves, listing deactivates.
    fx.market
        .purchase(
            listing_id,
            account("buyer-b"),
            Payment {
                payer: account("buyer-b"),
                amount: 10_000,
            },
            TIMEOUT,
        )
        .await?;

    let credit = fx.ledger.credit(credit_id).unwrap();
    assert_eq!(credit.owner, account("buyer-b"));
    assert!(!credit.is_listed());
    assert!(!fx.market.listing(listing_id).unwrap().active);
    assert_eq!(fx.gateway.charges().len(), 1);
    assert_eq!(fx.gateway.charges()[0].amount, 10_000);

    // A second purchase of the same listing fails cleanly.
    let err = fx
        .market
        .purchase(
            listing_id,
            account("buyer-c"),
            Payment {
                payer: account("buyer-c"),
                amount: 10_000,
            },
            TIMEOUT,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "LISTING_NOT_ACTIVE");
    assert_eq!(fx.gateway.charges().len(), 1);

    let events = fx.market.events();
    assert!(matches!(events[0], MarketEvent::ListingCreated { .. }));
    assert!(matches!(events[1], MarketEvent::CreditsPurchased { .. }));
    Ok(())
}

// ─── Listing preconditions ───────────────────────────────────────────

#[tokio::test]
async fn listing_requires_ownership_and_sane_terms() {
    let fx = fixture();
    let credit_id = mint_credit(&fx, "producer-1").await;

    assert_eq!(
        fx.market
            .create_listing(credit_id, account("stranger"), 25, 400)
            .unwrap_err()
            .code(),
        "NOT_OWNER"
    );
    assert_eq!(
        fx.market
            .create_listing(credit_id, account("producer-1"), 0, 400)
            .unwrap_err()
            .code(),
        "INVALID_LISTING"
    );
    assert_eq!(
        fx.market
            .create_listing(credit_id, account("producer-1"), 25, 0)
            .unwrap_err()
            .code(),
        "INVALID_LISTING"
    );
    // More units than the credit carries.
    assert_eq!(
        fx.market
            .create_listing(credit_id, account("producer-1"), 25, 401)
            .unwrap_err()
            .code(),
        "INVALID_LISTING"
    );
}

#[tokio::test]
async fn second_listing_of_same_credit_rejected() {
    let fx = fixture();
    let credit_id = mint_credit(&fx, "producer-1").await;
    fx.market
        .create_listing(credit_id, account("producer-1"), 25, 400)
        .unwrap();

    let err = fx
        .market
        .create_listing(credit_id, account("producer-1"), 30, 400)
        .unwrap_err();
    assert_eq!(err.code(), "CREDIT_ESCROWED");
}

#[tokio::test]
async fn retired_credit_cannot_be_listed() {
    let fx = fixture();
    let credit_id = mint_credit(&fx, "producer-1").await;
    fx.ledger
        .retire(credit_id, &account("producer-1"), "offset")
        .unwrap();

    let err = fx
        .market
        .create_listing(credit_id, account("producer-1"), 25, 400)
        .unwrap_err();
    assert_eq!(err.code(), "ALREADY_RETIRED");
}

// ─── Payment fault injection ─────────────────────────────────────────

#[tokio::test]
async fn underpayment_rejected_before_any_charge() {
    let fx = fixture();
    let credit_id = mint_credit(&fx, "producer-1").await;
    let listing_id = fx
        .market
        .create_listing(credit_id, account("producer-1"), 25, 400)
        .unwrap();

    let err = fx
        .market
        .purchase(
            listing_id,
            account("buyer-b"),
            Payment {
                payer: account("buyer-b"),
                amount: 9_999,
            },
            TIMEOUT,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INSUFFICIENT_PAYMENT");
    assert!(fx.gateway.charges().is_empty());
    assert!(fx.market.listing(listing_id).unwrap().active);
    assert_eq!(fx.ledger.credit(credit_id).unwrap().owner, account("producer-1"));
}

#[tokio::test]
async fn declined_charge_leaves_listing_purchasable() -> Result<()> {
    let fx = fixture();
    let credit_id = mint_credit(&fx, "producer-1").await;
    let listing_id = fx
        .market
        .create_listing(credit_id, account("producer-1"), 25, 400)?;

    fx.gateway.decline_with("card expired");
    let err = fx
        .market
        .purchase(
            listing_id,
            account("buyer-b"),
            Payment {
                payer: account("buyer-b"),
                amount: 10_000,
            },
            TIMEOUT,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "PAYMENT_DECLINED");

    // Nothing moved: listing active, escrow intact, owner unchanged.
    let listing = fx.market.listing(listing_id).unwrap();
    assert!(listing.active);
    assert!(!listing.settling);
    assert_eq!(fx.ledger.credit(credit_id).unwrap().owner, account("producer-1"));
    assert!(fx.gateway.refunds().is_empty());

    // The same listing settles once the processor recovers.
    fx.gateway.accept();
    fx.market
        .purchase(
            listing_id,
            account("buyer-b"),
            Payment {
                payer: account("buyer-b"),
                amount: 10_000,
            },
            TIMEOUT,
        )
        .await?;
    assert_eq!(fx.ledger.credit(credit_id).unwrap().owner, account("buyer-b"));
    Ok(())
}

#[tokio::test]
async fn stalled_charge_times_out_with_no_state_change() {
    let fx = fixture();
    let credit_id = mint_credit(&fx, "producer-1").await;
    let listing_id = fx
        .market
        .create_listing(credit_id, account("producer-1"), 25, 400)
        .unwrap();

    fx.gateway.stall_for(Duration::from_millis(500));
    let err = fx
        .market
        .purchase(
            listing_id,
            account("buyer-b"),
            Payment {
                payer: account("buyer-b"),
                amount: 10_000,
            },
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "TIMEOUT");

    // Reported as failed, nothing committed.
    let listing = fx.market.listing(listing_id).unwrap();
    assert!(listing.active);
    assert!(!listing.settling);
    assert_eq!(fx.ledger.credit(credit_id).unwrap().owner, account("producer-1"));

    // The seller can still cancel and dispose of the credit.
    fx.market
        .cancel_listing(listing_id, &account("producer-1"))
        .unwrap();
    assert!(fx
        .ledger
        .retire(credit_id, &account("producer-1"), "withdrawn")
        .is_ok());
}

// ─── Cancellation ────────────────────────────────────────────────────

#[tokio::test]
async fn only_seller_may_cancel() {
    let fx = fixture();
    let credit_id = mint_credit(&fx, "producer-1").await;
    let listing_id = fx
        .market
        .create_listing(credit_id, account("producer-1"), 25, 400)
        .unwrap();

    assert_eq!(
        fx.market
            .cancel_listing(listing_id, &account("stranger"))
            .unwrap_err()
            .code(),
        "NOT_OWNER"
    );

    fx.market
        .cancel_listing(listing_id, &account("producer-1"))
        .unwrap();
    assert!(!fx.market.listing(listing_id).unwrap().active);
    assert!(!fx.ledger.credit(credit_id).unwrap().is_listed());

    // Cancelling twice fails cleanly.
    assert_eq!(
        fx.market
            .cancel_listing(listing_id, &account("producer-1"))
            .unwrap_err()
            .code(),
        "LISTING_NOT_ACTIVE"
    );
}

#[tokio::test]
async fn cancel_during_settlement_is_refused() {
    let fx = fixture();
    let credit_id = mint_credit(&fx, "producer-1").await;
    let listing_id = fx
        .market
        .create_listing(credit_id, account("producer-1"), 25, 400)
        .unwrap();

    // A slow processor keeps the purchase settling while the seller
    // races a cancellation.
    fx.gateway.stall_for(Duration::from_millis(300));
    let market = Arc::clone(&fx.market);
    let purchase = tokio::spawn(async move {
        market
            .purchase(
                listing_id,
                account("buyer-b"),
                Payment {
                    payer: account("buyer-b"),
                    amount: 10_000,
                },
                TIMEOUT,
            )
            .await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let err = fx
        .market
        .cancel_listing(listing_id, &account("producer-1"))
        .unwrap_err();
    assert_eq!(err.code(), "SETTLEMENT_IN_PROGRESS");

    // The purchase wins the race and settles.
    purchase.await.unwrap().unwrap();
    assert_eq!(fx.ledger.credit(credit_id).unwrap().owner, account("buyer-b"));
    assert_eq!(
        fx.market
            .cancel_listing(listing_id, &account("producer-1"))
            .unwrap_err()
            .code(),
        "LISTING_NOT_ACTIVE"
    );
}

#[tokio::test]
async fn payer_must_match_buyer() {
    let fx = fixture();
    let credit_id = mint_credit(&fx, "producer-1").await;
    let listing_id = fx
        .market
        .create_listing(credit_id, account("producer-1"), 25, 400)
        .unwrap();

    let err = fx
        .market
        .purchase(
            listing_id,
            account("buyer-b"),
            Payment {
                payer: account("someone-else"),
                amount: 10_000,
            },
            TIMEOUT,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "PAYER_MISMATCH");
    assert!(fx.gateway.charges().is_empty());
}
