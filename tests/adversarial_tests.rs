//! Adversarial and malformed-input tests
//!
//! Every scenario here must leave balances untouched: input errors are caught
//! before submission, and execution failures revert the whole batch.

use batch_distributor::orchestrator::{
    BatchOrchestrator, CallContext, DistributionRequest, DistributionStatus, OrchestratorConfig,
    OrchestratorError, ProviderError, Session, SettlementCall, SimulatedProvider, TxLimits,
    TxOverrides, ValueTransferProvider, SIMULATED_NETWORK_ID,
};
use batch_distributor::settlement::TokenBehavior;
use batch_distributor::types::{Address, Batch, BatchError, LineItem, RevertReason};
use cosmwasm_std::Uint128;
use std::collections::HashMap;
use std::sync::Arc;

const ONE: u128 = 1_000_000_000_000_000_000;
const OWNER_BALANCE: u128 = 100 * ONE;

fn addr(label: &str) -> Address {
    Address::from_label(label)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

async fn setup() -> (Arc<SimulatedProvider>, BatchOrchestrator<SimulatedProvider>) {
    let provider = Arc::new(SimulatedProvider::new());
    provider
        .add_account(&addr("owner"), Uint128::new(OWNER_BALANCE))
        .await
        .unwrap();

    let deployments = HashMap::from([(SIMULATED_NETWORK_ID, provider.engine_address().clone())]);
    let session = Session::open(provider.clone(), &deployments, None)
        .await
        .unwrap();
    let orchestrator = BatchOrchestrator::new(session, OrchestratorConfig::default()).unwrap();

    (provider, orchestrator)
}

async fn assert_nothing_moved(provider: &SimulatedProvider, recipients: &[&str]) {
    assert_eq!(
        provider.native_balance(&addr("owner")).await,
        Uint128::new(OWNER_BALANCE)
    );
    for label in recipients {
        assert!(provider.native_balance(&addr(label)).await.is_zero());
    }
}

fn limits() -> TxLimits {
    TxLimits {
        cost_limit: 1_000_000,
        price: Uint128::new(1),
    }
}

// ==================== Malformed Input Tests ====================

#[tokio::test]
async fn test_mismatched_lengths_rejected() {
    let (provider, orchestrator) = setup().await;

    let err = orchestrator
        .distribute(DistributionRequest::native(
            vec![addr("alice").to_string(), addr("bob").to_string()],
            strings(&["1"]),
        ))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Batch(BatchError::ShapeMismatch {
            recipients: 2,
            amounts: 1
        })
    ));
    assert!(provider.tx_log().await.is_empty());
}

#[tokio::test]
async fn test_empty_batch_rejected() {
    let (provider, orchestrator) = setup().await;

    let err = orchestrator
        .distribute(DistributionRequest::native(Vec::new(), Vec::new()))
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::Batch(BatchError::EmptyBatch)));
    assert!(provider.tx_log().await.is_empty());
}

#[tokio::test]
async fn test_zero_and_malformed_recipients_rejected() {
    let (provider, orchestrator) = setup().await;

    for (bad, index) in [
        (Address::zero().to_string(), 1),
        ("0x1234".to_string(), 1),
        ("not-an-address".to_string(), 1),
    ] {
        let err = orchestrator
            .distribute(DistributionRequest::native(
                vec![addr("alice").to_string(), bad.clone()],
                strings(&["1", "1"]),
            ))
            .await
            .unwrap_err();

        match err {
            OrchestratorError::Batch(BatchError::InvalidRecipient { index: i, value }) => {
                assert_eq!(i, index);
                assert_eq!(value, bad);
            }
            other => panic!("unexpected error for {bad}: {other}"),
        }
    }

    assert!(provider.tx_log().await.is_empty());
    assert_nothing_moved(&provider, &["alice"]).await;
}

#[tokio::test]
async fn test_non_positive_and_malformed_amounts_rejected() {
    let (provider, orchestrator) = setup().await;

    for bad in ["0", "-1", "abc", "1.2.3", ""] {
        let err = orchestrator
            .distribute(DistributionRequest::native(
                vec![addr("alice").to_string()],
                strings(&[bad]),
            ))
            .await
            .unwrap_err();

        assert!(
            matches!(
                err,
                OrchestratorError::Batch(BatchError::InvalidAmount { index: 0, .. })
            ),
            "amount {bad:?} was accepted"
        );
    }

    assert!(provider.tx_log().await.is_empty());
}

#[tokio::test]
async fn test_amount_below_smallest_unit_rejected() {
    let (_provider, orchestrator) = setup().await;

    let err = orchestrator
        .distribute(DistributionRequest::native(
            vec![addr("alice").to_string()],
            strings(&["0.0000000000000000001"]),
        ))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Batch(BatchError::InvalidAmount { .. })
    ));
}

#[tokio::test]
async fn test_amount_overflow_rejected() {
    let (_provider, orchestrator) = setup().await;

    // 10^21 whole units do not fit in 128 bits at 18 decimals
    let err = orchestrator
        .distribute(DistributionRequest::native(
            vec![addr("alice").to_string()],
            strings(&["1000000000000000000000"]),
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Batch(BatchError::InvalidAmount { .. })
    ));

    // each item fits, the total does not
    let err = orchestrator
        .distribute(DistributionRequest::native(
            vec![addr("alice").to_string(), addr("bob").to_string()],
            strings(&["200000000000000000000", "200000000000000000000"]),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Batch(BatchError::Overflow)));
}

// ==================== Funding Attack Tests ====================

#[tokio::test]
async fn test_underfunded_native_call_reverts() {
    let (provider, _orchestrator) = setup().await;
    let batch = Batch::new(
        vec![
            LineItem::new(addr("alice"), 10),
            LineItem::new(addr("bob"), 5),
        ],
        100,
    )
    .unwrap();

    let receipt = provider
        .submit(
            &SettlementCall::DistributeNative { batch },
            &CallContext {
                from: addr("owner"),
                to: provider.engine_address().clone(),
                value: Uint128::new(10),
            },
            &limits(),
        )
        .await
        .unwrap();

    assert!(!receipt.success);
    assert_eq!(
        receipt.revert_reason,
        Some(RevertReason::InsufficientFunding {
            required: Uint128::new(15),
            provided: Uint128::new(10),
        })
    );
    assert_nothing_moved(&provider, &["alice", "bob"]).await;
}

#[tokio::test]
async fn test_distribution_above_sender_balance_reverts() {
    let (provider, orchestrator) = setup().await;

    let outcome = orchestrator
        .distribute(DistributionRequest::native(
            vec![addr("alice").to_string()],
            strings(&["150"]),
        ))
        .await
        .unwrap();

    assert_eq!(outcome.status, DistributionStatus::Reverted);
    assert_eq!(
        outcome.revert_reason.as_ref().map(|r| r.kind()),
        Some("insufficient_balance")
    );
    assert_nothing_moved(&provider, &["alice"]).await;
}

#[tokio::test]
async fn test_asset_call_without_allowance_reverts() {
    let (provider, _orchestrator) = setup().await;
    let token = addr("usd-token");
    provider
        .deploy_token(&token, TokenBehavior::Standard, 6)
        .await;
    provider
        .mint(&token, &addr("owner"), Uint128::new(10_000))
        .await
        .unwrap();

    let batch = Batch::new(vec![LineItem::new(addr("alice"), 3000)], 100).unwrap();
    let receipt = provider
        .submit(
            &SettlementCall::DistributeAsset {
                asset: token.clone(),
                batch,
            },
            &CallContext {
                from: addr("owner"),
                to: provider.engine_address().clone(),
                value: Uint128::zero(),
            },
            &limits(),
        )
        .await
        .unwrap();

    assert!(!receipt.success);
    assert_eq!(
        receipt.revert_reason.map(|r| r.kind()),
        Some("insufficient_authorization")
    );
    assert_eq!(
        provider.token_balance(&token, &addr("owner")).await.unwrap(),
        Uint128::new(10_000)
    );
}

#[tokio::test]
async fn test_native_value_on_asset_call_reverts() {
    let (provider, _orchestrator) = setup().await;
    let token = addr("usd-token");
    provider
        .deploy_token(&token, TokenBehavior::Standard, 6)
        .await;

    let batch = Batch::new(vec![LineItem::new(addr("alice"), 1)], 100).unwrap();
    let receipt = provider
        .submit(
            &SettlementCall::DistributeAsset { asset: token, batch },
            &CallContext {
                from: addr("owner"),
                to: provider.engine_address().clone(),
                value: Uint128::new(ONE),
            },
            &limits(),
        )
        .await
        .unwrap();

    assert!(!receipt.success);
    assert_nothing_moved(&provider, &["alice"]).await;
}

// ==================== Execution Limit Tests ====================

#[tokio::test]
async fn test_cost_limit_override_below_execution_reverts() {
    let (provider, orchestrator) = setup().await;

    let outcome = orchestrator
        .distribute(
            DistributionRequest::native(vec![addr("alice").to_string()], strings(&["1"]))
                .with_overrides(TxOverrides {
                    price_override: None,
                    limit_override: Some(1_000),
                }),
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, DistributionStatus::Reverted);
    assert!(matches!(
        outcome.revert_reason,
        Some(RevertReason::OutOfResources { limit: 1_000, .. })
    ));
    assert_nothing_moved(&provider, &["alice"]).await;
}

// ==================== Misrouted Call Tests ====================

#[tokio::test]
async fn test_call_to_impostor_engine_reverts() {
    let (provider, _orchestrator) = setup().await;
    let batch = Batch::new(vec![LineItem::new(addr("alice"), 1)], 100).unwrap();

    let receipt = provider
        .submit(
            &SettlementCall::DistributeNative { batch },
            &CallContext {
                from: addr("owner"),
                to: addr("impostor"),
                value: Uint128::new(1),
            },
            &limits(),
        )
        .await
        .unwrap();

    assert!(!receipt.success);
    assert_eq!(receipt.revert_reason.map(|r| r.kind()), Some("other"));
    assert_nothing_moved(&provider, &["alice", "impostor"]).await;
}

#[tokio::test]
async fn test_unknown_sender_cannot_submit() {
    let (provider, _orchestrator) = setup().await;
    let batch = Batch::new(vec![LineItem::new(addr("alice"), 1)], 100).unwrap();

    let err = provider
        .submit(
            &SettlementCall::DistributeNative { batch },
            &CallContext {
                from: addr("mallory"),
                to: provider.engine_address().clone(),
                value: Uint128::new(1),
            },
            &limits(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::UnknownAccount(_)));
    assert!(provider.tx_log().await.is_empty());
}

#[tokio::test]
async fn test_closed_session_refuses_work() {
    let (provider, orchestrator) = setup().await;
    orchestrator.session().close();

    let err = orchestrator
        .distribute(DistributionRequest::native(
            vec![addr("alice").to_string()],
            strings(&["1"]),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::SessionClosed));
    assert!(provider.tx_log().await.is_empty());
}
