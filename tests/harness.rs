#![allow(non_snake_case)]

use pixel_painter::{
    Address,
    ChainConnection,
    Coordinate,
    LocalStateCache,
    PaintEvent,
    PixelPainter,
    ReceiptStatus,
    StatusKind,
    SubmitOutcome,
    SubmitPhase,
    WalletNotification,
    provider::ProviderError,
    test_helpers::{
        FakeWalletProvider,
        account,
        connected_painter,
        connected_painter_with_config,
        test_config,
    },
};
use std::time::Duration;
use tokio::{
    task::yield_now,
    time::advance,
};

#[tokio::test]
async fn submit__success_reconciles_the_cell_and_publishes_success() {
    // given
    let (painter, _provider, contract) = connected_painter().await;

    // when
    let outcome = painter.submit(12, 34, "#FF8800").await;

    // then
    assert_eq!(outcome, SubmitOutcome::Confirmed);
    assert_eq!(painter.phase(), SubmitPhase::Confirmed);
    assert_eq!(contract.paint_calls(), 1);

    let record = painter
        .pixels()
        .get(&Coordinate::new(12, 34).unwrap().key())
        .cloned()
        .unwrap();
    assert_eq!(record.color, "#FF8800");
    assert_eq!(record.painter, account(1));
    assert!(record.tx_hash.is_some());
    assert_eq!(record.contract, Some(test_config().contract_address));

    let status = painter.status().current().unwrap();
    assert_eq!(status.kind, StatusKind::Success);
    assert_eq!(status.message, "Pixel painted successfully!");
}

#[tokio::test]
async fn submit__second_call_while_one_is_in_flight_is_rejected_silently() {
    // given a contract that parks the first submission at the wallet prompt
    let (painter, _provider, contract) = connected_painter().await;
    contract.hold_confirmations();

    // when a second submit races the held first one
    let concurrent = painter.clone();
    let releaser = contract.clone();
    let (first, second) = tokio::join!(painter.submit(1, 1, "#111111"), async move {
        yield_now().await;
        let outcome = concurrent.submit(2, 2, "#222222").await;
        let status_during = concurrent.status().current();
        releaser.release_confirmations();
        (outcome, status_during)
    });

    // then the second call changed nothing and the first still confirmed
    let (second_outcome, status_during) = second;
    assert_eq!(second_outcome, SubmitOutcome::Rejected);
    assert_eq!(
        status_during.unwrap().message,
        "Please confirm the transaction in your wallet..."
    );
    assert_eq!(first, SubmitOutcome::Confirmed);
    assert_eq!(contract.paint_calls(), 1);
}

#[tokio::test]
async fn submit__zero_address_target_fails_without_touching_the_payable() {
    // given a client configured without a deployment
    let mut config = test_config();
    config.contract_address = Address::ZERO;
    let (painter, _provider, contract) = connected_painter_with_config(config).await;

    // when
    let outcome = painter.submit(0, 0, "#123456").await;

    // then
    assert_eq!(outcome, SubmitOutcome::Failed);
    assert_eq!(contract.paint_calls(), 0);
    let status = painter.status().current().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(
        status.message,
        "Smart contract not deployed. Please deploy the contract first."
    );
}

#[tokio::test]
async fn refresh_fee__zero_address_target_quotes_zero_and_flags_not_deployed() {
    // given
    let mut config = test_config();
    config.contract_address = Address::ZERO;
    let (painter, _provider, _contract) = connected_painter_with_config(config).await;

    // when
    let quote = painter.refresh_fee().await.unwrap();

    // then
    assert_eq!(quote.wei, 0);
    assert!(!quote.deployed);
    assert_eq!(painter.fee_display().as_deref(), Some("0"));
    let status = painter.status().current().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
}

#[tokio::test]
async fn submit__fee_read_failure_reports_fee_unavailable() {
    // given
    let (painter, _provider, contract) = connected_painter().await;
    contract.set_fee_error(ProviderError::new("network request failed"));

    // when
    let outcome = painter.submit(5, 5, "#FFFFFF").await;

    // then
    assert_eq!(outcome, SubmitOutcome::Failed);
    assert_eq!(contract.paint_calls(), 0);
    assert_eq!(
        painter.status().current().unwrap().message,
        "Could not get painting fee. Contract may not be deployed."
    );
}

#[tokio::test]
async fn submit__wallet_rejection_is_classified_and_published() {
    // given
    let (painter, _provider, contract) = connected_painter().await;
    contract.set_paint_error(ProviderError::new("User denied transaction signature.").with_code(4001));

    // when
    let outcome = painter.submit(5, 5, "#FFFFFF").await;

    // then
    assert_eq!(outcome, SubmitOutcome::Failed);
    assert_eq!(
        painter.status().current().unwrap().message,
        "Transaction rejected by user"
    );
    assert!(!painter.is_pending());
}

#[tokio::test]
async fn submit__reverted_receipt_fails_with_transaction_failed() {
    // given
    let (painter, _provider, contract) = connected_painter().await;
    contract.set_receipt_status(ReceiptStatus::Reverted);

    // when
    let outcome = painter.submit(9, 9, "#000000").await;

    // then
    assert_eq!(outcome, SubmitOutcome::Failed);
    assert_eq!(painter.phase(), SubmitPhase::Failed);
    assert_eq!(painter.status().current().unwrap().message, "Transaction failed");
    assert!(painter.pixels().is_empty());
}

#[tokio::test]
async fn submit__after_disconnect_is_rejected_silently() {
    // given
    let (painter, _provider, _contract) = connected_painter().await;
    painter.connection().disconnect();

    // when
    let outcome = painter.submit(1, 2, "#ABCDEF").await;

    // then
    assert_eq!(outcome, SubmitOutcome::Rejected);
    assert_eq!(painter.status().current(), None);
}

#[tokio::test]
async fn submit__off_grid_coordinate_is_rejected_silently() {
    // given
    let (painter, _provider, contract) = connected_painter().await;

    // when
    let outcome = painter.submit(100, 0, "#ABCDEF").await;

    // then
    assert_eq!(outcome, SubmitOutcome::Rejected);
    assert_eq!(contract.paint_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn submit__success_status_expires_and_phase_returns_to_idle() {
    // given
    let (painter, _provider, _contract) = connected_painter().await;
    painter.submit(3, 3, "#00FF00").await;
    assert_eq!(painter.phase(), SubmitPhase::Confirmed);

    // when five seconds of simulated time pass
    advance(Duration::from_millis(5_001)).await;
    yield_now().await;

    // then the status is gone and the machine reads idle again
    assert_eq!(painter.status().current(), None);
    assert_eq!(painter.phase(), SubmitPhase::Idle);
}

#[tokio::test]
async fn notification_listener__drives_disconnect_and_network_round_trip() {
    // given a connected session with the listener running
    let provider = FakeWalletProvider::on_target_chain(vec![account(1)]);
    let connection = ChainConnection::new(Some(provider.clone()), test_config());
    let _listener = connection.spawn_notification_listener();
    connection.connect().await.unwrap();

    // when the wallet hops to a foreign network
    provider.emit(WalletNotification::ChainChanged(1));
    yield_now().await;

    // then the session degrades but keeps the account
    let state = connection.state();
    assert!(!state.connected);
    assert_eq!(state.account, Some(account(1)));
    assert!(state.error.is_some());

    // when the wallet comes back
    provider.emit(WalletNotification::ChainChanged(test_config().chain.chain_id));
    yield_now().await;

    // then the session recovers without a new prompt
    let state = connection.state();
    assert!(state.connected);
    assert_eq!(state.error, None);

    // when every account is revoked
    provider.emit(WalletNotification::AccountsChanged(vec![]));
    yield_now().await;

    // then the session is fully reset
    assert!(!connection.is_connected());
    assert_eq!(connection.account(), None);
}

#[tokio::test]
async fn event_listener__applies_external_paints_to_the_cache() {
    // given
    let (painter, _provider, contract) = connected_painter().await;
    let _listener = painter.spawn_event_listener();

    // when someone else paints a cell
    let cell = Coordinate::new(42, 7).unwrap();
    contract.emit_paint(PaintEvent {
        coordinate: cell,
        color: "#C0FFEE".to_owned(),
        painter: account(9),
    });
    yield_now().await;

    // then the cache reflects it without transaction metadata
    let record = painter.pixels().get(&cell.key()).cloned().unwrap();
    assert_eq!(record.color, "#C0FFEE");
    assert_eq!(record.painter, account(9));
    assert_eq!(record.tx_hash, None);
}

#[tokio::test]
async fn load_all__fills_the_cache_from_a_seeded_contract() {
    // given a contract with two painted cells
    let (painter, _provider, contract) = connected_painter().await;
    contract.seed_pixel(Coordinate::new(0, 0).unwrap(), "#111111", account(3));
    contract.seed_pixel(Coordinate::new(99, 99).unwrap(), "#999999", account(4));

    // when
    let loaded = painter.load_all().await.unwrap();

    // then
    assert_eq!(loaded, 2);
    assert_eq!(painter.pixels().len(), 2);
    assert_eq!(contract.batch_calls(), 100);
}

#[tokio::test]
async fn painter__with_persistent_cache_survives_a_restart() {
    // given a painter writing through a sled store
    let dir = tempdir::TempDir::new("pixel-harness").unwrap();
    let store = pixel_painter::SledPixelStore::open(dir.path()).unwrap();
    {
        let provider = FakeWalletProvider::on_target_chain(vec![account(1)]);
        let connection = ChainConnection::new(Some(provider), test_config());
        connection.connect().await.unwrap();
        let painter =
            PixelPainter::with_cache(connection, LocalStateCache::with_store(store.clone()));
        assert_eq!(painter.submit(8, 8, "#8080FF").await, SubmitOutcome::Confirmed);
    }

    // when a fresh instance opens the same store
    let cache = LocalStateCache::with_store(store);

    // then the painted cell is back
    let record = cache.get(Coordinate::new(8, 8).unwrap()).unwrap();
    assert_eq!(record.color, "#8080FF");
}
