use std::sync::Arc;
use std::time::Duration;

use chefchain_pos::api::{ApiCall, MockApi};
use chefchain_pos::kitchen::{KitchenPoller, PollEvent};
use chefchain_pos::models::{Order, OrderStatus};
use tokio::sync::watch;

fn order(id: u64) -> Order {
    Order {
        id,
        customer: None,
        table_number: Some("2".to_string()),
        order_type: Default::default(),
        status: OrderStatus::Pending,
        created_at: None,
        order_items: Vec::new(),
    }
}

fn polls(api: &MockApi) -> usize {
    api.count(|c| matches!(c, ApiCall::Orders))
}

#[tokio::test(start_paused = true)]
async fn test_polls_every_thirty_seconds() {
    let api = MockApi::new().with_orders(vec![order(1), order(2)]);
    let (_auth_tx, auth_rx) = watch::channel(true);
    let (stop_tx, stop_rx) = watch::channel(false);
    let (handle, mut events) =
        KitchenPoller::new(Arc::new(api.clone()), Duration::from_secs(30)).spawn(auth_rx, stop_rx);

    for _ in 0..3 {
        match events.recv().await {
            Some(PollEvent::Refreshed(board)) => assert_eq!(board.orders().len(), 2),
            other => panic!("expected refresh, got {:?}", other),
        }
    }

    let times: Vec<_> = api.recorded().iter().map(|r| r.at).collect();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1] - times[0], Duration::from_secs(30));
    assert_eq!(times[2] - times[1], Duration::from_secs(30));

    stop_tx.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_no_polling_while_signed_out() {
    let api = MockApi::new().with_orders(vec![order(1)]);
    let (auth_tx, auth_rx) = watch::channel(false);
    let (stop_tx, stop_rx) = watch::channel(false);
    let (handle, mut events) =
        KitchenPoller::new(Arc::new(api.clone()), Duration::from_secs(30)).spawn(auth_rx, stop_rx);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(polls(&api), 0);

    auth_tx.send(true).unwrap();
    assert!(matches!(events.recv().await, Some(PollEvent::Refreshed(_))));
    assert_eq!(polls(&api), 1);

    stop_tx.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_rejected_token_pauses_polling() {
    let api = MockApi::new();
    api.fail_orders(401, r#"{"detail": "Given token not valid for any token type"}"#);
    let (_auth_tx, auth_rx) = watch::channel(true);
    let (stop_tx, stop_rx) = watch::channel(false);
    let (handle, mut events) =
        KitchenPoller::new(Arc::new(api.clone()), Duration::from_secs(30)).spawn(auth_rx, stop_rx);

    assert!(matches!(events.recv().await, Some(PollEvent::AuthExpired)));

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(polls(&api), 1);

    stop_tx.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_server_errors_keep_polling() {
    let api = MockApi::new();
    api.fail_orders(500, "");
    let (_auth_tx, auth_rx) = watch::channel(true);
    let (stop_tx, stop_rx) = watch::channel(false);
    let (handle, mut events) =
        KitchenPoller::new(Arc::new(api.clone()), Duration::from_secs(30)).spawn(auth_rx, stop_rx);

    match events.recv().await {
        Some(PollEvent::Failed(message)) => assert_eq!(message, "HTTP error! status: 500"),
        other => panic!("expected failure, got {:?}", other),
    }

    api.clear_failures();
    assert!(matches!(events.recv().await, Some(PollEvent::Refreshed(_))));
    assert_eq!(polls(&api), 2);

    stop_tx.send(true).unwrap();
    handle.await.unwrap();
}
