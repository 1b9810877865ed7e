mod common;

use rust_decimal::Decimal;

use polycabinet::db::{order_repo, position_repo};
use polycabinet::models::order::{order_status, order_type, stop_loss_order_id};
use polycabinet::services::trading::{self, TradeError};

use common::{seed_live_order, seed_position, seed_user, setup_test_db, MockGateway};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[tokio::test]
async fn market_sell_rejects_unknown_position() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-1").await;
    let gateway = MockGateway::new();

    let err = trading::market_sell(&pool, &gateway, &user, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::Rejected(msg) if msg == "Position not found"));
}

#[tokio::test]
async fn market_sell_rejects_empty_position() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-2").await;
    let gateway = MockGateway::new();

    let position = seed_position(&pool, user.id, "tok-e", Decimal::ZERO, dec("0.40")).await;
    let err = trading::market_sell(&pool, &gateway, &user, position.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::Rejected(msg) if msg.contains("no tokens")));
}

#[tokio::test]
async fn market_sell_rejects_when_no_bid_exists() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-3").await;
    let gateway = MockGateway::new();

    let position = seed_position(&pool, user.id, "tok-nobid", dec("10"), dec("0.40")).await;
    let err = trading::market_sell(&pool, &gateway, &user, position.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::Rejected(msg) if msg.contains("No bids")));
}

#[tokio::test]
async fn market_sell_rounds_to_tick_and_records_order() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-4").await;
    let gateway = MockGateway::new();

    let position = seed_position(&pool, user.id, "tok-sell", dec("12"), dec("0.40")).await;
    gateway.set_price("tok-sell", dec("0.637"));

    let outcome = trading::market_sell(&pool, &gateway, &user, position.id)
        .await
        .unwrap();
    let order_id = outcome.order_id.unwrap();

    let calls = gateway.sell_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].price, dec("0.64"));
    assert_eq!(calls[0].size, dec("12"));

    let recorded = order_repo::get_by_external_id(&pool, user.id, &order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(recorded.order_type, order_type::FOK);
    assert_eq!(recorded.side, "SELL");
    assert_eq!(recorded.position_id, Some(position.id));
}

#[tokio::test]
async fn take_profit_must_be_above_entry() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-5").await;
    let gateway = MockGateway::new();

    let position = seed_position(&pool, user.id, "tok-tp", dec("10"), dec("0.40")).await;
    let err = trading::set_take_profit(&pool, &gateway, &user, position.id, dec("0.40"))
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::Rejected(_)));
}

#[tokio::test]
async fn take_profit_places_order_and_replaces_previous() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-6").await;
    let gateway = MockGateway::new();

    let position = seed_position(&pool, user.id, "tok-tp2", dec("10"), dec("0.40")).await;

    trading::set_take_profit(&pool, &gateway, &user, position.id, dec("0.60"))
        .await
        .unwrap();
    let position = position_repo::get_position(&pool, position.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(position.take_profit_price, Some(dec("0.60")));
    let first_tp = position.tp_order_id.clone().unwrap();

    // Moving the TP cancels the old CLOB order first.
    trading::set_take_profit(&pool, &gateway, &user, position.id, dec("0.70"))
        .await
        .unwrap();
    assert_eq!(gateway.cancel_calls(), vec![first_tp]);

    let position = position_repo::get_position(&pool, position.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(position.take_profit_price, Some(dec("0.70")));
}

#[tokio::test]
async fn cancel_take_profit_clears_fields() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-7").await;
    let gateway = MockGateway::new();

    let position = seed_position(&pool, user.id, "tok-tp3", dec("10"), dec("0.40")).await;
    trading::set_take_profit(&pool, &gateway, &user, position.id, dec("0.60"))
        .await
        .unwrap();

    trading::cancel_take_profit(&pool, &gateway, &user, position.id)
        .await
        .unwrap();

    let position = position_repo::get_position(&pool, position.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(position.take_profit_price, None);
    assert_eq!(position.tp_order_id, None);
}

#[tokio::test]
async fn stop_loss_must_be_below_entry() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-8").await;

    let position = seed_position(&pool, user.id, "tok-sl", dec("10"), dec("0.40")).await;
    let err = trading::set_stop_loss(&pool, &user, position.id, dec("0.40"))
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::Rejected(_)));
}

#[tokio::test]
async fn stop_loss_creates_single_watch_order_across_rearms() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-9").await;

    let position = seed_position(&pool, user.id, "tok-sl2", dec("10"), dec("0.40")).await;

    trading::set_stop_loss(&pool, &user, position.id, dec("0.30"))
        .await
        .unwrap();
    trading::set_stop_loss(&pool, &user, position.id, dec("0.25"))
        .await
        .unwrap();

    let synthetic_id = stop_loss_order_id(position.id);
    let watch = order_repo::get_by_external_id(&pool, user.id, &synthetic_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(watch.order_type, order_type::STOP_LOSS);
    assert_eq!(watch.price, dec("0.25"));
    assert_eq!(watch.status, order_status::LIVE);

    let total = order_repo::count_user_orders(&pool, user.id, None).await.unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn remove_stop_loss_cancels_watch() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-10").await;

    let position = seed_position(&pool, user.id, "tok-sl3", dec("10"), dec("0.40")).await;
    trading::set_stop_loss(&pool, &user, position.id, dec("0.30"))
        .await
        .unwrap();

    trading::remove_stop_loss(&pool, &user, position.id)
        .await
        .unwrap();

    let position = position_repo::get_position(&pool, position.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(position.stop_loss_price, None);

    let watch = order_repo::get_by_external_id(&pool, user.id, &stop_loss_order_id(position.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(watch.status, order_status::CANCELLED);
}

#[tokio::test]
async fn editing_stop_loss_watch_mutates_price_in_place() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-11").await;
    let gateway = MockGateway::new();

    let position = seed_position(&pool, user.id, "tok-sl4", dec("10"), dec("0.40")).await;
    trading::set_stop_loss(&pool, &user, position.id, dec("0.30"))
        .await
        .unwrap();

    let watch = order_repo::get_by_external_id(&pool, user.id, &stop_loss_order_id(position.id))
        .await
        .unwrap()
        .unwrap();

    trading::edit_order(&pool, &gateway, &user, watch.id, dec("0.20"))
        .await
        .unwrap();

    // No exchange round-trip for synthetic orders.
    assert!(gateway.cancel_calls().is_empty());
    assert!(gateway.sell_calls().is_empty());

    let watch = order_repo::get_order(&pool, watch.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(watch.price, dec("0.20"));
    assert_eq!(watch.polymarket_order_id, stop_loss_order_id(position.id));

    let position = position_repo::get_position(&pool, position.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(position.stop_loss_price, Some(dec("0.20")));
}

#[tokio::test]
async fn edit_replaces_exchange_order_with_remaining_size() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-12").await;
    let gateway = MockGateway::new();

    let order = seed_live_order(
        &pool,
        user.id,
        "0xold",
        "tok-edit",
        order_type::GTC,
        dec("10"),
        dec("0.60"),
    )
    .await;
    sqlx::query("UPDATE orders SET size_filled = 4 WHERE id = $1")
        .bind(order.id)
        .execute(&pool)
        .await
        .unwrap();

    let outcome = trading::edit_order(&pool, &gateway, &user, order.id, dec("0.65"))
        .await
        .unwrap();

    assert_eq!(gateway.cancel_calls(), vec!["0xold".to_string()]);
    let calls = gateway.sell_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].size, dec("6"));
    assert_eq!(calls[0].price, dec("0.65"));

    let order = order_repo::get_order(&pool, order.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(Some(order.polymarket_order_id.clone()), outcome.order_id);
    assert_eq!(order.price, dec("0.65"));
    assert_eq!(order.size, dec("6"));
    assert_eq!(order.size_filled, Decimal::ZERO);
    assert_eq!(order.status, order_status::LIVE);
}

#[tokio::test]
async fn edit_aborts_when_cancel_fails() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-13").await;
    let gateway = MockGateway::new();
    gateway.fail_cancel_of("0xstuck");

    let order = seed_live_order(
        &pool,
        user.id,
        "0xstuck",
        "tok-edit2",
        order_type::GTC,
        dec("10"),
        dec("0.60"),
    )
    .await;

    let err = trading::edit_order(&pool, &gateway, &user, order.id, dec("0.65"))
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::Rejected(msg) if msg.contains("cancel")));

    // No replacement placed; ledger unchanged.
    assert!(gateway.sell_calls().is_empty());
    let order = order_repo::get_order(&pool, order.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.polymarket_order_id, "0xstuck");
    assert_eq!(order.price, dec("0.60"));
}

#[tokio::test]
async fn edit_of_fully_filled_order_settles_it() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-14").await;
    let gateway = MockGateway::new();

    let order = seed_live_order(
        &pool,
        user.id,
        "0xfull",
        "tok-edit3",
        order_type::GTC,
        dec("10"),
        dec("0.60"),
    )
    .await;
    sqlx::query("UPDATE orders SET size_filled = 10 WHERE id = $1")
        .bind(order.id)
        .execute(&pool)
        .await
        .unwrap();

    let err = trading::edit_order(&pool, &gateway, &user, order.id, dec("0.65"))
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::Rejected(msg) if msg.contains("filled")));

    let order = order_repo::get_order(&pool, order.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, order_status::MATCHED);
    assert!(gateway.sell_calls().is_empty());
}

#[tokio::test]
async fn cancelling_stop_loss_order_disarms_position() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-15").await;
    let gateway = MockGateway::new();

    let position = seed_position(&pool, user.id, "tok-c1", dec("10"), dec("0.40")).await;
    trading::set_stop_loss(&pool, &user, position.id, dec("0.30"))
        .await
        .unwrap();

    let watch = order_repo::get_by_external_id(&pool, user.id, &stop_loss_order_id(position.id))
        .await
        .unwrap()
        .unwrap();

    trading::cancel_order(&pool, &gateway, &user, watch.id)
        .await
        .unwrap();

    let position = position_repo::get_position(&pool, position.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(position.stop_loss_price, None);
    assert!(gateway.cancel_calls().is_empty());
}

#[tokio::test]
async fn cancelling_take_profit_order_clears_position_fields() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-16").await;
    let gateway = MockGateway::new();

    let position = seed_position(&pool, user.id, "tok-c2", dec("10"), dec("0.40")).await;
    trading::set_take_profit(&pool, &gateway, &user, position.id, dec("0.70"))
        .await
        .unwrap();

    let position = position_repo::get_position(&pool, position.id, user.id)
        .await
        .unwrap()
        .unwrap();
    let tp_id = position.tp_order_id.clone().unwrap();
    let tp_order = order_repo::get_by_external_id(&pool, user.id, &tp_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tp_order.order_type, order_type::TAKE_PROFIT);

    trading::cancel_order(&pool, &gateway, &user, tp_order.id)
        .await
        .unwrap();
    assert!(gateway.cancel_calls().contains(&tp_id));

    let position = position_repo::get_position(&pool, position.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(position.take_profit_price, None);
    assert_eq!(position.tp_order_id, None);
}

#[tokio::test]
async fn cancel_of_live_exchange_order_marks_cancelled() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xtrade-17").await;
    let gateway = MockGateway::new();

    let order = seed_live_order(
        &pool,
        user.id,
        "0xcancel-me",
        "tok-c3",
        order_type::GTC,
        dec("5"),
        dec("0.55"),
    )
    .await;

    trading::cancel_order(&pool, &gateway, &user, order.id)
        .await
        .unwrap();

    assert_eq!(gateway.cancel_calls(), vec!["0xcancel-me".to_string()]);
    let order = order_repo::get_order(&pool, order.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, order_status::CANCELLED);

    // Terminal orders cannot be cancelled again.
    let err = trading::cancel_order(&pool, &gateway, &user, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::Rejected(_)));
}
