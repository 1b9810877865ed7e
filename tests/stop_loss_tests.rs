mod common;

use rust_decimal::Decimal;

use polycabinet::db::{order_repo, position_repo};
use polycabinet::models::order::{order_status, order_type, stop_loss_order_id};
use polycabinet::services::{stop_loss_monitor, trading};

use common::{seed_bare_user, seed_position, seed_user, setup_test_db, MockGateway};

/// Arm a stop loss on a fresh position through the trading service, so the
/// watch order exists exactly as production creates it.
async fn armed_position(
    pool: &sqlx::PgPool,
    user: &polycabinet::models::User,
    token_id: &str,
    size: i64,
    avg: &str,
    stop: &str,
) -> polycabinet::models::Position {
    let position =
        seed_position(pool, user.id, token_id, Decimal::from(size), avg.parse().unwrap()).await;
    trading::set_stop_loss(pool, user, position.id, stop.parse().unwrap())
        .await
        .unwrap();

    position_repo::get_position(pool, position.id, user.id)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn trigger_fires_once_below_threshold() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xsl-1").await;
    let gateway = MockGateway::new();

    let position = armed_position(&pool, &user, "tok-sl1", 20, "0.40", "0.30").await;
    gateway.set_price("tok-sl1", "0.29".parse().unwrap());

    let fired = stop_loss_monitor::run_stop_loss_sweep(&pool, &gateway)
        .await
        .unwrap();
    assert_eq!(fired, 1);
    assert_eq!(gateway.sell_calls().len(), 1);

    // Trigger disarmed and watch settled.
    let position = position_repo::get_position(&pool, position.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(position.stop_loss_price, None);

    let watch = order_repo::get_by_external_id(&pool, user.id, &stop_loss_order_id(position.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(watch.status, order_status::MATCHED);
    assert_eq!(watch.size_filled, watch.size);

    // A second sweep finds nothing armed.
    let fired = stop_loss_monitor::run_stop_loss_sweep(&pool, &gateway)
        .await
        .unwrap();
    assert_eq!(fired, 0);
    assert_eq!(gateway.sell_calls().len(), 1);
}

#[tokio::test]
async fn trigger_fires_exactly_at_threshold() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xsl-2").await;
    let gateway = MockGateway::new();

    armed_position(&pool, &user, "tok-sl2", 10, "0.50", "0.30").await;
    gateway.set_price("tok-sl2", "0.30".parse().unwrap());

    let fired = stop_loss_monitor::run_stop_loss_sweep(&pool, &gateway)
        .await
        .unwrap();
    assert_eq!(fired, 1);
}

#[tokio::test]
async fn rearming_after_trigger_revives_watch_order() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xsl-8").await;
    let gateway = MockGateway::new();

    let position = armed_position(&pool, &user, "tok-rearm", 10, "0.50", "0.30").await;
    gateway.set_price("tok-rearm", "0.29".parse().unwrap());

    stop_loss_monitor::run_stop_loss_sweep(&pool, &gateway)
        .await
        .unwrap();

    // Arming again reuses the settled watch row instead of creating a second one.
    trading::set_stop_loss(&pool, &user, position.id, "0.20".parse().unwrap())
        .await
        .unwrap();

    let watch = order_repo::get_by_external_id(&pool, user.id, &stop_loss_order_id(position.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(watch.status, order_status::LIVE);
    assert_eq!(watch.price, "0.20".parse().unwrap());
    assert_eq!(watch.size_filled, Decimal::ZERO);

    let position = position_repo::get_position(&pool, position.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(position.stop_loss_price, Some("0.20".parse().unwrap()));
}

#[tokio::test]
async fn no_action_above_threshold() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xsl-3").await;
    let gateway = MockGateway::new();

    let position = armed_position(&pool, &user, "tok-sl3", 10, "0.50", "0.30").await;
    gateway.set_price("tok-sl3", "0.31".parse().unwrap());

    let fired = stop_loss_monitor::run_stop_loss_sweep(&pool, &gateway)
        .await
        .unwrap();
    assert_eq!(fired, 0);
    assert!(gateway.sell_calls().is_empty());

    let position = position_repo::get_position(&pool, position.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(position.stop_loss_price, Some("0.30".parse().unwrap()));
}

#[tokio::test]
async fn unpriced_token_is_skipped() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xsl-4").await;
    let gateway = MockGateway::new();

    armed_position(&pool, &user, "tok-sl4", 10, "0.50", "0.30").await;
    // No price loaded for the token.

    let fired = stop_loss_monitor::run_stop_loss_sweep(&pool, &gateway)
        .await
        .unwrap();
    assert_eq!(fired, 0);
}

#[tokio::test]
async fn one_failed_sell_does_not_block_others() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xsl-5").await;
    let gateway = MockGateway::new();

    let failing = armed_position(&pool, &user, "tok-fail", 10, "0.50", "0.30").await;
    let healthy = armed_position(&pool, &user, "tok-ok", 10, "0.50", "0.30").await;

    gateway.set_price("tok-fail", "0.20".parse().unwrap());
    gateway.set_price("tok-ok", "0.20".parse().unwrap());
    gateway.fail_sells_for("tok-fail");

    let fired = stop_loss_monitor::run_stop_loss_sweep(&pool, &gateway)
        .await
        .unwrap();
    assert_eq!(fired, 1);

    // The failed position stays armed for the next sweep.
    let failing = position_repo::get_position(&pool, failing.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failing.stop_loss_price, Some("0.30".parse().unwrap()));

    let healthy = position_repo::get_position(&pool, healthy.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(healthy.stop_loss_price, None);
}

#[tokio::test]
async fn missing_signing_key_leaves_trigger_armed() {
    let pool = setup_test_db().await;
    let user = seed_bare_user(&pool, "0xsl-6").await;
    let gateway = MockGateway::new();

    let position =
        seed_position(&pool, user.id, "tok-nokey", Decimal::from(10), "0.50".parse().unwrap())
            .await;
    trading::set_stop_loss(&pool, &user, position.id, "0.30".parse().unwrap())
        .await
        .unwrap();
    gateway.set_price("tok-nokey", "0.10".parse().unwrap());

    let fired = stop_loss_monitor::run_stop_loss_sweep(&pool, &gateway)
        .await
        .unwrap();
    assert_eq!(fired, 0);
    assert!(gateway.sell_calls().is_empty());

    let position = position_repo::get_position(&pool, position.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(position.stop_loss_price, Some("0.30".parse().unwrap()));
}

#[tokio::test]
async fn triggered_sell_goes_out_at_full_size_and_current_bid() {
    let pool = setup_test_db().await;
    let user = seed_user(&pool, "0xsl-7").await;
    let gateway = MockGateway::new();

    armed_position(&pool, &user, "tok-full", 50, "0.40", "0.35").await;
    gateway.set_price("tok-full", "0.33".parse().unwrap());

    stop_loss_monitor::run_stop_loss_sweep(&pool, &gateway)
        .await
        .unwrap();

    let calls = gateway.sell_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].token_id, "tok-full");
    assert_eq!(calls[0].price, "0.33".parse().unwrap());
    assert_eq!(calls[0].size, Decimal::from(50));

    // The executed sell is visible in the ledger as a new order.
    let (_, matched, _) = order_repo::count_by_statuses(&pool, user.id).await.unwrap();
    assert_eq!(matched, 1); // the settled watch
    let fok = order_repo::get_by_external_id(&pool, user.id, "0xmockorder0")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fok.order_type, order_type::FOK);
}
