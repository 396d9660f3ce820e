//! Application-level cycle tests.
//!
//! Covers:
//! - Bundled config file
//! - Full ladder on a balanced account, then a quiet steady state
//! - Inventory limits on spot and perp
//! - Foreign orders sharing the per-side cap

mod integration;
use integration::common::fixtures::{app_config, mock_gateway, orders_on, run_for};

use chrono::Utc;
use ladder_bot::{AppConfig, AppError, Application};
use ladder_core::{Balances, LiveOrder, MarketType, OrderId, OrderSide, Price, Size};
use ladder_executor::GatewayCall;
use ladder_telemetry::Metrics;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

#[test]
fn test_bundled_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml");
    let config = AppConfig::from_file(path).unwrap();

    assert_eq!(config.strategy.tier_count(), 5);
    assert_eq!(config.strategy.market_type, MarketType::Spot);
    assert_eq!(config.instrument().to_string(), "spot:@142");
    assert_eq!(config.strategy.tick_size, Some(dec!(1)));
    assert_eq!(config.venue.candle_coin, None);
}

#[test]
fn test_invalid_config_refuses_to_start() {
    let mut config = app_config();
    config.strategy.sell_spreads = vec![dec!(0.002), dec!(0.001)];
    let gw = mock_gateway(Balances::new(dec!(0.05), dec!(5000)));

    let result = Application::with_gateway(config.clone(), gw);
    assert!(matches!(result, Err(AppError::Config(_))));

    // The venue-backed constructor goes through the same check.
    let result = Application::new(config);
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test]
async fn test_taken_metrics_port_fails_before_first_cycle() {
    let taken = ladder_telemetry::bind_metrics(0).await.unwrap();
    let mut config = app_config();
    config.telemetry.metrics_port = taken.local_addr().unwrap().port();
    let gw = mock_gateway(Balances::new(dec!(0.05), dec!(5000)));
    let app = Application::with_gateway(config, gw.clone()).unwrap();

    let result = app.run_until(CancellationToken::new()).await;

    assert!(matches!(result, Err(AppError::Telemetry(_))));
    assert_eq!(gw.call_count(GatewayCall::MidPrice), 0);
}

#[tokio::test(start_paused = true)]
async fn test_balanced_account_gets_full_ladder_then_holds() {
    let gw = mock_gateway(Balances::new(dec!(0.05), dec!(5000)));
    let app = Application::with_gateway(app_config(), gw.clone()).unwrap();

    // Ticks at 0s, 60s, 120s.
    tokio_test::assert_ok!(run_for(app, 150).await);

    let orders = gw.open_orders();
    let bids = orders_on(&orders, OrderSide::Buy);
    let asks = orders_on(&orders, OrderSide::Sell);
    assert_eq!(bids.len(), 5);
    assert_eq!(asks.len(), 5);
    assert!(bids.iter().all(|o| o.price.inner() < dec!(100000)));
    assert!(asks.iter().all(|o| o.price.inner() > dec!(100000)));

    // Later cycles keep everything in place.
    assert_eq!(gw.call_count(GatewayCall::MidPrice), 3);
    assert_eq!(gw.call_count(GatewayCall::Place), 10);
    assert_eq!(gw.call_count(GatewayCall::Cancel), 0);

    let text = Metrics::render().unwrap();
    assert!(text.contains("ladder_cycles_total{outcome=\"completed\"}"));
    assert!(text.contains("ladder_orders_placed_total{side=\"buy\"}"));
}

#[tokio::test(start_paused = true)]
async fn test_coin_heavy_spot_account_only_sells() {
    // 0.08 BTC at 100000 = 8000 of a 10000 portfolio, above max_coin_ratio 0.7.
    let gw = mock_gateway(Balances::new(dec!(0.08), dec!(2000)));
    let app = Application::with_gateway(app_config(), gw.clone()).unwrap();

    run_for(app, 30).await.unwrap();

    let orders = gw.open_orders();
    assert!(orders_on(&orders, OrderSide::Buy).is_empty());
    assert_eq!(orders_on(&orders, OrderSide::Sell).len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_empty_spot_wallet_places_nothing() {
    let gw = mock_gateway(Balances::default());
    let app = Application::with_gateway(app_config(), gw.clone()).unwrap();

    run_for(app, 30).await.unwrap();

    assert!(gw.open_orders().is_empty());
    assert_eq!(gw.call_count(GatewayCall::Place), 0);
}

#[tokio::test(start_paused = true)]
async fn test_perp_at_long_limit_only_sells() {
    let mut config = app_config();
    config.strategy.market_type = MarketType::Perp;
    config.venue.symbol = "BTC".to_string();
    config.venue.coin = "BTC".to_string();
    // 0.1 BTC long at 100000 = 10000, the default max_position_usd.
    let gw = mock_gateway(Balances::new(dec!(0.1), dec!(20000)));
    let app = Application::with_gateway(config, gw.clone()).unwrap();

    run_for(app, 30).await.unwrap();

    let orders = gw.open_orders();
    assert!(orders_on(&orders, OrderSide::Buy).is_empty());
    assert_eq!(orders_on(&orders, OrderSide::Sell).len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_foreign_order_left_alone_and_counts_toward_cap() {
    let gw = mock_gateway(Balances::new(dec!(0.05), dec!(5000)));
    let manual = LiveOrder {
        order_id: OrderId(500),
        side: OrderSide::Buy,
        price: Price::new(dec!(95000)),
        size: Size::new(dec!(0.001)),
        placed_at: Utc::now(),
        client_tag: None,
    };
    gw.insert_order(manual);
    let app = Application::with_gateway(app_config(), gw.clone()).unwrap();

    run_for(app, 30).await.unwrap();

    let orders = gw.open_orders();
    let bids = orders_on(&orders, OrderSide::Buy);
    assert_eq!(bids.len(), 5);
    assert!(bids.iter().any(|o| o.order_id == OrderId(500)));
    assert_eq!(orders_on(&orders, OrderSide::Sell).len(), 5);
    assert_eq!(gw.call_count(GatewayCall::Cancel), 0);
}
