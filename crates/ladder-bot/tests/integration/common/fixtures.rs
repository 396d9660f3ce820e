//! Shared setup for application-level tests.

use std::sync::Arc;
use std::time::Duration;

use ladder_bot::{AppConfig, AppResult, Application};
use ladder_core::{Balances, Candle, LiveOrder, OrderSide, Price};
use ladder_executor::MockGateway;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

/// Config with the exporter off and the default 5-tier ladder.
pub fn app_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.telemetry.metrics_port = 0;
    config.venue.symbol = "@142".to_string();
    config.venue.coin = "UBTC".to_string();
    config
}

/// Bars with ATR 100 around 100000, i.e. a neutral multiplier.
pub fn calm_candles(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            Candle::new(
                i as u64 * 300_000,
                dec!(100000),
                dec!(100050),
                dec!(99950),
                dec!(100000),
            )
        })
        .collect()
}

/// Mock venue at a 100000 mid with the given balances.
pub fn mock_gateway(balances: Balances) -> Arc<MockGateway> {
    let gw = Arc::new(MockGateway::new());
    gw.set_mid_price(Price::new(dec!(100000)));
    gw.set_candles(calm_candles(30));
    gw.set_balances(balances);
    gw
}

/// Run the application for `secs` of (paused) tokio time.
pub async fn run_for(app: Application, secs: u64) -> AppResult<()> {
    let token = CancellationToken::new();
    let stopper = token.clone();
    let stop = async move {
        tokio::time::sleep(Duration::from_secs(secs)).await;
        stopper.cancel();
    };
    let (result, ()) = tokio::join!(app.run_until(token), stop);
    result
}

pub fn orders_on(orders: &[LiveOrder], side: OrderSide) -> Vec<LiveOrder> {
    orders.iter().filter(|o| o.side == side).cloned().collect()
}
