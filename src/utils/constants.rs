/// Defaults for the trading service under test
///
/// Mirrors how the service is deployed: Flask API on port 5001, JSONL logs
/// under `logs/`, six USDT pairs tracked.

use crate::core::endpoint::{EndpointSpec, ShapeTag};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5001";
pub const DEFAULT_LOGS_DIR: &str = "logs";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_MARKET_MAX_AGE_SECS: u64 = 60;

/// Candle timeframe whose emptiness marks a broken market data pipeline
pub const DEFAULT_HIGH_TIMEFRAME: &str = "4h";

/// Page size requested from the recent-signals/trades endpoints
pub const DEFAULT_LIST_LIMIT: &str = "50";

pub const TRACKED_SYMBOLS: &[&str] = &[
    "BTC-USDT",
    "ETH-USDT",
    "SOL-USDT",
    "BNB-USDT",
    "XRP-USDT",
    "DOGE-USDT",
];

/// Log files the service appends to on every signal/trade
pub const LOG_FILES: &[&str] = &["recent_signals.jsonl", "recent_trades.jsonl"];

/// Fields every recent trade must carry
pub const REQUIRED_TRADE_FIELDS: &[&str] = &["instId", "side", "size"];

/// Directory name under the user config dir
pub const CONFIG_DIR_NAME: &str = "signal-smoke";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Env vars the service itself is configured with
pub const ENV_BASE_URL: &str = "FLASK_BASE_URL";
pub const ENV_LOGS_DIR: &str = "LOG_DIR";

/// The seven endpoints a default run probes, in report order
pub fn default_endpoints() -> Vec<EndpointSpec> {
    vec![
        EndpointSpec::new("status", "/status", ShapeTag::Status),
        EndpointSpec::new("signals", "/recent/signals", ShapeTag::SignalList)
            .with_query("limit", DEFAULT_LIST_LIMIT),
        EndpointSpec::new("trades", "/recent/trades", ShapeTag::TradeList)
            .with_query("limit", DEFAULT_LIST_LIMIT),
        EndpointSpec::new("market", "/market", ShapeTag::MarketSnapshot),
        EndpointSpec::new("balance", "/balance", ShapeTag::Balance),
        EndpointSpec::new("verify", "/verify", ShapeTag::Verify),
        EndpointSpec::new("leaderboard", "/leaderboard", ShapeTag::Leaderboard),
    ]
}
