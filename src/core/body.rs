/// Response bodies decoded per expected shape
///
/// The service returns loosely-typed JSON. Each shape tag decodes into its own
/// variant, and anything that does not fit lands in `Unparseable` or
/// `UnexpectedShape` so validation stays exhaustive.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::endpoint::ShapeTag;

/// Timeframe legacy flat candle arrays are reported under
const LEGACY_CANDLE_TIMEFRAME: &str = "30m";

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Status(Value),
    Signals(Vec<Value>),
    Trades(Vec<Value>),
    Market(MarketSnapshot),
    Balance(BalanceBody),
    Verify(Value),
    Leaderboard(Value),
    /// Not JSON at all
    Unparseable(String),
    /// JSON, but not the shape the tag expects
    UnexpectedShape(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    pub age_seconds: Option<f64>,
    pub symbols: BTreeMap<String, SymbolCandles>,
}

/// Candle counts per timeframe for one symbol
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolCandles {
    pub timeframes: BTreeMap<String, usize>,
    /// Upstream fetch error the service put in place of the row's data
    pub error: Option<String>,
}

impl SymbolCandles {
    pub fn count(&self, timeframe: &str) -> usize {
        self.timeframes.get(timeframe).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceBody {
    /// Total equity including unrealized P&L
    pub total_equity: Option<f64>,
    pub total_eq: Option<f64>,
    pub unrealized_pnl: Option<f64>,
}

impl ResponseBody {
    /// List length or symbol count, for the shapes where it means something
    pub fn item_count(&self) -> Option<usize> {
        match self {
            ResponseBody::Signals(items) | ResponseBody::Trades(items) => Some(items.len()),
            ResponseBody::Market(snapshot) => Some(snapshot.symbols.len()),
            _ => None,
        }
    }

    pub fn parse(shape: ShapeTag, raw: &[u8]) -> Self {
        if raw.iter().all(|b| b.is_ascii_whitespace()) {
            return ResponseBody::Unparseable("empty body".to_string());
        }

        let value: Value = match serde_json::from_slice(raw) {
            Ok(v) => v,
            Err(e) => return ResponseBody::Unparseable(e.to_string()),
        };

        match shape {
            ShapeTag::Status => ResponseBody::Status(value),
            ShapeTag::Verify => ResponseBody::Verify(value),
            ShapeTag::Leaderboard => ResponseBody::Leaderboard(value),
            ShapeTag::SignalList => match into_items(value) {
                Some(items) => ResponseBody::Signals(items),
                None => ResponseBody::UnexpectedShape("expected an items array".to_string()),
            },
            ShapeTag::TradeList => match into_items(value) {
                Some(items) => ResponseBody::Trades(items),
                None => ResponseBody::UnexpectedShape("expected an items array".to_string()),
            },
            ShapeTag::MarketSnapshot => match parse_market(&value) {
                Some(snapshot) => ResponseBody::Market(snapshot),
                None => ResponseBody::UnexpectedShape("expected a data object keyed by symbol".to_string()),
            },
            ShapeTag::Balance => match value.as_object() {
                Some(obj) => ResponseBody::Balance(parse_balance(obj)),
                None => ResponseBody::UnexpectedShape("expected a JSON object".to_string()),
            },
        }
    }
}

/// `{"items": [...]}` or a bare array
fn into_items(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut obj) => match obj.remove("items") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

fn parse_market(value: &Value) -> Option<MarketSnapshot> {
    let data = value.get("data")?.as_object()?;

    let symbols = data
        .iter()
        .map(|(symbol, row)| (symbol.clone(), parse_candles(row)))
        .collect();

    Some(MarketSnapshot {
        age_seconds: value.get("age_seconds").and_then(as_number),
        symbols,
    })
}

fn parse_candles(row: &Value) -> SymbolCandles {
    let mut timeframes = BTreeMap::new();

    match row.get("candles") {
        Some(Value::Object(by_tf)) => {
            for (tf, candles) in by_tf {
                let count = candles.as_array().map(Vec::len).unwrap_or(0);
                timeframes.insert(tf.clone(), count);
            }
        }
        Some(Value::Array(flat)) => {
            timeframes.insert(LEGACY_CANDLE_TIMEFRAME.to_string(), flat.len());
        }
        _ => {}
    }

    let error = row.get("error").and_then(|e| match e {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    });

    SymbolCandles { timeframes, error }
}

fn parse_balance(obj: &Map<String, Value>) -> BalanceBody {
    BalanceBody {
        total_equity: obj.get("totalEq_incl_unrealized").and_then(as_number),
        total_eq: obj.get("totalEq").and_then(as_number),
        unrealized_pnl: obj.get("unrealizedPnL").and_then(as_number),
    }
}

/// JSON number or numeric string
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
