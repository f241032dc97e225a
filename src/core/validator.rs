/// Body validation rules per endpoint shape
///
/// Pure functions: one decoded body in, Findings out, in rule order.
/// Item order inside lists is preserved so messages are reproducible.

use serde_json::Value;
use std::time::Duration;

use super::body::{BalanceBody, MarketSnapshot, ResponseBody};
use super::endpoint::ShapeTag;
use super::finding::{Finding, Section};
use super::probe::ProbeOutcome;
use crate::utils::{truncate_string, REQUIRED_TRADE_FIELDS};

/// Longest parse error text kept in a Finding message
const MAX_ERROR_LEN: usize = 120;

/// Parameters the rules need from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRules {
    /// Symbols checked in the market snapshot, in report order
    pub tracked_symbols: Vec<String>,
    /// Candle timeframe whose emptiness fails a symbol
    pub high_timeframe: String,
    /// Snapshot age above which the market is reported stale
    pub market_max_age: Option<Duration>,
}

/// Validate a probe's body. Unreachable outcomes yield nothing here,
/// their reachability Finding already carries the failure.
pub fn validate(shape: ShapeTag, outcome: &ProbeOutcome, rules: &ValidationRules) -> Vec<Finding> {
    decode(shape, outcome)
        .map(|body| validate_decoded(shape, &outcome.endpoint, &body, rules))
        .unwrap_or_default()
}

/// Decode the body of a reachable outcome
pub fn decode(shape: ShapeTag, outcome: &ProbeOutcome) -> Option<ResponseBody> {
    if !outcome.is_reachable() {
        return None;
    }

    Some(match &outcome.body {
        Some(raw) => ResponseBody::parse(shape, raw),
        None => ResponseBody::Unparseable("empty body".to_string()),
    })
}

/// Rules for an already decoded body, tagged with the endpoint name where the
/// Finding is shown under Endpoints
pub fn validate_decoded(
    shape: ShapeTag,
    endpoint: &str,
    body: &ResponseBody,
    rules: &ValidationRules,
) -> Vec<Finding> {
    validate_body(shape, body, rules)
        .into_iter()
        .map(|f| match (&f.item, f.section) {
            (None, Section::Endpoints) => f.with_item(endpoint),
            _ => f,
        })
        .collect()
}

pub fn validate_body(shape: ShapeTag, body: &ResponseBody, rules: &ValidationRules) -> Vec<Finding> {
    let section = shape.section();

    match body {
        ResponseBody::Unparseable(err) => vec![Finding::fail(
            section,
            format!("unparseable response: {}", truncate_string(err, MAX_ERROR_LEN)),
        )],
        ResponseBody::UnexpectedShape(reason) => vec![Finding::fail(
            section,
            format!("unexpected response shape: {}", reason),
        )],
        ResponseBody::Signals(items) => vec![item_count(Section::Signals, items.len())],
        ResponseBody::Trades(items) => validate_trades(items),
        ResponseBody::Market(snapshot) => validate_market(snapshot, rules),
        ResponseBody::Balance(balance) => validate_balance(balance),
        // Shallow by policy: a 2xx with well-formed JSON is enough
        ResponseBody::Status(_) | ResponseBody::Verify(_) | ResponseBody::Leaderboard(_) => Vec::new(),
    }
}

/// Informational list size; an empty list is a warning
fn item_count(section: Section, count: usize) -> Finding {
    if count == 0 {
        Finding::warn(section, "items: 0 (empty list)")
    } else {
        Finding::ok(section, format!("items: {}", count))
    }
}

fn has_field(item: &Value, field: &str) -> bool {
    item.get(field).map(|v| !v.is_null()).unwrap_or(false)
}

/// (items missing a required field, total items)
pub fn count_missing_trade_fields(items: &[Value]) -> (usize, usize) {
    items.iter().fold((0, 0), |(missing, total), item| {
        let complete = REQUIRED_TRADE_FIELDS.iter().all(|field| has_field(item, field));
        (missing + usize::from(!complete), total + 1)
    })
}

fn validate_trades(items: &[Value]) -> Vec<Finding> {
    let mut findings = vec![item_count(Section::Trades, items.len())];

    let (missing, total) = count_missing_trade_fields(items);
    if missing > 0 {
        findings.push(Finding::fail(
            Section::Trades,
            format!("{}/{} items missing {}", missing, total, REQUIRED_TRADE_FIELDS.join("/")),
        ));
    }

    findings
}

fn validate_market(snapshot: &MarketSnapshot, rules: &ValidationRules) -> Vec<Finding> {
    let mut findings = Vec::new();

    let present = rules
        .tracked_symbols
        .iter()
        .filter(|s| snapshot.symbols.contains_key(s.as_str()))
        .count();

    findings.push(if present == 0 {
        Finding::warn(Section::Market, "symbols: 0 (empty snapshot)")
    } else {
        Finding::ok(Section::Market, format!("symbols: {}", present))
    });

    if let (Some(age), Some(max_age)) = (snapshot.age_seconds, rules.market_max_age) {
        if age > max_age.as_secs_f64() {
            findings.push(Finding::warn(
                Section::Market,
                format!("snapshot is stale (age {:.1}s > {}s)", age, max_age.as_secs()),
            ));
        }
    }

    for symbol in &rules.tracked_symbols {
        let message = match snapshot.symbols.get(symbol) {
            None => "missing from market snapshot".to_string(),
            Some(candles) if candles.count(&rules.high_timeframe) == 0 => match &candles.error {
                Some(err) => format!(
                    "candles[{}] is empty (upstream error: {})",
                    rules.high_timeframe,
                    truncate_string(err, MAX_ERROR_LEN)
                ),
                None => format!("candles[{}] is empty", rules.high_timeframe),
            },
            Some(_) => continue,
        };

        findings.push(Finding::fail(Section::Market, message).with_item(symbol.clone()));
    }

    findings
}

fn validate_balance(balance: &BalanceBody) -> Vec<Finding> {
    match balance.total_equity {
        Some(equity) => vec![Finding::ok(
            Section::Balance,
            format!("totalEq_incl_unrealized: {:.2}", equity),
        )],
        None => vec![Finding::fail(Section::Balance, "totalEq_incl_unrealized missing")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finding::Severity;
    use serde_json::json;

    fn rules(symbols: &[&str]) -> ValidationRules {
        ValidationRules {
            tracked_symbols: symbols.iter().map(|s| s.to_string()).collect(),
            high_timeframe: "4h".to_string(),
            market_max_age: Some(Duration::from_secs(60)),
        }
    }

    fn ok_outcome(name: &str, body: &str) -> ProbeOutcome {
        ProbeOutcome::response(name, 200, body.as_bytes().to_vec(), Duration::from_millis(3))
    }

    #[test]
    fn test_trades_all_missing() {
        let body = r#"{"items":[
            {"symbol":"BTC-USDT","side":"buy","size":0.01},
            {"symbol":"ETH-USDT","side":"sell","size":1.0},
            {"symbol":"SOL-USDT","side":"buy","size":null}
        ]}"#;
        let findings = validate(ShapeTag::TradeList, &ok_outcome("trades", body), &rules(&[]));

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::Ok);
        assert_eq!(findings[0].message, "items: 3");
        assert_eq!(findings[1].severity, Severity::Fail);
        assert_eq!(findings[1].message, "3/3 items missing instId/side/size");
        assert_eq!(findings[1].section, Section::Trades);
    }

    #[test]
    fn test_trades_partial_and_complete() {
        let items = vec![
            json!({"instId":"BTC-USDT","side":"buy","size":"0.01"}),
            json!({"instId":"ETH-USDT","side":"sell"}),
            json!("not an object"),
            json!({"instId":"SOL-USDT","side":"buy","size":2}),
        ];
        assert_eq!(count_missing_trade_fields(&items), (2, 4));

        let findings = validate_trades(&items);
        assert_eq!(findings.last().unwrap().message, "2/4 items missing instId/side/size");

        let complete = vec![json!({"instId":"BTC-USDT","side":"buy","size":1})];
        let findings = validate_trades(&complete);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Ok);
    }

    #[test]
    fn test_empty_lists_warn() {
        let findings = validate(ShapeTag::SignalList, &ok_outcome("signals", r#"{"items":[]}"#), &rules(&[]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warn);

        let findings = validate(ShapeTag::TradeList, &ok_outcome("trades", "[]"), &rules(&[]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warn);
    }

    #[test]
    fn test_market_empty_high_timeframe() {
        let body = r#"{"age_seconds": 2.0, "data": {
            "BTC-USDT": {"candles": {"4h": []}},
            "ETH-USDT": {"candles": {"4h": [[1,2,3,4,5]]}},
            "SOL-USDT": {"candles": {"3m": [[1,2,3,4,5]]}},
            "XRP-USDT": {"error": "HTTPSConnectionPool: read timed out"}
        }}"#;
        let findings = validate(
            ShapeTag::MarketSnapshot,
            &ok_outcome("market", body),
            &rules(&["BTC-USDT", "ETH-USDT", "SOL-USDT", "XRP-USDT", "DOGE-USDT"]),
        );

        let failures: Vec<String> = findings
            .iter()
            .filter(|f| f.severity == Severity::Fail)
            .map(|f| f.display_message())
            .collect();

        assert_eq!(
            failures,
            vec![
                "BTC-USDT: candles[4h] is empty",
                "SOL-USDT: candles[4h] is empty",
                "XRP-USDT: candles[4h] is empty (upstream error: HTTPSConnectionPool: read timed out)",
                "DOGE-USDT: missing from market snapshot",
            ]
        );
        assert_eq!(findings[0].message, "symbols: 4");
    }

    #[test]
    fn test_market_stale_snapshot() {
        let body = r#"{"age_seconds": 125.0, "data": {"BTC-USDT": {"candles": {"4h": [[1]]}}}}"#;
        let findings = validate(ShapeTag::MarketSnapshot, &ok_outcome("market", body), &rules(&["BTC-USDT"]));

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[1].severity, Severity::Warn);
        assert!(findings[1].message.contains("stale"));
    }

    #[test]
    fn test_balance_present_and_absent() {
        let findings = validate(
            ShapeTag::Balance,
            &ok_outcome("balance", r#"{"totalEq_incl_unrealized": 10234.5}"#),
            &rules(&[]),
        );
        assert_eq!(findings[0].severity, Severity::Ok);
        assert_eq!(findings[0].message, "totalEq_incl_unrealized: 10234.50");

        let findings = validate(ShapeTag::Balance, &ok_outcome("balance", r#"{"error":"x"}"#), &rules(&[]));
        assert_eq!(findings[0].severity, Severity::Fail);
    }

    #[test]
    fn test_shallow_shapes() {
        for shape in [ShapeTag::Status, ShapeTag::Verify, ShapeTag::Leaderboard] {
            let findings = validate(shape, &ok_outcome("x", r#"{"anything": [1, 2]}"#), &rules(&[]));
            assert!(findings.is_empty());
        }
    }

    #[test]
    fn test_unparseable_single_fail() {
        let findings = validate(ShapeTag::Status, &ok_outcome("status", "<html>"), &rules(&[]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Fail);
        assert_eq!(findings[0].section, Section::Endpoints);
        assert!(findings[0].message.starts_with("unparseable response"));
        assert_eq!(findings[0].item.as_deref(), Some("status"));
    }

    #[test]
    fn test_unreachable_yields_nothing() {
        let outcome = ProbeOutcome::response("balance", 503, b"{}".to_vec(), Duration::ZERO);
        assert!(validate(ShapeTag::Balance, &outcome, &rules(&[])).is_empty());
    }
}
