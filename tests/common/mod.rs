#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::thread;

/// path -> (status, body)
pub type Routes = HashMap<String, (u16, String)>;

/// Minimal HTTP/1.1 server answering canned JSON by request path
pub struct StubServer {
    pub base_url: String,
}

impl StubServer {
    pub fn start(routes: Routes) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let addr = listener.local_addr().expect("stub server address");
        let routes = Arc::new(routes);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let routes = Arc::clone(&routes);
                thread::spawn(move || handle(stream, &routes));
            }
        });

        Self {
            base_url: format!("http://{}", addr),
        }
    }
}

fn handle(mut stream: TcpStream, routes: &Routes) {
    let Ok(read_half) = stream.try_clone() else { return };
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) if line == "\r\n" => break,
            Ok(_) => {}
        }
    }

    let target = request_line.split_whitespace().nth(1).unwrap_or("/");
    let path = target.split('?').next().unwrap_or(target);
    let (status, body) = routes
        .get(path)
        .cloned()
        .unwrap_or((404, r#"{"error":"not found"}"#.to_string()));

    let _ = write!(
        stream,
        "HTTP/1.1 {} STUB\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.flush();
}

pub const SYMBOLS: [&str; 6] = ["BTC-USDT", "ETH-USDT", "SOL-USDT", "BNB-USDT", "XRP-USDT", "DOGE-USDT"];

fn market_body(four_hour_candles: &str) -> String {
    let rows: Vec<String> = SYMBOLS
        .iter()
        .map(|s| {
            format!(
                r#""{}": {{"last": "1.0", "candles": {{"3m": [[1,2,0.5,1.5,10]], "4h": {}}}}}"#,
                s, four_hour_candles
            )
        })
        .collect();
    format!(r#"{{"age_seconds": 1.2, "updated_at": 1700000000.0, "data": {{{}}}}}"#, rows.join(", "))
}

/// The reference run: all endpoints up, trades lack instId, every 4h series empty
pub fn reference_routes() -> Routes {
    let mut routes = Routes::new();
    routes.insert("/status".into(), (200, r#"{"status":"running","invocations":42}"#.into()));
    routes.insert(
        "/recent/signals".into(),
        (200, r#"{"items":[{"coin":"BTC","signal":"hold"},{"coin":"ETH","signal":"entry"}]}"#.into()),
    );
    routes.insert(
        "/recent/trades".into(),
        (
            200,
            r#"{"items":[
                {"coin":"BTC","symbol":"BTC-USDT","side":"buy","size":0.01},
                {"coin":"ETH","symbol":"ETH-USDT","side":"sell","size":0.5},
                {"coin":"SOL","symbol":"SOL-USDT","side":"buy","size":3.0}
            ]}"#
            .into(),
        ),
    );
    routes.insert("/market".into(), (200, market_body("[]")));
    routes.insert(
        "/balance".into(),
        (200, r#"{"code":"0","totalEq":9950.0,"unrealizedPnL":50.0,"totalEq_incl_unrealized":10000.0}"#.into()),
    );
    routes.insert("/verify".into(), (200, r#"{"status":"success","keys_valid":true}"#.into()));
    routes.insert("/leaderboard".into(), (200, r#"{"rows":[]}"#.into()));
    routes
}

/// Everything healthy: complete trades, populated 4h candles
pub fn healthy_routes() -> Routes {
    let mut routes = reference_routes();
    routes.insert(
        "/recent/trades".into(),
        (200, r#"{"items":[{"instId":"BTC-USDT","side":"buy","size":"0.01"}]}"#.into()),
    );
    routes.insert("/market".into(), (200, market_body("[[1,2,0.5,1.5,10]]")));
    routes
}

/// Log files the service writes, with some existing content
pub fn seed_logs(dir: &Path) {
    fs::write(dir.join("recent_signals.jsonl"), "{\"coin\":\"BTC\"}\n").expect("seed signals log");
    fs::write(dir.join("recent_trades.jsonl"), "{\"coin\":\"ETH\"}\n").expect("seed trades log");
}
