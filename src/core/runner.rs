/// Smoketest orchestration
///
/// Samples the logs, probes every endpoint with bounded fan-out, samples the
/// logs again and hands everything to the aggregator. Probes share no state
/// and results are collected in endpoint order, so concurrency never changes
/// the report.

use chrono::Local;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio::time::Instant;

use super::aggregator::{aggregate, Report, RunContext};
use super::config::SmokeConfig;
use super::endpoint::EndpointSpec;
use super::finding::SectionResult;
use super::log_growth::{LogGrowthChecker, LogSample};
use super::probe::{Fetch, ProbeOutcome};
use super::resources::{HostMetrics, ResourceSampler};
use super::validator::{decode, validate_decoded, ValidationRules};

/// Slack on top of the probe timeout before the runner gives up on a fetch
const PROBE_GRACE: Duration = Duration::from_millis(500);

pub struct SmokeRunner<F: Fetch> {
    fetcher: F,
    config: SmokeConfig,
}

impl<F: Fetch> SmokeRunner<F> {
    pub fn new(fetcher: F, config: SmokeConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &SmokeConfig {
        &self.config
    }

    pub async fn run(&self, host: HostMetrics) -> Report {
        let context = RunContext {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            base_url: self.config.base_url.clone(),
            logs_dir: self.config.logs_dir.display().to_string(),
        };

        tracing::info!(
            endpoints = self.config.endpoints.len(),
            concurrency = self.config.concurrency,
            base_url = %self.config.base_url,
            "Starting smoketest run"
        );

        let log_paths = self.config.log_paths();
        let baselines: Vec<LogSample> = log_paths.iter().map(LogSample::take).collect();
        let window_end = Instant::now() + self.config.log_window;

        let rules = self.config.rules();
        let sections: Vec<SectionResult> = stream::iter(self.config.endpoints.iter())
            .map(|endpoint| self.check_endpoint(endpoint, &rules))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        tokio::time::sleep_until(window_end).await;

        let log_growth = baselines
            .iter()
            .map(|baseline| {
                let record = LogGrowthChecker::check(&baseline.path, baseline.size);
                tracing::debug!(log = %record.name, delta = ?record.delta, status = record.status.as_str(), "Log growth sampled");
                record
            })
            .collect();

        let resources = ResourceSampler::new(host).sample();
        let report = aggregate(context, sections, log_growth, resources);

        tracing::info!(
            fail = report.summary.fail,
            warn = report.summary.warn,
            pass = report.summary.pass,
            "Smoketest run finished"
        );

        report
    }

    /// Probe one endpoint and classify it: reachability first, then body rules
    async fn check_endpoint(&self, endpoint: &EndpointSpec, rules: &ValidationRules) -> SectionResult {
        let outcome = self.probe(endpoint).await;

        let mut findings = vec![outcome.reachability()];
        let mut item_count = None;

        if let Some(body) = decode(endpoint.shape, &outcome) {
            item_count = body.item_count();
            findings.extend(validate_decoded(endpoint.shape, &endpoint.name, &body, rules));
        }

        SectionResult {
            name: endpoint.name.clone(),
            item_count,
            findings,
        }
    }

    /// Fetch with a hard cap so one hung endpoint cannot stall the run
    async fn probe(&self, endpoint: &EndpointSpec) -> ProbeOutcome {
        let cap = self.config.timeout + PROBE_GRACE;
        let started = std::time::Instant::now();

        match tokio::time::timeout(cap, self.fetcher.fetch(endpoint)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(endpoint = %endpoint.name, "Probe exceeded its timeout");
                ProbeOutcome::transport_failure(
                    &endpoint.name,
                    format!("timed out after {}", humantime::format_duration(self.config.timeout)),
                    started.elapsed(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::endpoint::ShapeTag;
    use crate::core::finding::{Section, Severity};
    use crate::core::probe::MockFetch;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn test_config(logs_dir: &std::path::Path) -> SmokeConfig {
        SmokeConfig {
            base_url: "http://127.0.0.1:5001".to_string(),
            logs_dir: logs_dir.to_path_buf(),
            timeout: Duration::from_millis(200),
            ..SmokeConfig::default()
        }
    }

    fn host() -> HostMetrics {
        HostMetrics {
            disk_free_bytes: Some(8 * 1024 * 1024 * 1024),
            cpu_percent: Some(3.0),
            mem_percent: Some(41.0),
        }
    }

    fn canned_bodies() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("status", r#"{"ok": true}"#),
            ("signals", r#"{"items": [{"coin": "BTC", "signal": "hold"}]}"#),
            ("trades", r#"{"items": [{"instId": "BTC-USDT", "side": "buy", "size": 0.01}]}"#),
            (
                "market",
                r#"{"age_seconds": 1.0, "data": {
                    "BTC-USDT": {"candles": {"4h": [[1]]}}, "ETH-USDT": {"candles": {"4h": [[1]]}},
                    "SOL-USDT": {"candles": {"4h": [[1]]}}, "BNB-USDT": {"candles": {"4h": [[1]]}},
                    "XRP-USDT": {"candles": {"4h": [[1]]}}, "DOGE-USDT": {"candles": {"4h": [[1]]}}
                }}"#,
            ),
            ("balance", r#"{"totalEq_incl_unrealized": 10000.0}"#),
            ("verify", r#"{"status": "success"}"#),
            ("leaderboard", r#"[]"#),
        ])
    }

    #[tokio::test]
    async fn test_healthy_run() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("recent_signals.jsonl"), "a\n").unwrap();
        fs::write(dir.path().join("recent_trades.jsonl"), "b\n").unwrap();

        let bodies = canned_bodies();
        let mut fetcher = MockFetch::new();
        fetcher.expect_fetch().times(7).returning(move |endpoint| {
            ProbeOutcome::response(
                endpoint.name.clone(),
                200,
                bodies[endpoint.name.as_str()].as_bytes().to_vec(),
                Duration::from_millis(4),
            )
        });

        let runner = SmokeRunner::new(fetcher, test_config(dir.path()));
        let report = runner.run(host()).await;

        // 7 reachability + signals/trades/market/balance metrics, logs idle
        assert_eq!(report.summary.pass, 11);
        assert_eq!(report.summary.warn, 2);
        assert_eq!(report.summary.fail, 0);

        let names: Vec<&str> = report.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["status", "signals", "trades", "market", "balance", "verify", "leaderboard"]
        );
        assert_eq!(report.sections[2].item_count, Some(1));
        assert_eq!(report.sections[3].item_count, Some(6));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_skips_validation() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(dir.path());
        config.endpoints = vec![EndpointSpec::new("balance", "/balance", ShapeTag::Balance)];
        config.log_files.clear();

        let mut fetcher = MockFetch::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|endpoint| ProbeOutcome::transport_failure(endpoint.name.clone(), "connection refused", Duration::ZERO));

        let report = SmokeRunner::new(fetcher, config).run(host()).await;

        assert_eq!(report.sections[0].findings.len(), 1);
        assert_eq!(report.sections[0].findings[0].section, Section::Endpoints);
        assert_eq!(report.summary.fail, 1);
        assert_eq!(report.summary.total(), 1);
    }

    #[tokio::test]
    async fn test_missing_host_metrics_warn() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(dir.path());
        config.endpoints = vec![EndpointSpec::new("status", "/status", ShapeTag::Status)];
        config.log_files.clear();

        let mut fetcher = MockFetch::new();
        fetcher
            .expect_fetch()
            .returning(|endpoint| ProbeOutcome::response(endpoint.name.clone(), 200, b"{}".to_vec(), Duration::ZERO));

        let report = SmokeRunner::new(fetcher, config).run(HostMetrics::default()).await;

        assert_eq!(report.summary.pass, 1);
        assert_eq!(report.summary.warn, 3);
        assert_eq!(report.summary.total(), report.finding_count());
        assert_eq!(report.findings_in(Section::System).count(), 3);
    }

    /// Fetcher whose latency depends on the endpoint
    struct DelayedFetch {
        delays: HashMap<String, Duration>,
    }

    #[async_trait]
    impl Fetch for DelayedFetch {
        async fn fetch(&self, endpoint: &EndpointSpec) -> ProbeOutcome {
            let delay = self.delays.get(&endpoint.name).copied().unwrap_or_default();
            tokio::time::sleep(delay).await;
            ProbeOutcome::response(endpoint.name.clone(), 200, b"{}".to_vec(), delay)
        }
    }

    #[tokio::test]
    async fn test_hung_probe_is_capped_and_order_is_stable() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(dir.path());
        config.log_files.clear();
        config.concurrency = 3;
        config.endpoints = vec![
            EndpointSpec::new("slow", "/slow", ShapeTag::Status),
            EndpointSpec::new("hung", "/hung", ShapeTag::Verify),
            EndpointSpec::new("fast", "/fast", ShapeTag::Leaderboard),
        ];

        let fetcher = DelayedFetch {
            delays: HashMap::from([
                ("slow".to_string(), Duration::from_millis(100)),
                ("hung".to_string(), Duration::from_secs(30)),
                ("fast".to_string(), Duration::ZERO),
            ]),
        };

        let started = std::time::Instant::now();
        let report = SmokeRunner::new(fetcher, config).run(host()).await;
        assert!(started.elapsed() < Duration::from_secs(5));

        let names: Vec<&str> = report.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["slow", "hung", "fast"]);

        let hung = &report.sections[1].findings[0];
        assert_eq!(hung.severity, Severity::Fail);
        assert!(hung.message.contains("timed out"));
        assert_eq!(report.summary.pass, 2);
    }

    #[tokio::test]
    async fn test_log_window_separates_samples() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("recent_signals.jsonl");
        fs::write(&path, "start\n").unwrap();

        let mut config = test_config(dir.path());
        config.log_files = vec!["recent_signals.jsonl".to_string()];
        config.endpoints = vec![EndpointSpec::new("status", "/status", ShapeTag::Status)];
        config.log_window = Duration::from_millis(300);

        let mut fetcher = MockFetch::new();
        fetcher
            .expect_fetch()
            .returning(|endpoint| ProbeOutcome::response(endpoint.name.clone(), 200, b"{}".to_vec(), Duration::ZERO));

        let runner = SmokeRunner::new(fetcher, config);
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            fs::write(&path, "start\nmore\n").unwrap();
        });

        let report = runner.run(host()).await;
        writer.await.unwrap();

        assert_eq!(report.log_growth.len(), 1);
        assert_eq!(report.log_growth[0].status, Severity::Ok);
        assert_eq!(report.log_growth[0].delta, Some(5));
    }
}
