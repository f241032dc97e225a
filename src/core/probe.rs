/// Endpoint probing
///
/// One request per endpoint, no retries. Transport failures and non-2xx
/// statuses come back as data in the ProbeOutcome.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

use super::endpoint::EndpointSpec;
use super::finding::{Finding, Section};

/// Normalized result of one probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub endpoint: String,
    /// Absent when the request never got a response
    pub status: Option<u16>,
    /// Raw response body, absent on transport failure
    pub body: Option<Vec<u8>>,
    pub latency: Duration,
    pub transport_error: Option<String>,
}

impl ProbeOutcome {
    pub fn response(endpoint: impl Into<String>, status: u16, body: Vec<u8>, latency: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: Some(status),
            body: Some(body),
            latency,
            transport_error: None,
        }
    }

    pub fn transport_failure(endpoint: impl Into<String>, error: impl Into<String>, latency: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            status: None,
            body: None,
            latency,
            transport_error: Some(error.into()),
        }
    }

    /// Status present, in [200, 300) and no transport error
    pub fn is_reachable(&self) -> bool {
        self.transport_error.is_none() && matches!(self.status, Some(code) if (200..300).contains(&code))
    }

    /// Baseline OK/FAIL Finding for the Endpoints section, labeled with the endpoint name
    pub fn reachability(&self) -> Finding {
        let ms = self.latency.as_millis();
        let finding = match (&self.transport_error, self.status) {
            (None, Some(code)) if self.is_reachable() => {
                Finding::ok(Section::Endpoints, format!("HTTP {} ({} ms)", code, ms))
            }
            (Some(err), Some(code)) => Finding::fail(Section::Endpoints, format!("HTTP {}: {}", code, err)),
            (Some(err), None) => Finding::fail(Section::Endpoints, format!("unreachable: {}", err)),
            (None, Some(code)) => Finding::fail(Section::Endpoints, format!("HTTP {} ({} ms)", code, ms)),
            (None, None) => Finding::fail(Section::Endpoints, "unreachable: no response"),
        };

        finding.with_item(self.endpoint.clone())
    }
}

/// The fetch capability the runner probes through
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, endpoint: &EndpointSpec) -> ProbeOutcome;
}

/// HTTP prober over a shared reqwest client
pub struct HttpProber {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("signal-smoke/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn describe_error(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("timed out after {}", humantime::format_duration(self.timeout))
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            format!("request failed: {}", err)
        }
    }
}

#[async_trait]
impl Fetch for HttpProber {
    async fn fetch(&self, endpoint: &EndpointSpec) -> ProbeOutcome {
        let start = Instant::now();

        let url = match endpoint.url(&self.base_url) {
            Ok(url) => url,
            Err(e) => return ProbeOutcome::transport_failure(&endpoint.name, format!("{:#}", e), start.elapsed()),
        };

        tracing::debug!(endpoint = %endpoint.name, url = %url, "Probing endpoint");

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                let outcome = ProbeOutcome::transport_failure(&endpoint.name, self.describe_error(&e), start.elapsed());
                tracing::warn!(endpoint = %endpoint.name, error = %e, "Probe failed");
                return outcome;
            }
        };

        let status = response.status().as_u16();

        match response.bytes().await {
            Ok(bytes) => {
                let latency = start.elapsed();
                tracing::debug!(
                    endpoint = %endpoint.name,
                    status,
                    latency_ms = latency.as_millis() as u64,
                    bytes = bytes.len(),
                    "Probe finished"
                );
                ProbeOutcome::response(&endpoint.name, status, bytes.to_vec(), latency)
            }
            Err(e) => {
                tracing::warn!(endpoint = %endpoint.name, status, error = %e, "Failed to read response body");
                ProbeOutcome {
                    endpoint: endpoint.name.clone(),
                    status: Some(status),
                    body: None,
                    latency: start.elapsed(),
                    transport_error: Some(self.describe_error(&e)),
                }
            }
        }
    }
}
