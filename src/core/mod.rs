pub mod aggregator;
pub mod body;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod finding;
pub mod log_growth;
pub mod probe;
pub mod report;
pub mod resources;
pub mod runner;
pub mod validator;

pub use aggregator::{aggregate, Report, RunContext, Summary};
pub use config::{EnvOverrides, Overrides, SmokeConfig};
pub use endpoint::{EndpointSpec, ShapeTag};
pub use error::ConfigError;
pub use finding::{Finding, Section, SectionResult, Severity};
pub use log_growth::{LogGrowthChecker, LogGrowthRecord, LogSample};
pub use probe::{Fetch, HttpProber, ProbeOutcome};
pub use report::{ReportFormat, Reporter};
pub use resources::{collect_host_metrics, HostMetrics, ResourceSampler, ResourceSnapshot};
pub use runner::SmokeRunner;
pub use validator::ValidationRules;
