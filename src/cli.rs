/// CLI argument parsing

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use signal_smoke::core::{Overrides, ReportFormat};

// Build timestamp injected at compile time
pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser)]
#[command(name = "signal-smoke")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/signal-smoke/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the service under test [env: FLASK_BASE_URL]
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Directory holding the service's log files [env: LOG_DIR]
    #[arg(long, global = true)]
    pub logs_dir: Option<PathBuf>,

    /// Per-probe timeout (e.g. 5s, 1500ms)
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Maximum number of probes in flight
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the smoketest and emit a report (default)
    Run(RunArgs),

    /// List the endpoints a run would probe
    Endpoints,

    /// Validate and show the resolved configuration
    Config,
}

#[derive(Args)]
pub struct RunArgs {
    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Markdown)]
    pub format: ReportFormat,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Minimum time between the two log size samples (e.g. 10s)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub log_window: Option<Duration>,

    /// Skip host CPU/memory/disk sampling (reported as unavailable)
    #[arg(long)]
    pub no_system: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            format: ReportFormat::Markdown,
            output: None,
            log_window: None,
            no_system: false,
        }
    }
}

impl Cli {
    /// Command-line values layered over file and env config
    pub fn overrides(&self, log_window: Option<Duration>) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            logs_dir: self.logs_dir.clone(),
            timeout: self.timeout,
            concurrency: self.concurrency,
            log_window,
        }
    }
}
