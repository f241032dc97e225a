mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, RunArgs};
use signal_smoke::core::{
    collect_host_metrics, EnvOverrides, HostMetrics, HttpProber, Reporter, SmokeConfig, SmokeRunner,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // FLASK_BASE_URL / LOG_DIR may live in the service's .env
    dotenv::dotenv().ok();

    match &cli.command {
        None => handle_run(&cli, &RunArgs::default()).await,
        Some(Commands::Run(args)) => handle_run(&cli, args).await,
        Some(Commands::Endpoints) => handle_endpoints(&cli),
        Some(Commands::Config) => handle_config(&cli),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli, args: Option<&RunArgs>) -> Result<SmokeConfig> {
    let overrides = cli.overrides(args.and_then(|a| a.log_window));

    SmokeConfig::load(cli.config.as_deref(), EnvOverrides::from_env(), overrides)
        .context("Failed to load smoketest configuration")
}

async fn handle_run(cli: &Cli, args: &RunArgs) -> Result<ExitCode> {
    let config = load_config(cli, Some(args))?;

    let host = if args.no_system {
        HostMetrics::default()
    } else {
        collect_host_metrics(config.logs_dir.clone()).await
    };

    let prober = HttpProber::new(config.base_url.clone(), config.timeout)?;
    let runner = SmokeRunner::new(prober, config);
    let report = runner.run(host).await;

    let rendered = Reporter::render(&report, args.format)?;

    match &args.output {
        Some(path) => {
            Reporter::write_to(path, &rendered)?;
            eprintln!("Report written to {}", path.display());
        }
        None => print!("{}", rendered),
    }

    eprintln!("{}", Reporter::summary_line(&report.summary));

    Ok(if report.summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn handle_endpoints(cli: &Cli) -> Result<ExitCode> {
    let config = load_config(cli, None)?;

    println!("{:<14} {:<16} {}", "Endpoint", "Shape", "URL");
    println!("{}", "-".repeat(70));

    for endpoint in &config.endpoints {
        let url = endpoint
            .url(&config.base_url)
            .map(|u| u.to_string())
            .unwrap_or_else(|e| format!("<invalid: {}>", e));
        let shape = serde_json::to_value(endpoint.shape)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        println!("{:<14} {:<16} {}", endpoint.name, shape, url);
    }

    Ok(ExitCode::SUCCESS)
}

fn handle_config(cli: &Cli) -> Result<ExitCode> {
    let config = load_config(cli, None)?;

    println!("Configuration:\n");
    println!("base_url:        {}", config.base_url);
    println!("logs_dir:        {}", config.logs_dir.display());
    println!("timeout:         {}", humantime::format_duration(config.timeout));
    println!("concurrency:     {}", config.concurrency);
    println!("log_window:      {}", humantime::format_duration(config.log_window));
    println!(
        "market_max_age:  {}",
        config
            .market_max_age
            .map(|d| humantime::format_duration(d).to_string())
            .unwrap_or_else(|| "off".to_string())
    );
    println!("high_timeframe:  {}", config.high_timeframe);
    println!("tracked_symbols: {}", config.tracked_symbols.join(", "));
    println!("log_files:       {}", config.log_files.join(", "));
    println!("endpoints:       {}", config.endpoints.len());
    println!("\n✓ Configuration is valid");

    Ok(ExitCode::SUCCESS)
}
