//! shopcheck: run the storefront API scenarios against a live backend

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopcheck::config::{AuthConfig, HarnessConfig};
use shopcheck::runner::{ScenarioRunner, Selection};
use shopcheck::scenarios;

#[derive(Parser, Debug)]
#[command(name = "shopcheck")]
#[command(about = "End-to-end scenarios for the storefront REST API", version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "SHOPCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// API root URL (overrides config file and environment)
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Bearer token sent as `Authorization: Bearer <token>`
    #[arg(long)]
    bearer_token: Option<String>,

    /// Run only scenarios with this tag (smoke, regression, products, ...)
    #[arg(short, long, conflicts_with = "name")]
    tag: Option<String>,

    /// Run only the named scenario(s)
    #[arg(short, long)]
    name: Vec<String>,

    /// Output directory for results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seconds to wait for the API before giving up (0 = don't wait)
    #[arg(long)]
    wait_secs: Option<u64>,

    /// List scenarios and exit
    #[arg(long)]
    list: bool,

    /// Debug-level logs, including request/response bodies
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    }
}

fn load_config(args: &Args) -> Result<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => HarnessConfig::default(),
    };

    config.apply_env()?;

    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout_secs = secs;
    }
    if let Some(token) = &args.bearer_token {
        config.auth = AuthConfig::Bearer { token: token.clone() };
    }
    if let Some(dir) = &args.output {
        config.output_dir = dir.clone();
    }
    if let Some(secs) = args.wait_secs {
        config.startup_timeout_secs = secs;
    }

    config.validate()?;
    Ok(config)
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.json_logs);

    if args.list {
        for scenario in scenarios::catalogue() {
            println!("{:<48} [{}]", scenario.name, scenario.tags.join(", "));
        }
        return;
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> Result<bool> {
    let config = load_config(&args)?;
    info!(base_url = %config.base_url, "shopcheck starting");

    let selection = match (&args.tag, args.name.is_empty()) {
        (Some(tag), _) => Selection::Tagged(tag.clone()),
        (None, false) => Selection::Named(args.name.clone()),
        (None, true) => Selection::All,
    };

    let runner = ScenarioRunner::new(&config)?;
    if config.startup_timeout_secs > 0 {
        runner.wait_for_api().await.context("backend is not reachable")?;
    }

    let results = runner.run_selection(&selection).await?;
    runner.write_results(&results)?;

    Ok(results.is_success())
}
