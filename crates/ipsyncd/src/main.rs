// # ipsyncd - Site Backend Sync
//
// Thin integration layer: every sync rule lives in ipsync-core.
//
// The binary is responsible for:
// 1. Parsing the command line
// 2. Initializing logging
// 3. Resolving configuration (environment first, then the JSON file)
// 4. Wiring the HTTP IP source and the site API client into the engine
// 5. Running exactly one reconciliation and mapping the result to an exit code
//
// ## Configuration
//
// ### Environment (preferred when API_KEY and API_SECRET are both set)
// - `IP_SET_COUNT`: Number of distinct public IPs to collect (default 2)
// - `API_KEY`, `API_SECRET`: Site API credentials
// - `API`: Site API base URL
// - `SITE_DOMAIN`: Substring matched against site domains
// - `IP_ECHO_URL`: IP-echo service (default https://ip.3322.net)
//
// ### Runtime
// - `IPSYNC_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `IPSYNC_MODE`: live or dry-run (default live)
//
// ### Config file (fallback)
// JSON object with `ip_set_count`, `api_key`, `api_secret`, `api`,
// `site_domain` and optionally `ip_echo_url`. Path given by `-c`.
//
// ## Example
//
// ```bash
// export API_KEY=your_key
// export API_SECRET=your_secret
// export API=https://waf.example.com/api
// export SITE_DOMAIN=shop.example.com
//
// ipsyncd
// ```
//
// Scheduling is external (cron, systemd timer): each invocation is one run.

use anyhow::{Context, Result};
use clap::Parser;
use ipsync_core::{SyncConfig, SyncEngine, SyncOutcome};
use ipsync_ip_http::HttpIpSource;
use ipsync_provider_siteapi::SiteApiClient;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

const LOG_LEVEL_VAR: &str = "IPSYNC_LOG_LEVEL";
const MODE_VAR: &str = "IPSYNC_MODE";

/// Exit codes for different termination scenarios
///
/// - 0: Run completed (backends updated or already matching)
/// - 1: Configuration or startup error
/// - 2: Runtime error (network, decode, site not found)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpsyncExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<IpsyncExitCode> for ExitCode {
    fn from(code: IpsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Reconcile a site's backend list with this host's public IPs
#[derive(Debug, Parser)]
#[command(name = "ipsyncd", version, about)]
struct Cli {
    /// Config file used when API_KEY/API_SECRET are not both set
    #[arg(short = 'c', long = "config", default_value = "config.json")]
    config: PathBuf,
}

/// Run mode of the site API client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Live,
    DryRun,
}

impl Mode {
    fn parse(value: Option<&str>) -> Result<Self> {
        match value.map(str::to_lowercase).as_deref() {
            None | Some("") | Some("live") => Ok(Mode::Live),
            Some("dry-run") => Ok(Mode::DryRun),
            Some(other) => anyhow::bail!(
                "{} '{}' is not valid. Valid modes: live, dry-run",
                MODE_VAR,
                other
            ),
        }
    }
}

fn parse_log_level(value: Option<&str>) -> Result<Level> {
    match value.map(str::to_lowercase).as_deref() {
        None | Some("") | Some("info") => Ok(Level::INFO),
        Some("trace") => Ok(Level::TRACE),
        Some("debug") => Ok(Level::DEBUG),
        Some("warn") => Ok(Level::WARN),
        Some("error") => Ok(Level::ERROR),
        Some(other) => anyhow::bail!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            LOG_LEVEL_VAR,
            other
        ),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match parse_log_level(env::var(LOG_LEVEL_VAR).ok().as_deref()) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return IpsyncExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IpsyncExitCode::ConfigError.into();
    }

    let mode = match Mode::parse(env::var(MODE_VAR).ok().as_deref()) {
        Ok(mode) => mode,
        Err(e) => {
            error!("Configuration error: {}", e);
            return IpsyncExitCode::ConfigError.into();
        }
    };

    let config = match SyncConfig::load(Some(cli.config.as_path())) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {}", e);
            return IpsyncExitCode::ConfigError.into();
        }
    };

    info!("Starting ipsyncd");
    info!(
        "Configuration loaded: site domain '{}', {} distinct IP(s) wanted",
        config.site_domain, config.ip_set_count
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IpsyncExitCode::RuntimeError.into();
        }
    };

    match rt.block_on(run(config, mode)) {
        Ok(outcome) => {
            report(&outcome);
            IpsyncExitCode::Success.into()
        }
        Err(e) => {
            error!("Sync failed: {:#}", e);
            exit_code_for(&e).into()
        }
    }
}

/// Wire the components and perform one run
async fn run(config: SyncConfig, mode: Mode) -> Result<SyncOutcome> {
    let ip_source = HttpIpSource::new(config.ip_echo_url.clone());
    let provider = SiteApiClient::from_config(&config, mode == Mode::DryRun)
        .context("Failed to create site API client")?;

    info!("IP-echo service: {}", ip_source.url());

    let engine = SyncEngine::new(Box::new(ip_source), Box::new(provider), &config);
    let outcome = engine.run().await?;
    Ok(outcome)
}

fn report(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Unchanged { site_id, addresses } => {
            info!("Site {} unchanged: {:?}", site_id, addresses);
        }
        SyncOutcome::Updated {
            site_id,
            previous,
            current,
        } => {
            info!("Site {} updated: {:?} -> {:?}", site_id, previous, current);
        }
    }
}

/// Configuration errors exit with 1, everything else with 2
fn exit_code_for(err: &anyhow::Error) -> IpsyncExitCode {
    match err.downcast_ref::<ipsync_core::Error>() {
        Some(e) if e.is_config() => IpsyncExitCode::ConfigError,
        _ => IpsyncExitCode::RuntimeError,
    }
}
