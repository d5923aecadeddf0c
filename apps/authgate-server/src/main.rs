#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
use std::path::PathBuf;

use anyhow::Context;
use api_gateway::ApiGateway;
use clap::{Parser, Subcommand};
use identity_resolver::IdentityResolverModule;
use tokio_util::sync::CancellationToken;
use user_preferences::PreferencesModule;

mod config;
mod logging;

use config::AppConfig;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Request-scoped authentication gate.
#[derive(Parser, Debug)]
#[command(name = "authgate-server", version, about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, env = "AUTHGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). Ignored when `RUST_LOG` is set.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Commands {
    /// Serve HTTP until interrupted (default).
    Run,
    /// Load and validate the configuration, then exit.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    logging::init(&config.logging, cli.verbose)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Check => check(&config),
    }
}

fn check(config: &AppConfig) -> anyhow::Result<()> {
    config.gateway.headers.parse()?;
    let credential = config::application_credential_from_env()?;
    let has_credential = credential.is_some();
    IdentityResolverModule::init(&config.identity_resolver, credential)?;
    tracing::info!(
        application_credential = has_credential,
        "Configuration is valid"
    );
    Ok(())
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let credential = config::application_credential_from_env()?;
    let resolver = IdentityResolverModule::init(&config.identity_resolver, credential)
        .context("failed to initialize identity resolver")?;

    let preferences = PreferencesModule::new(&config.preferences, resolver.client());
    let gateway = ApiGateway::new(config.gateway, resolver.client())?;
    let router = gateway.build_router(preferences.router());

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        signal_cancel.cancel();
    });

    let resilience = resolver.resilience();
    gateway.serve(router, cancel).await?;

    let snapshot = resilience.breaker_snapshot();
    tracing::info!(
        state = ?snapshot.state,
        opened_total = snapshot.opened_total,
        rate_limited_total = snapshot.rate_limited_total,
        "Server stopped"
    );
    Ok(())
}
