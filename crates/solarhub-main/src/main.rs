// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of SolarHub.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

mod config;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::{AppConfig, LogFormat, LoggingConfig};
use solarhub_core::{NormalizationEngine, ProviderConfig, ProviderRegistry};

/// SolarHub - solar inverter telemetry normalization service
#[derive(Parser, Debug)]
#[command(name = "solarhub", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "SOLARHUB_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Override server.host
    #[arg(long)]
    host: Option<String>,

    /// Override server.port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    init_tracing(&config.logging)?;

    info!("🚀 Starting SolarHub v{}", env!("CARGO_PKG_VERSION"));
    if cli.config.exists() {
        info!("📋 Configuration: {}", cli.config.display());
    } else {
        warn!(
            "⚠️ {} not found, using defaults with environment overrides",
            cli.config.display()
        );
    }

    let registry = ProviderRegistry::new();
    solarhub_providers::register_all(&registry);
    info!("   Available provider types: {}", registry.list_providers().join(", "));

    let engine = Arc::new(NormalizationEngine::new());
    start_providers(&registry, &engine, config.enabled_providers()).await;

    if engine.provider_names().is_empty() {
        warn!("⚠️ No providers active, API will return empty results");
    }

    let result =
        solarhub_web::start_api_server(Arc::clone(&engine), &config.bind_address(), shutdown_signal())
            .await;

    engine.close();
    result?;

    info!("👋 SolarHub stopped");
    Ok(())
}

/// RUST_LOG takes precedence over the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.level))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Console => builder.try_init(),
    }
    .map_err(|e| anyhow::anyhow!(e))
}

/// Create, initialize and register every configured provider.
///
/// A provider that fails is logged and skipped.
async fn start_providers<'a>(
    registry: &ProviderRegistry,
    engine: &NormalizationEngine,
    providers: impl Iterator<Item = &'a ProviderConfig>,
) {
    for provider_config in providers {
        let label = &provider_config.name;

        let mut provider = match registry.create(&provider_config.provider_type) {
            Ok(provider) => provider,
            Err(e) => {
                error!("❌ [{}] {}", label, e);
                continue;
            }
        };

        info!("🔌 [{}] Initializing {} provider", label, provider_config.provider_type);
        if let Err(e) = provider.initialize(provider_config).await {
            error!("❌ [{}] Initialization failed, skipping: {}", label, e);
            continue;
        }

        let replaced = engine.get_provider(provider.name());
        engine.register_provider(Arc::from(provider));

        if let Some(previous) = replaced {
            warn!(
                "⚠️ [{}] Replaced the active {} provider",
                label,
                previous.name()
            );
            if let Err(e) = previous.close() {
                error!("❌ [{}] Failed to close replaced provider: {}", label, e);
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("❌ Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("❌ Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}
