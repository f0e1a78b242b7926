mod bootstrap;
mod cli;

use anyhow::Context;
use clap::Parser;
use routecodex_gateway::{router, GatewayState, SHUTDOWN_DRAIN};
use routecodex_router::RouterState;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ConfigAction};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Config {
            action: ConfigAction::Validate { user_config, system_config },
        } => {
            match routecodex_config::resolve(&user_config, &system_config) {
                Ok((_config, warnings)) => {
                    for warning in &warnings {
                        println!("warning: {warning}");
                    }
                    println!("config is valid");
                    Ok(())
                }
                Err(err) => {
                    eprintln!("config is invalid: {err}");
                    std::process::exit(1);
                }
            }
        }
        Command::Serve { config, system_config, host, port, proxy } => {
            serve(config, system_config, host, port, proxy).await
        }
    }
}

async fn serve(
    config_path: std::path::PathBuf,
    system_config_path: std::path::PathBuf,
    host_override: Option<String>,
    port_override: Option<u16>,
    proxy: Option<String>,
) -> anyhow::Result<()> {
    let (mut config, warnings) = routecodex_config::resolve(&config_path, &system_config_path)
        .context("resolving configuration")?;
    for warning in &warnings {
        tracing::warn!(%warning, "config warning");
    }

    if let Some(host) = host_override {
        config.http_server.host = host;
    }
    if let Some(port) = port_override {
        config.http_server.port = port;
    }
    let api_key = config.http_server.api_key.clone();
    let bind = format!("{}:{}", config.http_server.host, config.http_server.port);

    let credentials = bootstrap::build_credential_pool(&config, proxy.as_deref()).await;
    let router_state = RouterState::new(config, credentials, Vec::new(), proxy);

    let (state, mut shutdown_rx) = GatewayState::new(router_state, api_key, config_path, system_config_path);

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&bind).await.context("binding listener")?;
    tracing::info!(%bind, "listening");

    // Graceful shutdown drains in-flight requests; the spawned task is a
    // hard backstop that forces the process down after `SHUTDOWN_DRAIN`
    // if something never finishes on its own.
    let mut force_exit_rx = shutdown_rx.clone();
    tokio::spawn(async move {
        let _ = force_exit_rx.changed().await;
        tokio::time::sleep(SHUTDOWN_DRAIN).await;
        tracing::warn!("forcing exit after shutdown drain window elapsed");
        std::process::exit(0);
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("shutdown requested, draining in-flight requests");
        })
        .await
        .context("serving")?;

    Ok(())
}
