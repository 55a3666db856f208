use anyhow::{Context, Result};
use clap::Parser;
use echo_core::config::{self, EchoConfig};
use echo_core::{server, telemetry};
use std::time::Duration;

const BIND_ATTEMPTS: u32 = 5;
const BIND_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Standalone server for the demo endpoint, for container hosting services
/// (ECS, EKS, plain Docker) or local development.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// YAML config file; falls back to ECHO_CONFIG and friends when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Override the listen host.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Attach a permissive cross-origin policy to every response.
    #[arg(long)]
    cors: bool,
}

impl Args {
    fn apply(&self, config: &mut EchoConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.cors {
            config.cors.enabled = true;
        }
    }
}

/// Load config, bind, serve until a shutdown signal arrives.
/// A port still held by a previous instance is retried a few times before
/// giving up; any other startup error is fatal.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config =
        config::load_config(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    telemetry::init_tracing(
        config
            .log_filter
            .as_deref()
            .unwrap_or("echo_core=info,runner_container=info,tower_http=info"),
    );

    let mut attempt = 1;
    let listener = loop {
        match server::bind(&config).await {
            Ok(listener) => break listener,
            Err(e) if !e.is_fatal() && attempt < BIND_ATTEMPTS => {
                tracing::warn!(
                    "Bind to {} failed (attempt {}/{}), will retry: {}",
                    config.bind_address(),
                    attempt,
                    BIND_ATTEMPTS,
                    e
                );
                attempt += 1;
                tokio::time::sleep(BIND_RETRY_DELAY).await;
            }
            Err(e) => {
                tracing::error!("A fatal error occurred: {}", e);
                let addr = config.bind_address();
                return Err(e).with_context(|| format!("Failed to bind {addr}"));
            }
        }
    };

    server::serve(listener, &config, server::shutdown_signal())
        .await
        .context("Server terminated abnormally")
}
