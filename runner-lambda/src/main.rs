use echo_core::adapter;
use echo_core::config::{self, EchoConfig};
use echo_core::telemetry;
use lambda_http::{Body, Request, Response, service_fn};
use lambda_runtime::Error;

const DEFAULT_LOG_FILTER: &str = "echo_core=info,runner_lambda=info";

/// Entry point for running the demo endpoint behind a function gateway
/// (API Gateway REST/HTTP APIs or a function URL).
///
/// Config comes from the environment once per cold start; every invocation
/// is then translated by the adapter and answered independently.
#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = startup(config::load_config(None))?;
    let config = &config;
    lambda_http::run(service_fn(move |request: Request| async move {
        function_handler(request, config).await
    }))
    .await
}

/// Installs tracing before anything is logged: with the configured filter
/// when the config loaded, with the default one when it did not.
fn startup(loaded: echo_core::Result<EchoConfig>) -> Result<EchoConfig, Error> {
    match loaded {
        Ok(config) => {
            let filter = config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
            telemetry::init_function_tracing(filter);
            tracing::info!(cors = config.cors.enabled, "Function runtime starting");
            Ok(config)
        }
        Err(e) => {
            telemetry::init_function_tracing(DEFAULT_LOG_FILTER);
            tracing::error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}

async fn function_handler(
    request: Request,
    config: &EchoConfig,
) -> Result<Response<Body>, Error> {
    Ok(adapter::adapt(&request, config)?)
}
