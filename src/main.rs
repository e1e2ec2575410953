//! # Vesting Analyzer
//!
//! HTTP service that scores how much a contract looks like a token vesting contract. See the
//! crate [README](../README.md) for the endpoints and configuration.
use std::{net::TcpListener, sync::Arc};
use vesting_analyzer::{
    analysis::Analyzer,
    config::{self, GatewayConfig},
    gateway::EthereumGateway,
    startup, telemetry,
};

/// Entrypoint for the application.
#[tokio::main]
async fn main() -> hyper::Result<()> {
    let subscriber =
        telemetry::get_subscriber("vesting-analyzer".into(), "info".into(), std::io::stdout);
    telemetry::init_subscriber(subscriber);

    let configuration = config::get_configuration().expect("Failed to read configuration.");
    let gateway_config =
        GatewayConfig::from_env(&configuration.analysis).expect("Invalid gateway configuration.");
    let gateway = EthereumGateway::new(&gateway_config).expect("Failed to build gateway.");

    match gateway.latest_block().await {
        Ok(block) => tracing::info!(network = %gateway.network(), block, "Connected"),
        Err(e) => {
            tracing::warn!(network = %gateway.network(), error = %e, "RPC endpoint unreachable")
        }
    }

    let analyzer =
        Analyzer::new(Arc::new(gateway)).with_rate_limit(configuration.analysis.rate_limit());

    let address = format!("{}:{}", configuration.application.host, configuration.application.port);
    tracing::info!("Listening on {}", address);
    let listener = TcpListener::bind(address).expect("Unable to bind to port");
    startup::run(listener, analyzer)?.await
}
