//! `treatorhell serve` — Start the HTTP API server.

use treatorhell_config::AppConfig;

pub async fn run(
    mut config: AppConfig,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(host) = host_override {
        config.gateway.host = host;
    }
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {e}"))?;

    treatorhell_gateway::start(config).await
}
