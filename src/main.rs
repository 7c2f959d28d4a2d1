use std::net::SocketAddr;

use anyhow::{bail, Context, Result};
use ax_architect::config::Config;
use ax_architect::server::build_router;
use ax_architect::service::ArchitectService;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ax_architect=info,tower_http=info")),
        )
        .with_target(false)
        .init();

    let config = Config::load()?;

    if !config.has_credential() && config.server.require_credential {
        bail!("LOVABLE_API_KEY is not set and AX_REQUIRE_CREDENTIAL is on");
    }

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;

    let service = ArchitectService::from_config(&config)?;

    tracing::info!(
        %addr,
        gateway = %config.gateway.base_url,
        model = %config.gateway.model,
        configured = service.is_configured(),
        narrative = ?config.narrative.output,
        "AX architect service listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, build_router(service)).await?;

    Ok(())
}
