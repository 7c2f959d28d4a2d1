use std::net::SocketAddr;

use anyhow::{Context, Result};
use ax_architect::mock::{MockBehavior, MockGateway, COMPLETIONS_PATH};
use tracing_subscriber::EnvFilter;

/// Behaviour comes from the environment:
/// - `MOCK_GATEWAY_PORT` (default 8081)
/// - `MOCK_GATEWAY_STATUS` forces every answer to that status (e.g. 429)
/// - `MOCK_GATEWAY_EMPTY=1` answers 200 with no content and no tool call
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ax_architect=info")),
        )
        .init();

    let port = std::env::var("MOCK_GATEWAY_PORT")
        .unwrap_or_else(|_| "8081".to_string())
        .parse::<u16>()
        .context("MOCK_GATEWAY_PORT must be a port number")?;

    let behavior = match std::env::var("MOCK_GATEWAY_STATUS") {
        Ok(status) => MockBehavior::Fail {
            status: status
                .parse()
                .context("MOCK_GATEWAY_STATUS must be an HTTP status code")?,
            body: r#"{"error":"mock gateway failure"}"#.to_string(),
        },
        Err(_) if std::env::var("MOCK_GATEWAY_EMPTY").is_ok_and(|v| v == "1") => {
            MockBehavior::Empty
        }
        Err(_) => MockBehavior::default(),
    };

    let mock = MockGateway::new(behavior.clone());
    let addr = mock
        .spawn(SocketAddr::from(([0, 0, 0, 0], port)))
        .await?;

    tracing::info!(?behavior, "Mock gateway listening on http://{addr}{COMPLETIONS_PATH}");
    tracing::info!(
        "Point the service at it with AX_GATEWAY_URL=http://127.0.0.1:{port}{COMPLETIONS_PATH}"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!(calls = mock.calls(), "Mock gateway shutting down");
    Ok(())
}
