use engine::LoopConfig;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;
use crate::connection::{ConnectError, ConnectionManager, WsTransport};
use crate::session::Session;

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error("invalid client configuration: {0}")]
    Config(#[from] url::ParseError),
    #[error(transparent)]
    Connect(#[from] ConnectError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) session: Session<WsTransport>,
}

/// Connects before the window opens; a server that cannot be reached is a startup
/// failure, not an empty window.
pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Mirror Startup ===");

    let client = ClientConfig::from_env()?;
    info!(
        url = %client.server_url,
        variant = client.variant.as_str(),
        outbound = client.outbound.as_str(),
        overlay = client.overlay_visible,
        "client_config"
    );

    let transport = WsTransport::connect(&client.server_url)?;
    let session = Session::new(
        ConnectionManager::new(transport),
        client.variant,
        client.outbound,
    );
    let config = LoopConfig {
        window_title: client.window_title,
        overlay_visible: client.overlay_visible,
        ..LoopConfig::default()
    };

    Ok(AppWiring { config, session })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
