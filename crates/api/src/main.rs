use std::net::SocketAddr;

use anyhow::{Context, Result};
use shadow_api::{build_app, ShadowConfig};
use shadow_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("shadow_api");

    let config = ShadowConfig::from_env()?;
    let bind = config.bind_addr();

    let app = build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(
        bind = %bind,
        translate_url = %config.translate_url,
        search_url = %config.search_url,
        "shadow brain api started"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
