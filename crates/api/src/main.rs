use anyhow::Context;

use wms_infra::WmsConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wms_observability::init();

    let config = WmsConfig::from_env().context("reading configuration")?;
    let bind_addr = config.bind_addr.clone();

    let app = wms_api::app::build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
