use anyhow::Context;

use cutlery_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    cutlery_observability::init_with(config.logging.format);

    let services = cutlery_api::app::build_services(&config)
        .await
        .context("failed to initialise inventory store")?;
    let app = cutlery_api::app::build_app(std::sync::Arc::new(services));

    let addr = config
        .socket_addr()
        .map_err(anyhow::Error::msg)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
