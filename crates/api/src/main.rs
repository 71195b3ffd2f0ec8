use anyhow::Context;

use carhub_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    carhub_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let app = carhub_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        application = %config.application_name,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
