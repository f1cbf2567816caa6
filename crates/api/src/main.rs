use anyhow::Context;

use prodigo_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    prodigo_observability::init();

    let config = ApiConfig::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    let services = prodigo_api::app::services::build_services(&config).await?;
    let app = prodigo_api::app::build_app(services, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => {
            // Without a signal handler, keep serving until killed.
            tracing::error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
