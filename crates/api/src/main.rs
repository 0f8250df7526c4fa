use anyhow::Context;
use chrono::Utc;

use yamdb_api::app::{build_app, services::build_services};
use yamdb_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("invalid configuration")?;
    yamdb_observability::init(config.log_format);

    if config.insecure_secret {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let services = build_services(&config)
        .await
        .context("failed to initialise storage")?;

    if let Some(admin) = &config.bootstrap_admin {
        services
            .identity
            .ensure_superuser(admin.username.clone(), admin.email.clone(), Utc::now())
            .await
            .context("failed to bootstrap superuser")?;
    }

    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
