use anyhow::Context;
use tower_http::cors::CorsLayer;

use sitecraft::api::{AppState, app_routes};
use sitecraft::config::AppConfig;
use sitecraft::wizard::spawn_prune_task;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("Invalid SITECRAFT_* configuration")?;

    eprintln!("🧱 sitecraft v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api/wizard", config.port);
    eprintln!("   Backend: {}", config.backend_url);
    eprintln!("   Payments: {}", config.payment_url);
    eprintln!("   Identity: {}", config.auth_url);
    eprintln!(
        "   Sessions: idle timeout {}m, swept every {}s\n",
        config.session_idle_timeout.as_secs() / 60,
        config.prune_interval.as_secs()
    );

    let state = AppState::from_config(&config).context("Failed to set up HTTP clients")?;

    // Discard abandoned wizards in the background
    let _prune_handle = spawn_prune_task(
        state.wizard.clone(),
        config.prune_interval,
        config.session_idle_timeout,
    );

    let app = app_routes(state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "sitecraft API started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("sitecraft API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
