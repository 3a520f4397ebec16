use helmsman_server::{AppState, app, config::ServerConfig, logging};

#[tokio::main]
async fn main() {
    let config = ServerConfig::load().expect("failed to load configuration");
    logging::init(&config.logging).expect("invalid logging configuration");
    tracing::info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        cache = ?config.conversation_cache.kind,
        "Loaded configuration"
    );

    let state = AppState::from_config(&config).expect("failed to build model backend");

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
