use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use toolgate::config::Config;
use toolgate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    dotenvy::dotenv().ok();

    // Diagnostics go to stderr; they are informational only.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }

    // Fail fast: no server object exists until configuration is complete.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => anyhow::bail!("configuration error: {e}"),
    };

    tracing::info!(
        "federation: '{}' at {} ({} mode)",
        config.upstream.name,
        config.upstream.url,
        config.mode.as_str()
    );

    let state = AppState::new(config);

    // `import` snapshots the upstream tool set before serving begins and
    // aborts startup if discovery fails; `mount` attaches without I/O.
    if let Err(e) = state.federation.attach().await {
        anyhow::bail!("federation attach failed: {e}");
    }

    let app = toolgate::create_router(state.clone())
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        );

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], state.config.port));
    tracing::info!("ToolGate listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {},
            _ = sigterm.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
