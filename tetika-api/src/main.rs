mod routes;

use std::net::SocketAddr;
use std::time::Duration;
use tetika_app::AppContext;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let app_context = match AppContext::from_env() {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };

    spawn_session_cleanup(app_context.clone());

    let addr = app_context.config.bind_addr.clone();
    let app = routes::router(app_context.clone()).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new()),
    );

    tracing::info!("Listening on http://{}", addr);
    tracing::info!(
        "Sessions expire after {}h, scrape timeout {}s, session timeout {}s",
        app_context.config.session_max_age_hours,
        app_context.config.scrape_timeout.as_secs(),
        app_context.config.session_timeout.as_secs()
    );

    let listener = tokio::net::TcpListener::bind(&addr).await.inspect_err(|e| {
        tracing::error!("Failed to bind {}: {}", addr, e);
    })?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

fn spawn_session_cleanup(ctx: AppContext) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ctx.config.cleanup_interval.max(Duration::from_secs(1)));
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = ctx.sessions.cleanup_old_sessions(ctx.config.session_max_age_hours);
            if removed > 0 {
                tracing::info!("Removed {} expired sessions", removed);
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
