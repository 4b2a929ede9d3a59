mod handlers;

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{ routing::{ get, post }, Router };
use log::info;
use tower_http::cors::{ Any, CorsLayer };

use crate::cli::Args;
use crate::ratelimit::FixedWindowLimiter;
use crate::reply::ReplyGenerator;
use crate::store::ConversationStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConversationStore>,
    pub limiter: Arc<FixedWindowLimiter>,
    pub generator: Arc<dyn ReplyGenerator>,
    pub development: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        limiter: Arc<FixedWindowLimiter>,
        generator: Arc<dyn ReplyGenerator>,
        args: &Args
    ) -> Self {
        Self {
            store,
            limiter,
            generator,
            development: args.development,
            started_at: Instant::now(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/webhook", post(handlers::relay_webhook))
        .route("/webhook/conversations", get(handlers::list_conversations))
        .route(
            "/webhook/conversation/{id}",
            post(handlers::relay_to_conversation)
                .get(handlers::get_conversation)
                .delete(handlers::delete_conversation)
        )
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(axum::middleware::from_fn(handlers::log_request))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    addr: &str,
    state: AppState
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    info!("Starting HTTP relay server on: http://{}", addr);

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received, stopping server...");
}
