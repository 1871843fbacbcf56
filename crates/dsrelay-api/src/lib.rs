pub mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::ApiState;

/// Largest `/store` body accepted. A client reports itself, the players it
/// can see, and the online IDs it knows about.
const STORE_BODY_LIMIT: usize = 1024 * 1024;

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/store",
            post(handlers::handle_store).layer(DefaultBodyLimit::max(STORE_BODY_LIMIT)),
        )
        .route("/list", get(handlers::handle_list))
        .route("/status", get(handlers::handle_status))
        .route("/get_watch", get(handlers::handle_get_watch))
        .with_state(state)
        .layer(cors)
}

pub async fn serve(state: ApiState, listen_addr: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", listen_addr, port)).await?;
    tracing::info!(addr = listen_addr, port, "API listening");
    axum::serve(listener, app).await?;
    Ok(())
}
