use anyhow::Context;
use axum::{
    http::HeaderValue,
    middleware,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{api, spawn_limiter_pruning, AppState, LIMITER_PRUNE_INTERVAL};

pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let origin: HeaderValue = state
        .config
        .server
        .frontend_url
        .parse()
        .with_context(|| format!("invalid frontend origin {}", state.config.server.frontend_url))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    let app = Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health_check))
        .route(
            "/predict/:ticker",
            get(api::predict).route_layer(middleware::from_fn_with_state(state.clone(), api::rate_limit)),
        )
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(app)
}

pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port)
        .parse()
        .context("invalid server address")?;
    let _pruning = spawn_limiter_pruning(state.limiter.clone(), LIMITER_PRUNE_INTERVAL);
    let app = build_router(state)?;

    info!("Prediction API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
