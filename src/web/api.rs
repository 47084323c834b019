use axum::{
    extract::{ConnectInfo, Path, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::{ApiError, ApiResult, AppState};
use crate::engine::Prediction;
use crate::types::Ticker;

pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "online",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "predict": "/predict/{ticker}",
            "health": "/health"
        }
    }))
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let store = state.context.store();
    let cached = store.cached_tickers().map(|t| t.len()).unwrap_or(0);

    Json(json!({
        "status": "healthy",
        "pipelines": {
            "volatility": "loaded",
            "sentiment": "loaded"
        },
        "oracle": state.context.sentiment.oracle_name(),
        "store": store.describe(),
        "cached_tickers": cached
    }))
}

pub async fn predict(State(state): State<AppState>, Path(raw): Path<String>) -> ApiResult<Json<Prediction>> {
    let request_id = Uuid::new_v4();
    let span = info_span!("predict", %request_id, ticker = %raw.trim());

    async move {
        let ticker = Ticker::parse(&raw)?;
        let started = Instant::now();
        info!("Processing prediction request for {}", ticker);

        let prediction = state
            .context
            .predict(&ticker)
            .await
            .map_err(|e| ApiError::from_forecast(&ticker, e))?;

        if let Some(err) = &prediction.sentiment.error {
            warn!("Sentiment analysis failed for {}: {}", ticker, err);
        }
        info!("{} prediction completed in {:.2}s", ticker, started.elapsed().as_secs_f64());

        Ok::<_, ApiError>(Json(prediction))
    }
    .instrument(span)
    .await
}

/// Per-IP quota for the prediction route.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if state.limiter.check_key(&ip).is_err() {
        warn!("Rate limit exceeded for {}", ip);
        return ApiError::RateLimited(state.rate_limit_per_minute()).into_response();
    }

    next.run(request).await
}
