pub mod respond;
pub mod routes;

use crate::state::AppState;
use axum::routing::{get, post};
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/stocks", get(routes::stocks))
        .route("/api/cointegration-test", post(routes::cointegration_test))
        .route("/api/trading-signals", post(routes::trading_signals))
        .route("/api/backtest", post(routes::backtest))
        .route("/api/counters", get(routes::counters))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}
