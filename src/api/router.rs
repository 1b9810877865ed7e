use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_auth;
use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes, no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes, require Bearer token when API_TOKEN is set
    let protected = Router::new()
        // Portfolio
        .route("/api/portfolio", get(handlers::portfolio::get_portfolio))
        .route("/api/portfolio/sync", post(handlers::portfolio::sync))
        // Orders
        .route("/api/orders", get(handlers::orders::list))
        .route("/api/orders/sync", post(handlers::orders::sync))
        .route(
            "/api/orders/:id",
            put(handlers::orders::edit),
        )
        .route("/api/orders/:id/cancel", post(handlers::orders::cancel))
        // Position risk management
        .route("/api/positions/:id/sell", post(handlers::trading::market_sell))
        .route(
            "/api/positions/:id/take-profit",
            post(handlers::trading::set_take_profit)
                .delete(handlers::trading::cancel_take_profit),
        )
        .route(
            "/api/positions/:id/stop-loss",
            post(handlers::trading::set_stop_loss)
                .delete(handlers::trading::remove_stop_loss),
        )
        // Markets
        .route(
            "/api/markets/:token_id/price-history",
            get(handlers::markets::price_history),
        )
        // Settings
        .route(
            "/api/settings/credentials",
            get(handlers::settings::get_credentials)
                .put(handlers::settings::update_credentials),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // CORS: allow same-origin + common dashboard origins
    let cors = CorsLayer::new()
        .allow_origin(Any) // nginx proxies from same origin; direct API access needs token
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
