pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    http::{header, HeaderValue, Method},
    routing::{get, patch, post, put},
};
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
};
use state::AppState;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    settings: Arc<Settings>,
) -> Router {
    let cors = cors_layer(&settings);
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        .nest("/api/payment", payment_routes(app_state.clone()))
        .nest("/campaigns", campaign_routes(app_state.clone()))
        .nest("/donations", donation_routes(app_state.clone()))
        .nest("/volunteers", volunteer_routes(app_state.clone()))

        // Add state to the router
        .with_state(app_state)

        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    match settings.cors.allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(origin = %settings.cors.allowed_origin, "Invalid CORS origin; cross-origin requests disabled");
            layer
        }
    }
}

fn payment_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Public webhook endpoint (no auth)
        .route("/webhook", post(handlers::payments::webhook))
        // Protected payment endpoints
        .merge(Router::new()
            .route("/create-order", post(handlers::payments::create_order))
            .route("/status/:order_id", get(handlers::payments::status))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                middleware::auth::require_auth,
            ))
        )
}

fn campaign_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Public routes (no auth required for viewing)
        .route("/", get(handlers::campaigns::list))
        .route("/:id", get(handlers::campaigns::get))
        // Admin routes
        .merge(Router::new()
            .route("/", post(handlers::campaigns::create))
            .route("/:id", put(handlers::campaigns::update))
            .route("/:id/ledger", get(handlers::campaigns::ledger))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                middleware::auth::require_admin,
            ))
        )
}

fn donation_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/my-donations", get(handlers::donations::my_donations))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ))
        .merge(Router::new()
            .route("/", get(handlers::donations::list))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                middleware::auth::require_admin,
            ))
        )
}

fn volunteer_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/apply", post(handlers::volunteers::apply))
        .route("/my-applications", get(handlers::volunteers::my_applications))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ))
        .merge(Router::new()
            .route("/applications", get(handlers::volunteers::list))
            .route("/:id/status", patch(handlers::volunteers::update_status))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                middleware::auth::require_admin,
            ))
        )
}
