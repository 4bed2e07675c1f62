//! HTTP surface.
//!
//! Handlers are thin: they extract the caller and the payload, check the role
//! gate and delegate to [`crate::core`]. All routes live under `/api`.

pub mod auth;
pub mod error;
pub mod extract;
pub mod invoices;
pub mod payments;
pub mod products;
pub mod state;
pub mod subscriptions;

pub use state::AppState;

use crate::errors::Result;
use axum::{
    Router,
    extract::State,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{get, patch, post},
};
use serde::Serialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

/// Response of `GET /api/health`
#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health(State(state): State<AppState>) -> Result<extract::ApiJson<Health>> {
    state.db.ping().await?;
    Ok(extract::ApiJson(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

fn cors(state: &AppState) -> CorsLayer {
    let origins = state
        .config
        .allowed_origins()
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/profile", get(auth::profile))
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/products/{id}/variants", post(products::add_variant))
        .route(
            "/products/{id}/variants/{variant_id}",
            patch(products::set_stock),
        )
        .route("/invoices", get(invoices::list).post(invoices::create))
        .route("/invoices/stats", get(invoices::stats))
        .route("/invoices/{id}", get(invoices::get))
        .route("/invoices/{id}/cancel", patch(invoices::cancel))
        .route("/subscriptions/planes", get(subscriptions::plans))
        .route("/subscriptions/actual", get(subscriptions::current))
        .route("/subscriptions/cambiar-plan", post(subscriptions::change_plan))
        .route("/subscriptions/historial-pagos", get(subscriptions::history))
        .route("/subscriptions/cancelar", post(subscriptions::cancel))
        .route("/payments/create-intent", post(payments::create_intent))
        .route("/payments/transaction/{id}", get(payments::transaction))
        .route("/payments/webhook/wompi", post(payments::webhook))
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new().nest("/api", api_routes());

    if !state.config.environment.is_production() {
        app = app.layer(middleware::from_fn(error::expose_internal_errors));
    }

    app.layer(cors(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
