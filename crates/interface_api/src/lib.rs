//! HTTP API Layer
//!
//! REST API for editing service billing collections, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: search, fetch, collection update, audit history, import, reports
//! - **Middleware**: bearer-token authentication and request logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(pool, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware as axum_middleware,
};
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use domain_billing::{BillingQueryService, BillingRecordEditor, BillingStore, CredentialStore};
use infra_db::{DatabasePool, PostgresBillingStore, PostgresCredentialStore};

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, request_log_middleware};
use crate::handlers::{auth as auth_handlers, billing, health, reports};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn BillingStore>,
    pub editor: BillingRecordEditor,
    pub queries: BillingQueryService,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn BillingStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            config,
            editor: BillingRecordEditor::new(store.clone()),
            queries: BillingQueryService::new(store.clone()),
            store,
            credentials,
        }
    }
}

/// Creates the main API router backed by PostgreSQL
///
/// # Arguments
///
/// * `pool` - Database connection pool
/// * `config` - API configuration
pub fn create_router(pool: DatabasePool, config: ApiConfig) -> Router {
    let store = Arc::new(PostgresBillingStore::new(pool.clone()));
    let credentials = Arc::new(PostgresCredentialStore::new(pool));
    create_router_with_stores(config, store, credentials)
}

/// Creates the API router over any store implementation
pub fn create_router_with_stores(
    config: ApiConfig,
    store: Arc<dyn BillingStore>,
    credentials: Arc<dyn CredentialStore>,
) -> Router {
    let state = AppState::new(config, store, credentials);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api/v1/auth/login", post(auth_handlers::login));

    let billing_routes = Router::new()
        .route("/", get(billing::search))
        .route("/import", post(billing::import))
        .route("/:dealer_code/:gst_invoice_no", get(billing::get_record))
        .route("/:dealer_code/:gst_invoice_no/collection", put(billing::update_collection))
        .route("/:dealer_code/:gst_invoice_no/audit", get(billing::history));

    let report_routes = Router::new()
        .route("/outstanding", get(reports::outstanding))
        .route("/daily-summary", get(reports::daily_summary));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/billing", billing_routes)
        .nest("/reports", report_routes)
        .layer(axum_middleware::from_fn(request_log_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
