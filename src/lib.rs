pub mod config;
pub mod db;
pub mod errors;
pub mod flash;
pub mod logging;
pub mod markdown;
pub mod models;
pub mod routes;
pub mod schema;
pub mod security;
pub mod store;
pub mod views;

use axum::{Extension, Router, extract::DefaultBodyLimit, middleware};
use tower_http::trace::TraceLayer;

use crate::store::NoteStore;

/// The full application: routes, security headers, body cap, request
/// tracing and the shared note store.
pub fn build_app(store: NoteStore) -> Router {
    routes::create_router()
        .layer(middleware::from_fn(security::headers::set_security_headers))
        .layer(DefaultBodyLimit::max(security::form::MAX_BODY_SIZE_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(store))
}
