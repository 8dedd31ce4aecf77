use axum::Router;

pub mod assets;
pub mod health;
pub mod notes;

pub fn create_router() -> Router {
    tracing::debug!("Creating application router");
    Router::new()
        .merge(notes::router())
        .merge(assets::router())
        .merge(health::router())
}
