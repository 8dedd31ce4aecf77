#![allow(dead_code)]

use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use mdnotes::{build_app, config::DatabaseConfig, db, store::NoteStore};
use tempfile::TempDir;
use tower::ServiceExt;

/// A store over a fresh migrated SQLite file. Keep the `TempDir` alive for
/// as long as the store is in use.
pub async fn test_store() -> (TempDir, NoteStore) {
    test_store_with_pool_size(2).await
}

pub async fn test_store_with_pool_size(pool_max_size: u32) -> (TempDir, NoteStore) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let url = dir
        .path()
        .join("notes.sqlite3")
        .to_string_lossy()
        .into_owned();

    db::run_migrations(&url).await.expect("run migrations");
    let pool = db::establish_pool(&DatabaseConfig {
        url,
        pool_max_size,
        connection_timeout: Duration::from_secs(5),
    })
    .await
    .expect("open pool");

    (dir, NoteStore::new(pool))
}

pub async fn test_app() -> (TempDir, NoteStore, Router) {
    let (dir, store) = test_store().await;
    let app = build_app(store.clone());
    (dir, store, app)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("infallible router")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn form(method: &str, uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let body = serde_urlencoded::to_string(fields).unwrap();
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn header_str<'a>(response: &'a Response<Body>, name: header::HeaderName) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// The `name=value` part of the response's Set-Cookie header.
pub fn cookie_pair(response: &Response<Body>) -> String {
    header_str(response, header::SET_COOKIE)
        .split(';')
        .next()
        .unwrap_or_default()
        .to_string()
}
