use axum::{
    Router,
    http::header,
    response::IntoResponse,
    routing::get,
};

const MARKDOWN_PREVIEW_JS: &str = include_str!("../../assets/markdown_preview.js");
const APP_CSS: &str = include_str!("../../assets/app.css");
const CACHE_CONTROL: &str = "public, max-age=3600";

pub fn router() -> Router {
    Router::new()
        .route("/assets/markdown_preview.js", get(markdown_preview_js))
        .route("/assets/app.css", get(app_css))
}

async fn markdown_preview_js() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        MARKDOWN_PREVIEW_JS,
    )
}

async fn app_css() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        APP_CSS,
    )
}
