//! Server-rendered HTML. Every dynamic value passes through [`escape_html`]
//! unless it is already-sanitized Markdown output.

pub mod notes;

use axum::http::StatusCode;

use crate::flash::Notice;

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn layout(title: &str, notice: Option<Notice>, body: &str) -> String {
    let notice_html = notice
        .map(|notice| {
            format!(
                r#"<p class="notice" role="status">{}</p>"#,
                escape_html(notice.message())
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · mdnotes</title>
<link rel="stylesheet" href="/assets/app.css">
<script src="/assets/markdown_preview.js" defer></script>
</head>
<body>
<header class="site-header"><a href="/notes">mdnotes</a></header>
<main>
{notice_html}
{body}
</main>
</body>
</html>
"#,
        title = escape_html(title),
    )
}

pub fn error_page(status: StatusCode, message: &str, details: Option<&str>) -> String {
    let heading = status.canonical_reason().unwrap_or("Error");
    let details_html = details
        .map(|details| format!(r#"<pre class="error-details">{}</pre>"#, escape_html(details)))
        .unwrap_or_default();

    let body = format!(
        r#"<section class="error">
<h1>{code} {heading}</h1>
<p>{message}</p>
{details_html}
<p><a href="/notes">Back to notes</a></p>
</section>"#,
        code = status.as_u16(),
        heading = escape_html(heading),
        message = escape_html(message),
    );

    layout(heading, None, &body)
}
