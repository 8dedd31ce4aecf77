use axum::{
    async_trait,
    body::to_bytes,
    extract::{FromRequest, Request},
    http::{HeaderMap, header::CONTENT_TYPE},
};
use serde::de::DeserializeOwned;

use crate::errors::AppError;

pub const MAX_BODY_SIZE_BYTES: usize = 256 * 1024; // 256 KiB upper bound for form bodies

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Urlencoded form extractor. Unlike `axum::Form` it insists on the form
/// content type, caps the body, and reports which field failed to parse.
#[derive(Debug)]
pub struct ValidatedForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedForm<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        validate_content_type(&parts.headers)?;

        let body_bytes = to_bytes(body, MAX_BODY_SIZE_BYTES)
            .await
            .map_err(|err| AppError::InvalidForm(format!("failed to read request body: {err}")))?;

        parse_form(&body_bytes).map(ValidatedForm)
    }
}

pub fn parse_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    let deserializer = serde_urlencoded::Deserializer::new(form_urlencoded::parse(body));

    serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let error = err.into_inner();
        let message = if path.is_empty() || path == "." {
            error.to_string()
        } else {
            format!("{path}: {error}")
        };
        AppError::InvalidForm(message)
    })
}

fn validate_content_type(headers: &HeaderMap) -> Result<(), AppError> {
    if let Some(value) = headers.get(CONTENT_TYPE)
        && let Ok(value) = value.to_str()
        && value
            .trim_start()
            .get(..FORM_CONTENT_TYPE.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(FORM_CONTENT_TYPE))
    {
        return Ok(());
    }

    Err(AppError::UnsupportedMediaType)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;
    use crate::models::note::NoteInput;

    #[test]
    fn test_parses_allowed_fields() {
        let input: NoteInput = parse_form(b"title=My+Test+Note&content=%23+Hello").unwrap();
        assert_eq!(input, NoteInput::new("My Test Note", "# Hello"));
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let input: NoteInput = parse_form(b"title=Only+title").unwrap();
        assert_eq!(input.content, "");
    }

    #[test]
    fn test_rejects_server_managed_fields() {
        let err = parse_form::<NoteInput>(b"title=t&content=c&created_at=2020-01-01").unwrap_err();
        assert!(matches!(err, AppError::InvalidForm(message) if message.contains("created_at")));
    }

    #[test]
    fn test_content_type_must_be_form() {
        let mut headers = HeaderMap::new();
        assert!(validate_content_type(&headers).is_err());

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(validate_content_type(&headers).is_err());

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"),
        );
        assert!(validate_content_type(&headers).is_ok());
    }

    #[test]
    fn test_content_type_ignores_case() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("Application/X-WWW-Form-Urlencoded"),
        );
        assert!(validate_content_type(&headers).is_ok());
    }
}
