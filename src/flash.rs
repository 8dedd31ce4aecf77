use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header::COOKIE, request::Parts},
};
use std::convert::Infallible;

pub const FLASH_COOKIE: &str = "mdnotes_flash";
const FLASH_MAX_AGE_SECS: u32 = 60;

/// One-shot confirmation shown on the page a redirect lands on. Only the
/// code travels in the cookie, never the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Created,
    Updated,
    Deleted,
}

impl Notice {
    pub fn code(&self) -> &'static str {
        match self {
            Notice::Created => "created",
            Notice::Updated => "updated",
            Notice::Deleted => "deleted",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "created" => Some(Notice::Created),
            "updated" => Some(Notice::Updated),
            "deleted" => Some(Notice::Deleted),
            _ => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Notice::Created => "Note was successfully created.",
            Notice::Updated => "Note was successfully updated.",
            Notice::Deleted => "Note was successfully deleted.",
        }
    }

    pub fn set_cookie(&self) -> HeaderValue {
        cookie_header(self.code(), FLASH_MAX_AGE_SECS)
    }
}

pub fn clear_cookie() -> HeaderValue {
    cookie_header("", 0)
}

fn cookie_header(code: &str, max_age: u32) -> HeaderValue {
    let cookie = format!("{FLASH_COOKIE}={code}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax");
    // Codes are fixed ASCII words, so this never falls through.
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// The notice carried by the request's flash cookie, if any. The page that
/// renders it is responsible for clearing the cookie.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flash(pub Option<Notice>);

impl Flash {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let notice = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == FLASH_COOKIE)
            .and_then(|(_, code)| Notice::from_code(code.trim()));
        Self(notice)
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Flash::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_reads_notice_among_other_cookies() {
        let flash = Flash::from_headers(&headers_with_cookie("theme=dark; mdnotes_flash=updated"));
        assert_eq!(flash.0, Some(Notice::Updated));
    }

    #[test]
    fn test_unknown_code_is_ignored() {
        let flash = Flash::from_headers(&headers_with_cookie("mdnotes_flash=<script>"));
        assert!(!flash.is_present());
    }

    #[test]
    fn test_missing_cookie() {
        assert!(!Flash::from_headers(&HeaderMap::new()).is_present());
    }

    #[test]
    fn test_set_cookie_round_trips_code() {
        let value = Notice::Deleted.set_cookie();
        let cookie = value.to_str().unwrap();
        assert!(cookie.starts_with("mdnotes_flash=deleted;"));
        assert!(cookie.contains("HttpOnly"));
    }
}
