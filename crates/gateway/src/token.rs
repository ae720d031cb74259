//! Session token cookie handling.

use axum::http::{header, HeaderMap, HeaderValue};

/// Name of the cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Pull the session token out of the request's `Cookie` header(s).
///
/// Empty values are treated as absent.
pub fn from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name.trim() != TOKEN_COOKIE {
                return None;
            }
            let value = value.trim().trim_matches('"');
            let decoded = urlencoding::decode(value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string());
            Some(decoded)
        })
        .filter(|token| !token.is_empty())
}

/// `Set-Cookie` value for a fresh session: root path, no max-age.
pub fn session_cookie(token: &str) -> HeaderValue {
    let value = format!("{TOKEN_COOKIE}={}; Path=/", urlencoding::encode(token));
    HeaderValue::from_str(&value).unwrap_or_else(|_| clear_cookie())
}

/// `Set-Cookie` value that makes the client drop its session.
pub fn clear_cookie() -> HeaderValue {
    HeaderValue::from_static("token=; Max-Age=-1; Path=/")
}
