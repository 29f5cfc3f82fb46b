/// Token extraction and session cookies
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Extract the access token, preferring the session cookie over the
/// Authorization header
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    token_from(headers, ACCESS_COOKIE)
}

/// Extract the refresh token, preferring the session cookie over the
/// Authorization header
pub fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    token_from(headers, REFRESH_COOKIE)
}

fn token_from(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        return Some(cookie.value().to_string());
    }

    extract_bearer_token(headers)
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(str::to_string))
}

/// Build a session cookie. Cookies are http-only and cross-site capable so
/// a browser client on another origin can hold the session.
pub fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .build()
}

/// Remove both session cookies from the jar
pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(session_cookie(ACCESS_COOKIE, String::new()))
        .remove(session_cookie(REFRESH_COOKIE, String::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc123"));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn cookie_takes_precedence_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("accessToken=from-cookie"),
        );
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );

        assert_eq!(
            extract_access_token(&headers).as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn falls_back_to_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );

        assert_eq!(
            extract_refresh_token(&headers).as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie(ACCESS_COOKIE, "token".to_string());
        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.path(), Some("/"));
    }
}
