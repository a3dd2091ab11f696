use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use teamspace_audit::RequestOrigin;
use teamspace_auth::{Claims, TokenCodec};
use teamspace_core::DomainError;

use crate::app::errors;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenCodec>,
}

/// Bearer-token gate for every route that needs an authenticated caller.
///
/// On success the decoded [`Claims`] and the caller's [`RequestOrigin`] are
/// inserted as request extensions for handlers to pick up.
pub async fn require_auth(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let claims = match authenticate(&state, req.headers()) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };
    let origin = client_origin(req.headers());

    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(origin);

    next.run(req).await
}

fn authenticate(state: &AuthState, headers: &HeaderMap) -> Result<Claims, Response> {
    let token = bearer_token(headers).ok_or_else(|| {
        errors::json_error(StatusCode::UNAUTHORIZED, "Not authorized, no token")
    })?;

    state
        .tokens
        .verify(token)
        .map_err(|err| errors::domain_error_response(&DomainError::from(err)))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;

    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }

    Some(token)
}

/// Best-effort client address: first hop of `x-forwarded-for` if present.
pub fn client_origin(headers: &HeaderMap) -> RequestOrigin {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|hop| hop.trim().to_string())
        .filter(|hop| !hop.is_empty());

    RequestOrigin { ip }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_requires_the_scheme_prefix() {
        assert_eq!(
            bearer_token(&headers_with("authorization", "Bearer abc.def.ghi")),
            Some("abc.def.ghi")
        );
        assert_eq!(
            bearer_token(&headers_with("authorization", "Basic abc")),
            None
        );
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn blank_bearer_token_is_rejected() {
        assert_eq!(bearer_token(&headers_with("authorization", "Bearer   ")), None);
    }

    #[test]
    fn client_origin_takes_the_first_forwarded_hop() {
        let origin = client_origin(&headers_with(
            "x-forwarded-for",
            "203.0.113.9, 10.0.0.1",
        ));
        assert_eq!(origin.ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn client_origin_is_empty_without_proxy_headers() {
        assert_eq!(client_origin(&HeaderMap::new()).ip, None);
    }
}
