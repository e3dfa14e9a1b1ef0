//! Request guards: caller identity, the admin gate and per-IP rate
//! limiting.
//!
//! Identity is the `X-User-Id` header. Token verification happens in front
//! of this service.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use crate::app_state::AppState;
use crate::error::MarketError;

/// Header carrying the authenticated user ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Key used when a request carries no address at all.
const UNKNOWN_CLIENT: &str = "unknown";

/// Authenticated caller. Rejects with 401 when the header is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for CallerId {
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .ok_or_else(|| MarketError::Unauthorized("missing X-User-Id header".to_string()))
    }
}

/// Caller with `is_admin = 1`. Rejects with 401 without identity and 403
/// for everyone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCaller(pub String);

impl FromRequestParts<AppState> for AdminCaller {
    type Rejection = MarketError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CallerId(id) = CallerId::from_request_parts(parts, state).await?;
        if state.users.is_admin(&id).await? {
            Ok(Self(id))
        } else {
            tracing::warn!(user_id = %id, "admin route refused");
            Err(MarketError::Forbidden("admin privileges required".to_string()))
        }
    }
}

/// Rejects the request with 429 once its client used up the window.
///
/// # Errors
///
/// Returns [`MarketError::RateLimited`] when the client is over quota.
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, MarketError> {
    let key = client_key(&req);
    if let Err(e) = state.rate_limiter.check(&key).await {
        tracing::warn!(client = %key, "rate limit exceeded");
        return Err(e);
    }
    Ok(next.run(req).await)
}

/// Peer address, else the first `X-Forwarded-For` hop, else a shared key.
fn client_key(req: &Request) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| UNKNOWN_CLIENT.to_string(), ToString::to_string)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(headers: &[(&str, &str)]) -> Request {
        let mut builder = Request::builder().uri("/api/items");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let Ok(req) = builder.body(Body::empty()) else {
            panic!("request should build");
        };
        req
    }

    #[test]
    fn peer_address_wins_over_forwarded_header() {
        let mut req = request(&[("x-forwarded-for", "203.0.113.9")]);
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 51000))));
        assert_eq!(client_key(&req), "10.0.0.7");
    }

    #[test]
    fn first_forwarded_hop_is_used() {
        let req = request(&[("x-forwarded-for", "203.0.113.9, 10.0.0.1")]);
        assert_eq!(client_key(&req), "203.0.113.9");
        assert_eq!(client_key(&request(&[])), UNKNOWN_CLIENT);
    }

    #[tokio::test]
    async fn caller_id_requires_header() {
        let (mut parts, _body) = request(&[]).into_parts();
        assert!(matches!(
            CallerId::from_request_parts(&mut parts, &()).await,
            Err(MarketError::Unauthorized(_))
        ));

        let (mut parts, _body) = request(&[(USER_ID_HEADER, " u1 ")]).into_parts();
        assert_eq!(
            CallerId::from_request_parts(&mut parts, &()).await.ok(),
            Some(CallerId("u1".to_string()))
        );
    }
}
