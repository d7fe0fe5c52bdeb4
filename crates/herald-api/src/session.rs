use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use herald_auth::TokenKeys;
use herald_types::api::Claims;

use crate::error::ApiError;
use crate::state::AppState;

/// Resolve an `Authorization` header value to the identity embedded in its token.
///
/// The identity is taken from the token as-is; the user is not looked up again.
pub fn authenticate_request(header: Option<&str>, keys: &TokenKeys) -> Result<Claims, ApiError> {
    let token = header
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Authentication token required"))?;

    keys.verify(token).map_err(|e| {
        debug!("Bearer token rejected: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })
}

/// Extract and validate the bearer token, then expose its `Claims` as a request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let claims = authenticate_request(header, &state.keys)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new("session-test", chrono::Duration::hours(1))
    }

    #[test]
    fn resolves_bearer_token() {
        let keys = keys();
        let header = format!("Bearer {}", keys.issue(3, "carol").unwrap());
        let claims = authenticate_request(Some(header.as_str()), &keys).unwrap();
        assert_eq!(claims.sub, 3);
        assert_eq!(claims.username, "carol");
    }

    #[test]
    fn missing_or_malformed_header_is_unauthorized() {
        let keys = keys();
        let token = keys.issue(3, "carol").unwrap();

        for header in [None, Some(""), Some("Bearer "), Some(token.as_str()), Some("Basic abc")] {
            let err = authenticate_request(header, &keys).unwrap_err();
            assert!(matches!(err, ApiError::Unauthorized(_)), "{header:?}");
        }
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let keys = TokenKeys::new("session-test", chrono::Duration::hours(-2));
        let header = format!("Bearer {}", keys.issue(3, "carol").unwrap());
        assert!(matches!(
            authenticate_request(Some(header.as_str()), &keys),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
