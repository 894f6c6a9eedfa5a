use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    models::session::{SessionData, SessionToken},
    services::access::{ensure_role, ADMIN_ONLY},
    state::AppState,
};

const SESSION_EXPIRED: &str = "Session expired. Please login again.";

pub async fn auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (token, session) = authenticate_request(&state, request.headers())?;
    request.extensions_mut().insert(session);
    request.extensions_mut().insert(token);
    Ok(next.run(request).await)
}

// Auth + require admin role for admin-only routes
pub async fn auth_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (token, session) = authenticate_request(&state, request.headers())?;
    ensure_role(&session, ADMIN_ONLY)?;
    request.extensions_mut().insert(session);
    request.extensions_mut().insert(token);
    Ok(next.run(request).await)
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then_some(token)
}

fn authenticate_request(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(SessionToken, SessionData), AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token)
        .ok_or_else(|| AppError::Unauthorized(SESSION_EXPIRED.to_string()))?;

    let session = state
        .sessions
        .validate(token)
        .ok_or_else(|| AppError::Unauthorized(SESSION_EXPIRED.to_string()))?;

    Ok((SessionToken(token.to_string()), session))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(parse_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(parse_bearer_token("bearer   abc "), Some("abc"));
        assert_eq!(parse_bearer_token("Basic abc"), None);
        assert_eq!(parse_bearer_token("Bearer "), None);
        assert_eq!(parse_bearer_token("abc"), None);
    }
}
