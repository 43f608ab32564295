use axum::{
    body::Body,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use rehearse_identity::AuthenticatedUser;
use std::sync::Arc;

use crate::api::ApiError;
use crate::AppState;

/// Wrapper for the verified caller, stored in request extensions.
#[derive(Clone, Debug)]
pub struct UserContext(pub AuthenticatedUser);

fn authenticate(req: &Request<Body>) -> Result<Option<AuthenticatedUser>, ApiError> {
    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or_else(|| ApiError::InternalServerError("app state missing".to_string()))?;

    let headers = req.headers();
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok());

    Ok(state.sessions.authenticate(authorization, cookie))
}

/// Requires a verified session; responds `401` otherwise.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let user = authenticate(&req)?.ok_or(ApiError::Unauthorized)?;
    req.extensions_mut().insert(UserContext(user));
    Ok(next.run(req).await)
}

/// Attaches the caller when a valid session is present. Missing or invalid
/// sessions proceed anonymously.
pub async fn optional_auth_middleware(
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(user) = authenticate(&req)? {
        req.extensions_mut().insert(UserContext(user));
    }
    Ok(next.run(req).await)
}
