//! JWT Extractor
//!
//! Custom extractor for automatically validating JWT tokens

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use shared::AppError;

/// Locate the bearer token: Authorization header first, then the
/// `token` query parameter, then the `token` cookie.
fn find_token(parts: &Parts) -> Option<String> {
    if let Some(header) = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        return JwtService::extract_from_header(header).map(str::to_string);
    }

    if let Some(query) = parts.uri.query() {
        for pair in query.split('&') {
            if let Some(value) = pair.strip_prefix("token=")
                && !value.is_empty()
            {
                return Some(value.to_string());
            }
        }
    }

    if let Some(cookies) = parts
        .headers
        .get(http::header::COOKIE)
        .and_then(|h| h.to_str().ok())
    {
        for cookie in cookies.split(';') {
            if let Some(value) = cookie.trim().strip_prefix("token=")
                && !value.is_empty()
            {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// JWT Auth Extractor
///
/// Use this extractor in protected handlers to automatically validate JWT
/// and extract CurrentUser
impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Check if already extracted
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let token = match find_token(parts) {
            Some(t) => t,
            None => {
                tracing::warn!(uri = ?parts.uri, "Request without credentials");
                return Err(AppError::Unauthorized);
            }
        };

        let jwt_service = state.get_jwt_service();
        match jwt_service.validate_token(&token) {
            Ok(claims) => {
                let user = CurrentUser::from(claims);

                // Store in extensions for potential reuse
                parts.extensions.insert(user.clone());

                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, uri = ?parts.uri, "Token validation failed");

                match e {
                    JwtError::ExpiredToken => Err(AppError::TokenExpired),
                    _ => Err(AppError::InvalidToken),
                }
            }
        }
    }
}
