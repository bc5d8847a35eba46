use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};

use crate::error::AppError;
use crate::models::User;
use crate::AppState;

/// Header carrying the caller's identity, set by the upstream identity provider.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the shared secret for administrative routes.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

pub fn extract_user_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(provided: &str, expected: &str) -> bool {
    let (provided, expected) = (provided.as_bytes(), expected.as_bytes());
    provided.len() == expected.len()
        && provided
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

/// The calling user. Extracting it creates the user record on first contact.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0.user_id
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = extract_user_id_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        let user = state.user_service.ensure_user(&user_id).await?;
        Ok(CurrentUser(user))
    }
}

/// Proof that the request may use administrative routes.
///
/// When no admin token is configured every request passes.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            return Ok(AdminAccess);
        };

        let provided = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        if provided.is_some_and(|provided| tokens_match(provided, expected)) {
            Ok(AdminAccess)
        } else {
            tracing::warn!("Rejected admin request with missing or wrong token");
            Err(AppError::Unauthorized)
        }
    }
}
