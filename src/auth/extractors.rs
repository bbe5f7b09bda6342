use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::claims::TokenKind;
use super::dto::JwtKeys;
use super::repo_types::User;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Validates the access token and resolves it to an active user.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            warn!("missing or malformed Authorization header");
            AppError::invalid_credentials()
        })?;
        let user = resolve_user(state, token, TokenKind::Access).await?;
        Ok(AuthUser(user))
    }
}

/// Extracts `<token>` from `Authorization: Bearer <token>`.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = auth.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Verifies `token` as a `kind` token and loads its subject. Fails closed.
pub(crate) async fn resolve_user(state: &AppState, token: &str, kind: TokenKind) -> AppResult<User> {
    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::invalid_credentials()
    })?;

    if claims.kind != kind {
        warn!(user_id = %claims.sub, got = ?claims.kind, expected = ?kind, "wrong token kind");
        return Err(AppError::Forbidden("Tipo de token inválido.".into()));
    }

    match state.users.find_active_by_id(claims.sub).await? {
        Some(user) => Ok(user),
        None => {
            warn!(user_id = %claims.sub, "token subject missing or inactive");
            Err(AppError::invalid_credentials())
        }
    }
}
