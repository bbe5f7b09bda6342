use axum::{
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        claims::TokenKind,
        dto::{
            ChangePasswordRequest, LoginRequest, PublicUser, RefreshRequest, RegisterRequest,
            TokenResponse, UpdateProfileRequest,
        },
        extractors::{bearer_token, resolve_user, AuthUser},
        repo_types::{NewUser, ProfileUpdate, User},
        services::{authenticate, hash_password, verify_password, JwtKeys},
    },
    error::{is_unique_violation, AppError, AppResult},
    state::AppState,
    validation,
};

const EMAIL_TAKEN: &str = "Já existe um usuário com esse email";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).put(update_me))
        .route("/me/password", put(change_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let email = validation::email(&payload.email)?;
    let name = validation::name(&payload.name)?;
    let cellphone = validation::cellphone(&payload.cellphone)?;
    let category = validation::category(&payload.category)?;
    validation::new_password(&payload.password, &payload.confirm_password)?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::conflict(EMAIL_TAKEN));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .users
        .create(NewUser {
            name,
            email,
            password_hash,
            cellphone,
            category,
        })
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(EMAIL_TAKEN)
            } else {
                e.into()
            }
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let Some(user) = authenticate(state.users.as_ref(), &payload.email, &payload.password).await?
    else {
        warn!("login rejected");
        return Err(AppError::Unauthorized("Email ou Senha errados".into()));
    };

    let response = issue_tokens(&state, user)?;
    info!(user_id = %response.user_data.id, "user logged in");
    Ok(Json(response))
}

/// Exchanges a refresh token (bearer header, or `refresh_token` in the body)
/// for a new access/refresh pair.
#[instrument(skip(state, headers, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<RefreshRequest>>,
) -> AppResult<Json<TokenResponse>> {
    let body_token = payload.and_then(|Json(p)| p.refresh_token);
    let token = match bearer_token(&headers) {
        Some(t) => t.to_string(),
        None => body_token.ok_or_else(AppError::invalid_credentials)?,
    };

    let user = resolve_user(&state, &token, TokenKind::Refresh).await?;
    let response = issue_tokens(&state, user)?;
    info!(user_id = %response.user_data.id, "tokens refreshed");
    Ok(Json(response))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<PublicUser>> {
    let profile = ProfileUpdate {
        name: validation::name(&payload.name)?,
        email: validation::email(&payload.email)?,
        cellphone: validation::cellphone(&payload.cellphone)?,
        category: validation::category(&payload.category)?,
    };

    if profile.email != user.email {
        if let Some(other) = state.users.find_by_email(&profile.email).await? {
            if other.id != user.id {
                return Err(AppError::conflict(EMAIL_TAKEN));
            }
        }
    }

    let updated = state
        .users
        .update_profile(user.id, profile)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(EMAIL_TAKEN)
            } else {
                e.into()
            }
        })?
        .ok_or_else(AppError::invalid_credentials)?;

    info!("profile updated");
    Ok(Json(updated.into()))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!("current password mismatch");
        return Err(AppError::bad_request("Senha atual incorreta."));
    }
    validation::new_password(&payload.new_password, &payload.confirm_password)?;

    let hash = hash_password(&payload.new_password)?;
    state.users.update_password(user.id, &hash).await?;
    info!("password changed");
    Ok(StatusCode::NO_CONTENT)
}

fn issue_tokens(state: &AppState, user: User) -> AppResult<TokenResponse> {
    let keys = JwtKeys::from_ref(state);
    let (access_token, refresh_token) = keys.sign_pair(user.id)?;
    Ok(TokenResponse::bearer(user.into(), access_token, refresh_token))
}
