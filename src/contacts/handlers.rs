use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    contacts::{
        dto::ContactRequest,
        repo_types::{Contact, ContactSortField},
    },
    error::{is_unique_violation, AppError, AppResult},
    pagination::{Page, PageQuery, PageRequest},
    state::AppState,
};

const NOT_FOUND: &str = "Contato não encontrado.";
const ALREADY_EXISTS: &str = "Contato já existe.";

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(list_contacts).post(create_contact))
        .route(
            "/contacts/:id",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}

#[instrument(skip(state, _auth))]
pub async fn list_contacts(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(q): Query<PageQuery>,
) -> AppResult<Json<Page<Contact>>> {
    let page = PageRequest::<ContactSortField>::parse(&q)?;
    let (rows, total) = state.contacts.list(&page).await?;
    Ok(Json(Page::new(&page, total, rows)))
}

#[instrument(skip(state, _auth, payload))]
pub async fn create_contact(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<ContactRequest>,
) -> AppResult<(StatusCode, Json<Contact>)> {
    let input = payload.validate()?;
    if state
        .contacts
        .find_by_name_and_cellphone(&input.name, &input.cellphone)
        .await?
        .is_some()
    {
        warn!(name = %input.name, "duplicate contact");
        return Err(AppError::conflict(ALREADY_EXISTS));
    }

    let contact = state.contacts.create(input).await.map_err(conflict_on_unique)?;
    info!(contact_id = %contact.id, "contact created");
    Ok((StatusCode::CREATED, Json(contact)))
}

#[instrument(skip(state, _auth))]
pub async fn get_contact(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Contact>> {
    let contact = state
        .contacts
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    Ok(Json(contact))
}

#[instrument(skip(state, _auth, payload))]
pub async fn update_contact(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContactRequest>,
) -> AppResult<Json<Contact>> {
    let input = payload.validate()?;
    if state.contacts.find(id).await?.is_none() {
        return Err(AppError::not_found(NOT_FOUND));
    }
    if let Some(other) = state
        .contacts
        .find_by_name_and_cellphone(&input.name, &input.cellphone)
        .await?
    {
        if other.id != id {
            return Err(AppError::conflict(ALREADY_EXISTS));
        }
    }

    let contact = state
        .contacts
        .update(id, input)
        .await
        .map_err(conflict_on_unique)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    info!(contact_id = %contact.id, "contact updated");
    Ok(Json(contact))
}

#[instrument(skip(state, _auth))]
pub async fn delete_contact(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Contact>> {
    let contact = state
        .contacts
        .delete(id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    info!(contact_id = %contact.id, "contact deleted");
    Ok(Json(contact))
}

fn conflict_on_unique(e: anyhow::Error) -> AppError {
    if is_unique_violation(&e) {
        AppError::conflict(ALREADY_EXISTS)
    } else {
        e.into()
    }
}
