use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{is_unique_violation, AppError, AppResult},
    pagination::{Page, PageQuery, PageRequest},
    registries::{
        dto::RegistryRequest,
        repo_types::{Registry, RegistryInput, RegistrySortField},
    },
    state::AppState,
};

const NOT_FOUND: &str = "Registro não encontrado.";
const SAME_DAY: &str = "Já existe um registro para a mesma categoria no mesmo dia.";

pub fn registry_routes() -> Router<AppState> {
    Router::new()
        .route("/registries", get(list_registries).post(create_registry))
        .route(
            "/registries/:id",
            get(get_registry).put(update_registry).delete(delete_registry),
        )
}

#[instrument(skip(state, _auth))]
pub async fn list_registries(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(q): Query<PageQuery>,
) -> AppResult<Json<Page<Registry>>> {
    let page = PageRequest::<RegistrySortField>::parse(&q)?;
    let (rows, total) = state.registries.list_active(&page).await?;
    Ok(Json(Page::new(&page, total, rows)))
}

#[instrument(skip(state, _auth, payload))]
pub async fn create_registry(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<RegistryRequest>,
) -> AppResult<(StatusCode, Json<Registry>)> {
    let input = payload.validate(OffsetDateTime::now_utc().date())?;
    ensure_slot_free(&state, &input, None).await?;

    let registry = state
        .registries
        .create(input)
        .await
        .map_err(conflict_on_unique)?;
    info!(registry_id = %registry.id, category = %registry.category, "registry created");
    Ok((StatusCode::CREATED, Json(registry)))
}

#[instrument(skip(state, _auth))]
pub async fn get_registry(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Registry>> {
    let registry = state
        .registries
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    Ok(Json(registry))
}

#[instrument(skip(state, _auth, payload))]
pub async fn update_registry(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RegistryRequest>,
) -> AppResult<Json<Registry>> {
    let current = state
        .registries
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    let input = payload.validate(current.created_at)?;
    if current.is_active {
        ensure_slot_free(&state, &input, Some(id)).await?;
    }

    let registry = state
        .registries
        .update(id, input)
        .await
        .map_err(conflict_on_unique)?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    info!(registry_id = %registry.id, "registry updated");
    Ok(Json(registry))
}

#[instrument(skip(state, _auth))]
pub async fn delete_registry(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Registry>> {
    let registry = state
        .registries
        .deactivate(id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    info!(registry_id = %registry.id, "registry deactivated");
    Ok(Json(registry))
}

/// At most one active registry per category and day; `own_id` is ignored.
async fn ensure_slot_free(
    state: &AppState,
    input: &RegistryInput,
    own_id: Option<Uuid>,
) -> AppResult<()> {
    let existing = state
        .registries
        .find_active_by_category_and_date(&input.category, input.created_at)
        .await?;
    match existing {
        Some(r) if Some(r.id) != own_id => {
            warn!(category = %input.category, date = %input.created_at, "registry slot taken");
            Err(AppError::conflict(SAME_DAY))
        }
        _ => Ok(()),
    }
}

fn conflict_on_unique(e: anyhow::Error) -> AppError {
    if is_unique_violation(&e) {
        AppError::conflict(SAME_DAY)
    } else {
        e.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::build_app, auth::services::JwtKeys, testing::Fakes};
    use axum::{
        body::{to_bytes, Body},
        extract::FromRef,
        http::{header, Method, Request},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &Router, token: &str, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn setup() -> (Router, String) {
        let fakes = Fakes::default();
        let user = fakes.users.seed("teste@mail.com", "123456", true);
        let state = AppState::fake_with(&fakes);
        let token = JwtKeys::from_ref(&state).sign_access(user.id).unwrap();
        (build_app(state), token)
    }

    fn registry(category: &str, date: &str) -> Value {
        json!({
            "created_at": date,
            "category": category,
            "contacts": [{
                "id": Uuid::new_v4(),
                "name": "Ana",
                "cellphone": "86988969872",
                "category": category,
                "present": true
            }]
        })
    }

    #[tokio::test]
    async fn second_active_registry_for_same_category_and_day_is_rejected() {
        let (app, token) = setup();
        let (status, created) = call(&app, &token, Method::POST, "/api/v1/registries", Some(registry("CRIANÇAS", "2024-03-10"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["created_at"], "2024-03-10");
        assert_eq!(created["contacts"][0]["present"], true);

        let (status, body) = call(&app, &token, Method::POST, "/api/v1/registries", Some(registry("CRIANÇAS", "2024-03-10"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["detail"], SAME_DAY);

        // Other category or other day is fine.
        let (status, _) = call(&app, &token, Method::POST, "/api/v1/registries", Some(registry("JOVENS", "2024-03-10"))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = call(&app, &token, Method::POST, "/api/v1/registries", Some(registry("CRIANÇAS", "2024-03-11"))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn soft_delete_hides_from_list_and_frees_the_slot() {
        let (app, token) = setup();
        let (_, created) = call(&app, &token, Method::POST, "/api/v1/registries", Some(registry("CRIANÇAS", "2024-03-10"))).await;
        let uri = format!("/api/v1/registries/{}", created["id"].as_str().unwrap());

        let (status, deleted) = call(&app, &token, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["is_active"], false);

        // Still retrievable by id, but no longer listed.
        let (status, fetched) = call(&app, &token, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["is_active"], false);
        let (_, list) = call(&app, &token, Method::GET, "/api/v1/registries", None).await;
        assert_eq!(list["pagination"]["total"], 0);
        assert_eq!(list["pagination"]["max_page"], 0);

        let (status, _) = call(&app, &token, Method::POST, "/api/v1/registries", Some(registry("CRIANÇAS", "2024-03-10"))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn update_cannot_move_into_a_taken_slot() {
        let (app, token) = setup();
        call(&app, &token, Method::POST, "/api/v1/registries", Some(registry("CRIANÇAS", "2024-03-10"))).await;
        let (_, other) = call(&app, &token, Method::POST, "/api/v1/registries", Some(registry("JOVENS", "2024-03-10"))).await;
        let uri = format!("/api/v1/registries/{}", other["id"].as_str().unwrap());

        let (status, _) = call(&app, &token, Method::PUT, &uri, Some(registry("CRIANÇAS", "2024-03-10"))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Re-saving its own slot is allowed.
        let (status, updated) = call(&app, &token, Method::PUT, &uri, Some(registry("JOVENS", "2024-03-10"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], other["id"]);
    }

    #[tokio::test]
    async fn list_sorts_by_date() {
        let (app, token) = setup();
        for date in ["2024-03-11", "2024-03-09", "2024-03-10"] {
            call(&app, &token, Method::POST, "/api/v1/registries", Some(registry("CRIANÇAS", date))).await;
        }
        let (status, list) = call(
            &app,
            &token,
            Method::GET,
            "/api/v1/registries?order_sorted=DESC&field_sorted=created_at",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let dates: Vec<&str> = list["data"].as_array().unwrap().iter().map(|r| r["created_at"].as_str().unwrap()).collect();
        assert_eq!(dates, ["2024-03-11", "2024-03-10", "2024-03-09"]);
        assert_eq!(list["pagination"]["page_size"], 100);
    }

    #[tokio::test]
    async fn missing_registry_yields_not_found() {
        let (app, token) = setup();
        let uri = format!("/api/v1/registries/{}", Uuid::new_v4());
        let (status, body) = call(&app, &token, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], NOT_FOUND);
    }

    #[tokio::test]
    async fn update_without_date_keeps_the_stored_day() {
        let (app, token) = setup();
        let (_, created) = call(&app, &token, Method::POST, "/api/v1/registries", Some(registry("JOVENS", "2024-03-10"))).await;
        let uri = format!("/api/v1/registries/{}", created["id"].as_str().unwrap());

        let (status, updated) = call(&app, &token, Method::PUT, &uri, Some(json!({"category": "JOVENS", "contacts": []}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["created_at"], "2024-03-10");
        assert_eq!(updated["contacts"], json!([]));

        // The registry still holds its own slot.
        let (status, _) = call(&app, &token, Method::POST, "/api/v1/registries", Some(registry("JOVENS", "2024-03-10"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn create_without_date_uses_today() {
        let (app, token) = setup();
        let (status, created) = call(&app, &token, Method::POST, "/api/v1/registries", Some(json!({"category": "JOVENS"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let today = OffsetDateTime::now_utc().date().to_string();
        assert_eq!(created["created_at"], today.as_str());
    }

    #[tokio::test]
    async fn page_far_past_the_end_is_empty() {
        let (app, token) = setup();
        call(&app, &token, Method::POST, "/api/v1/registries", Some(registry("JOVENS", "2024-03-10"))).await;
        let (status, list) = call(
            &app,
            &token,
            Method::GET,
            &format!("/api/v1/registries?current={}&page_size=1000", i64::MAX),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["data"], json!([]));
        assert_eq!(list["pagination"]["total"], 1);
        assert_eq!(list["pagination"]["max_page"], 1);
        assert_eq!(list["pagination"]["current"], i64::MAX);
    }
}
