use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::api::{parse_body, path_id};
use crate::error::AppError;
use crate::models::Todo;
use crate::state::AppState;
use crate::validation::{validate_create, validate_update};

pub async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = state.store.find_all().await?;
    Ok(Json(todos))
}

pub async fn create_todo(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let payload = parse_body(body)?;
    let title = validate_create(&payload)?;
    let todo = state.store.insert(&title).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn update_todo(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Todo>, AppError> {
    let payload = parse_body(body)?;
    let id = path_id(id)?;

    state.store.find_by_id(id).await?.ok_or(AppError::NotFound)?;

    let changes = validate_update(&payload)?;
    let todo = state
        .store
        .apply_update(id, &changes)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(todo))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = path_id(id)?;

    state.store.find_by_id(id).await?.ok_or(AppError::NotFound)?;

    // A concurrent delete between lookup and remove also ends up here.
    if state.store.remove(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
