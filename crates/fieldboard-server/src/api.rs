//! HTTP JSON API over the task store.
//!
//! Request handlers are stateless: each one takes the shared store handle,
//! validates the payload (structure and types before existence checks, before
//! persistence), and shapes the response. Stored image payloads are
//! reconstituted into displayable data URLs on the way out.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use fieldboard_core::validate::to_data_url;
use fieldboard_core::{
    CommentCreated, Deleted, ErrorBody, NewComment, StatusChange, StatusUpdated, Task,
    TaskCreated, TaskDraft, TaskId, TaskPatch, TaskPatched,
};

use crate::store::{StoreError, TaskStore};

/// Shared handler state: the explicitly constructed store, behind a mutex.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<TaskStore>>,
}

impl AppState {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}

/// An error response: status code plus `{error}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::TaskNotFound(id) => Self::not_found(format!("Task not found: {id}")),
            StoreError::Validation(message) => Self::bad_request(message),
            StoreError::Storage(message) => {
                // Full detail goes to the log; the client gets a generic 500.
                error!("storage failure: {message}");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "internal storage error".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

/// Deserialize a JSON body into a typed request, mapping failures to 400.
///
/// Going through `serde_json::Value` keeps type/shape errors (unknown patch
/// fields, non-string status) on the 400 path instead of axum's extractor
/// rejections.
fn parse_body<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// Rewrite a stored task for the wire: image becomes a data URL.
fn present_task(mut task: Task) -> Task {
    if let Some(image) = task.image.take() {
        task.image = Some(to_data_url(&image));
    }
    task
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).patch(patch_task).delete(delete_task),
        )
        .route("/tasks/{id}/status", patch(update_status))
        .route("/tasks/{id}/comments", get(list_comments))
        .route("/comments", post(create_comment))
        .route("/comments/{id}", delete(delete_comment))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.store.lock().list_tasks()?;
    Ok(Json(tasks.into_iter().map(present_task).collect()))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Result<Json<Task>, ApiError> {
    let task = state
        .store
        .lock()
        .get_task(id)?
        .ok_or_else(|| ApiError::not_found(format!("Task not found: {id}")))?;
    Ok(Json(present_task(task)))
}

async fn create_task(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<TaskCreated>), ApiError> {
    let draft: TaskDraft = parse_body(body)?;
    let id = state.store.lock().create_task(&draft)?;
    info!(id, "task created");
    Ok((StatusCode::CREATED, Json(TaskCreated { id })))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<StatusUpdated>, ApiError> {
    let change: StatusChange = parse_body(body)?;
    let updated = state.store.lock().set_status(id, change.status)?;
    if updated == 0 {
        return Err(ApiError::not_found(format!("Task not found: {id}")));
    }
    info!(id, status = %change.status, "task status updated");
    Ok(Json(StatusUpdated { updated }))
}

async fn patch_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<TaskPatched>, ApiError> {
    let patch: TaskPatch = parse_body(body)?;
    let task = state.store.lock().patch_task(id, &patch)?;
    info!(id, "task patched");
    Ok(Json(TaskPatched {
        updated: 1,
        task: present_task(task),
    }))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Result<Json<Deleted>, ApiError> {
    let deleted = state.store.lock().delete_task(id)?;
    if deleted == 0 {
        return Err(ApiError::not_found(format!("Task not found: {id}")));
    }
    info!(id, "task deleted");
    Ok(Json(Deleted { deleted }))
}

async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Result<Json<Vec<fieldboard_core::Comment>>, ApiError> {
    Ok(Json(state.store.lock().list_comments(id)?))
}

async fn create_comment(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<CommentCreated>), ApiError> {
    let new: NewComment = parse_body(body)?;
    let id = state.store.lock().add_comment(&new)?;
    info!(id, task_id = new.task_id, "comment created");
    Ok((StatusCode::CREATED, Json(CommentCreated { id })))
}

async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Deleted>, ApiError> {
    let deleted = state.store.lock().delete_comment(id)?;
    Ok(Json(Deleted { deleted }))
}
