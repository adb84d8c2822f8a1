/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /users/:user_id/tasks?includeDeleted=true`
/// - `POST   /users/:user_id/tasks` - the body names the collection
/// - `GET    /users/:user_id/tasks/:task_id`
/// - `PATCH  /users/:user_id/tasks/:task_id`
/// - `DELETE /users/:user_id/tasks/:task_id` - removes the row
///
/// # Due dates
///
/// `endAt` accepts RFC 3339 (`2025-03-01T09:30:00Z`), a naive
/// `2025-03-01T09:30[:00]` read as UTC, or a bare `2025-03-01` (midnight UTC).
/// On update an empty string clears the due date.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{no_nul_chars, RequestSchema, ValidPath, ValidQuery, ValidatedJson},
    routes::{list_or_no_content, users::ensure_user_exists},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use taskie_shared::models::{
    collection::Collection,
    task::{CreateTask, Task, UpdateTask},
};
use uuid::Uuid;
use validator::Validate;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parses a due date; `""` means no due date
pub fn parse_due_date(raw: &str) -> ApiResult<Option<DateTime<Utc>>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(parsed.and_utc()));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Some(midnight.and_utc()))
        .ok_or_else(|| ApiError::BadRequest("Invalid due date".to_string()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Title is required"),
        custom(function = "no_nul_chars")
    )]
    pub title: String,

    #[serde(default)]
    #[validate(
        length(min = 1, message = "Description is required"),
        custom(function = "no_nul_chars")
    )]
    pub description: String,

    pub end_at: Option<String>,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub deleted: bool,

    #[serde(default)]
    #[validate(range(min = 1, message = "Collection is required"))]
    pub collection_id: i64,
}

impl RequestSchema for CreateTaskRequest {
    const FIELDS: &'static [&'static str] = &["title", "description", "collection_id"];
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(
        length(min = 1, message = "Title is required"),
        custom(function = "no_nul_chars")
    )]
    pub title: Option<String>,

    #[validate(
        length(min = 1, message = "Description is required"),
        custom(function = "no_nul_chars")
    )]
    pub description: Option<String>,

    /// Absent or `null` keeps the due date, `""` clears it
    pub end_at: Option<String>,

    pub completed: Option<bool>,

    pub deleted: Option<bool>,
}

impl RequestSchema for UpdateTaskRequest {
    const FIELDS: &'static [&'static str] = &["title", "description"];
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub message: &'static str,
    pub task: Task,
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

/// 200 with the user's tasks, 204 when there are none
pub async fn list_tasks(
    State(state): State<AppState>,
    ValidPath(user_id): ValidPath<Uuid>,
    ValidQuery(query): ValidQuery<ListTasksQuery>,
) -> ApiResult<Response> {
    ensure_user_exists(&state.db, user_id).await?;

    let tasks = Task::list_by_user(&state.db, user_id, query.include_deleted).await?;
    Ok(list_or_no_content(tasks))
}

/// Create a task in one of the user's collections
///
/// ```text
/// POST /users/:user_id/tasks
/// { "title": "Report", "description": "Q1 numbers", "collectionId": 3, "endAt": "2025-03-01" }
/// ```
///
/// # Errors
///
/// - `400`: validation failed or the due date does not parse
/// - `404`: unknown user, or the collection is not theirs
pub async fn create_task(
    State(state): State<AppState>,
    ValidPath(user_id): ValidPath<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    let end_at = match req.end_at.as_deref() {
        Some(raw) => parse_due_date(raw)?,
        None => None,
    };

    ensure_user_exists(&state.db, user_id).await?;

    if !Collection::exists_for_user(&state.db, user_id, req.collection_id).await? {
        return Err(ApiError::NotFound("Collection not found".to_string()));
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            end_at,
            completed: req.completed,
            deleted: req.deleted,
            collection_id: req.collection_id,
            user_id,
        },
    )
    .await?;

    tracing::debug!(%user_id, task_id = %task.id, collection_id = task.collection_id, "Task created");

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: "Task created successfully",
            task,
        }),
    ))
}

pub async fn get_task(
    State(state): State<AppState>,
    ValidPath((user_id, task_id)): ValidPath<(Uuid, Uuid)>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_for_user(&state.db, user_id, task_id)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(task))
}

/// Change any subset of title, description, due date, completed and deleted
pub async fn update_task(
    State(state): State<AppState>,
    ValidPath((user_id, task_id)): ValidPath<(Uuid, Uuid)>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let end_at = req.end_at.as_deref().map(parse_due_date).transpose()?;

    let task = Task::update(
        &state.db,
        user_id,
        task_id,
        UpdateTask {
            title: req.title,
            description: req.description,
            end_at,
            completed: req.completed,
            deleted: req.deleted,
        },
    )
    .await?
    .ok_or_else(task_not_found)?;

    Ok(Json(TaskResponse {
        message: "Task updated successfully",
        task,
    }))
}

pub async fn delete_task(
    State(state): State<AppState>,
    ValidPath((user_id, task_id)): ValidPath<(Uuid, Uuid)>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::delete(&state.db, user_id, task_id)
        .await?
        .ok_or_else(task_not_found)?;

    tracing::debug!(%user_id, %task_id, "Task deleted");

    Ok(Json(TaskResponse {
        message: "Task deleted successfully",
        task,
    }))
}
