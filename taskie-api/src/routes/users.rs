/// User endpoints
///
/// All routes sit behind the session cookie. `GET /users` is admin only; the
/// `/:user_id` routes are open to admins and to the user themself.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{no_nul_chars, RequestSchema, ValidPath, ValidQuery, ValidatedJson},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::borrow::Cow;
use taskie_shared::models::user::{UpdateUser, User, MAX_USER_NAME_LENGTH};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListUsersQuery {
    /// Limit and offset clamped to sane bounds
    pub fn page(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Shared by sign-up and profile updates
pub(crate) fn user_name_fits(name: &str) -> Result<(), ValidationError> {
    no_nul_chars(name)?;

    if name.chars().count() as u64 > MAX_USER_NAME_LENGTH {
        let mut error = ValidationError::new("length");
        error.message = Some(Cow::Borrowed("Name is too long"));
        return Err(error);
    }
    Ok(())
}

/// Profile changes; only name and email can be edited here
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 1, message = "Name is required"),
        custom(function = "user_name_fits")
    )]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

impl RequestSchema for UpdateUserRequest {
    const FIELDS: &'static [&'static str] = &["name", "email"];
}

/// An empty string removes the portrait
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePortraitRequest {
    #[validate(custom(function = "no_nul_chars"))]
    pub portrait: String,
}

impl RequestSchema for UpdatePortraitRequest {
    const FIELDS: &'static [&'static str] = &["portrait"];
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: User,
}

/// 404 unless the user exists
pub(crate) async fn ensure_user_exists(db: &PgPool, user_id: Uuid) -> ApiResult<()> {
    if User::exists(db, user_id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound("User not found".to_string()))
    }
}

/// List users, oldest first
///
/// ```text
/// GET /users?limit=100&offset=0
/// ```
pub async fn list_users(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ListUsersQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let (limit, offset) = query.page();
    let users = User::list(&state.db, limit, offset).await?;

    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    ValidPath(user_id): ValidPath<Uuid>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Update name and/or email
///
/// A body without either field changes nothing and returns the user as is.
///
/// # Errors
///
/// - `400`: validation failed, or the email is taken
/// - `404`: unknown user
pub async fn update_user(
    State(state): State<AppState>,
    ValidPath(user_id): ValidPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let changes = UpdateUser {
        name: req.name,
        email: req.email,
        ..Default::default()
    };

    let user = if changes.is_empty() {
        User::find_by_id(&state.db, user_id).await?
    } else {
        User::update(&state.db, user_id, changes).await?
    }
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse {
        message: "User updated successfully",
        user,
    }))
}

pub async fn update_portrait(
    State(state): State<AppState>,
    ValidPath(user_id): ValidPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePortraitRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::update(
        &state.db,
        user_id,
        UpdateUser {
            portrait: Some(req.portrait),
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse {
        message: "Portrait updated successfully",
        user,
    }))
}
