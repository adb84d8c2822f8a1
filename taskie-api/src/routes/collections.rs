/// Collection endpoints
///
/// # Endpoints
///
/// - `GET    /users/:user_id/collections`
/// - `POST   /users/:user_id/collections`
/// - `GET    /users/:user_id/collections/:collection_id`
/// - `PATCH  /users/:user_id/collections/:collection_id`
/// - `DELETE /users/:user_id/collections/:collection_id` - also removes its tasks
/// - `GET    /users/:user_id/collections/:collection_id/tasks`
///
/// Collections are always looked up together with their owner, so an id that
/// belongs to someone else is simply not found.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{no_nul_chars, RequestSchema, ValidPath, ValidQuery, ValidatedJson},
    routes::{list_or_no_content, tasks::ListTasksQuery, users::ensure_user_exists},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use taskie_shared::models::{
    collection::{Collection, CreateCollection, UpdateCollection, MAX_COLLECTION_NAME_LENGTH},
    task::Task,
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn collection_name_fits(name: &str) -> Result<(), ValidationError> {
    no_nul_chars(name)?;

    if name.chars().count() as u64 > MAX_COLLECTION_NAME_LENGTH {
        let mut error = ValidationError::new("length");
        error.message = Some(Cow::Borrowed("Colection name is too long"));
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCollectionRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Colection name is required"),
        custom(function = "collection_name_fits")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(
        length(min = 1, message = "Colection icon is required"),
        custom(function = "no_nul_chars")
    )]
    pub icon: String,
}

impl RequestSchema for CreateCollectionRequest {
    const FIELDS: &'static [&'static str] = &["name", "icon"];
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCollectionRequest {
    #[validate(
        length(min = 1, message = "Colection name is required"),
        custom(function = "collection_name_fits")
    )]
    pub name: Option<String>,

    #[validate(
        length(min = 1, message = "Colection icon is required"),
        custom(function = "no_nul_chars")
    )]
    pub icon: Option<String>,
}

impl RequestSchema for UpdateCollectionRequest {
    const FIELDS: &'static [&'static str] = &["name", "icon"];
}

#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    pub message: &'static str,
    pub collection: Collection,
}

fn collection_not_found() -> ApiError {
    ApiError::NotFound("Collection not found".to_string())
}

/// 200 with the user's collections, 204 when there are none
pub async fn list_collections(
    State(state): State<AppState>,
    ValidPath(user_id): ValidPath<Uuid>,
) -> ApiResult<Response> {
    ensure_user_exists(&state.db, user_id).await?;

    let collections = Collection::list_by_user(&state.db, user_id).await?;
    Ok(list_or_no_content(collections))
}

/// ```text
/// POST /users/:user_id/collections
/// { "name": "Work", "icon": "briefcase" }
/// ```
pub async fn create_collection(
    State(state): State<AppState>,
    ValidPath(user_id): ValidPath<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateCollectionRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_user_exists(&state.db, user_id).await?;

    let collection = Collection::create(
        &state.db,
        CreateCollection {
            name: req.name,
            icon: req.icon,
            user_id,
        },
    )
    .await?;

    tracing::debug!(%user_id, collection_id = collection.id, "Collection created");

    Ok((
        StatusCode::CREATED,
        Json(CollectionResponse {
            message: "Collection created successfully",
            collection,
        }),
    ))
}

pub async fn get_collection(
    State(state): State<AppState>,
    ValidPath((user_id, collection_id)): ValidPath<(Uuid, i64)>,
) -> ApiResult<Json<Collection>> {
    let collection = Collection::find_for_user(&state.db, user_id, collection_id)
        .await?
        .ok_or_else(collection_not_found)?;

    Ok(Json(collection))
}

pub async fn update_collection(
    State(state): State<AppState>,
    ValidPath((user_id, collection_id)): ValidPath<(Uuid, i64)>,
    ValidatedJson(req): ValidatedJson<UpdateCollectionRequest>,
) -> ApiResult<Json<CollectionResponse>> {
    let collection = Collection::update(
        &state.db,
        user_id,
        collection_id,
        UpdateCollection {
            name: req.name,
            icon: req.icon,
        },
    )
    .await?
    .ok_or_else(collection_not_found)?;

    Ok(Json(CollectionResponse {
        message: "Collection updated successfully",
        collection,
    }))
}

/// Delete a collection and every task in it, atomically
pub async fn delete_collection(
    State(state): State<AppState>,
    ValidPath((user_id, collection_id)): ValidPath<(Uuid, i64)>,
) -> ApiResult<Json<CollectionResponse>> {
    let collection = Collection::delete_with_tasks(&state.db, user_id, collection_id)
        .await?
        .ok_or_else(collection_not_found)?;

    Ok(Json(CollectionResponse {
        message: "Collection deleted successfully",
        collection,
    }))
}

/// Tasks of one collection; soft-deleted ones only with `includeDeleted=true`
pub async fn list_collection_tasks(
    State(state): State<AppState>,
    ValidPath((user_id, collection_id)): ValidPath<(Uuid, i64)>,
    ValidQuery(query): ValidQuery<ListTasksQuery>,
) -> ApiResult<Response> {
    if !Collection::exists_for_user(&state.db, user_id, collection_id).await? {
        return Err(collection_not_found());
    }

    let tasks =
        Task::list_by_collection(&state.db, user_id, collection_id, query.include_deleted).await?;
    Ok(list_or_no_content(tasks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::first_message;

    fn create(name: &str, icon: &str) -> CreateCollectionRequest {
        CreateCollectionRequest {
            name: name.to_string(),
            icon: icon.to_string(),
        }
    }

    fn message(req: &impl Validate, fields: &[&str]) -> Option<String> {
        req.validate().err().map(|errors| first_message(&errors, fields))
    }

    #[test]
    fn test_create_rules() {
        let fields = CreateCollectionRequest::FIELDS;

        assert_eq!(message(&create("Work", "briefcase"), fields), None);
        assert_eq!(
            message(&create("", "briefcase"), fields).as_deref(),
            Some("Colection name is required")
        );
        assert_eq!(
            message(&create("A name far too long", "briefcase"), fields).as_deref(),
            Some("Colection name is too long")
        );
        assert_eq!(
            message(&create("Work", ""), fields).as_deref(),
            Some("Colection icon is required")
        );
    }

    #[test]
    fn test_nul_characters_rejected() {
        let fields = CreateCollectionRequest::FIELDS;
        let nul = "Text must not contain NUL characters";

        assert_eq!(message(&create("Wo\0rk", "i"), fields).as_deref(), Some(nul));
        assert_eq!(message(&create("Work", "i\0"), fields).as_deref(), Some(nul));
    }

    #[test]
    fn test_name_length_counts_characters() {
        // 16 two-byte characters
        assert_eq!(message(&create("éééééééééééééééé", "i"), CreateCollectionRequest::FIELDS), None);
    }

    #[test]
    fn test_update_rules() {
        let fields = UpdateCollectionRequest::FIELDS;

        let empty = UpdateCollectionRequest {
            name: None,
            icon: None,
        };
        assert_eq!(message(&empty, fields), None);

        let too_long = UpdateCollectionRequest {
            name: Some("x".repeat(17)),
            icon: None,
        };
        assert_eq!(
            message(&too_long, fields).as_deref(),
            Some("Colection name is too long")
        );
    }
}
