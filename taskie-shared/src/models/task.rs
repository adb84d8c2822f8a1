/// Task model and database operations
///
/// A task belongs to one user and one collection. `deleted` is a soft-delete
/// flag the client toggles (a "trash" view); the DELETE route removes the row
/// for good.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title TEXT NOT NULL,
///     description TEXT NOT NULL,
///     end_at TIMESTAMPTZ,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     deleted BOOLEAN NOT NULL DEFAULT FALSE,
///     collection_id BIGINT NOT NULL REFERENCES collections(id),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskie_shared::models::task::{CreateTask, Task, UpdateTask};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid, collection_id: i64) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     title: "Write report".to_string(),
///     description: "Quarterly numbers".to_string(),
///     end_at: None,
///     completed: false,
///     deleted: false,
///     collection_id,
///     user_id,
/// })
/// .await?;
///
/// // Mark done and clear the due date
/// Task::update(&pool, user_id, task.id, UpdateTask {
///     completed: Some(true),
///     end_at: Some(None),
///     ..Default::default()
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, title, description, end_at, completed, deleted, collection_id, user_id, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,

    /// Due date; `null` when the task has none
    pub end_at: Option<DateTime<Utc>>,

    pub completed: bool,

    /// Soft-delete flag
    pub deleted: bool,

    pub collection_id: i64,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub end_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub deleted: bool,
    pub collection_id: i64,
    pub user_id: Uuid,
}

/// Fields to change; `None` leaves a column untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` clears the due date
    pub end_at: Option<Option<DateTime<Utc>>>,
    pub completed: Option<bool>,
    pub deleted: Option<bool>,
}

impl Task {
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks (title, description, end_at, completed, deleted, collection_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TASK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.end_at)
            .bind(data.completed)
            .bind(data.deleted)
            .bind(data.collection_id)
            .bind(data.user_id)
            .fetch_one(pool)
            .await
    }

    /// Finds a task owned by `user_id`, soft-deleted or not
    pub async fn find_for_user(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a user's tasks, oldest first
    ///
    /// Soft-deleted tasks are skipped unless `include_deleted` is set.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        include_deleted: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE user_id = $1 AND ($2 OR NOT deleted)
            ORDER BY created_at ASC, id ASC
            "#
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .bind(include_deleted)
            .fetch_all(pool)
            .await
    }

    /// Lists the tasks of one of the user's collections, oldest first
    pub async fn list_by_collection(
        pool: &PgPool,
        user_id: Uuid,
        collection_id: i64,
        include_deleted: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE user_id = $1 AND collection_id = $2 AND ($3 OR NOT deleted)
            ORDER BY created_at ASC, id ASC
            "#
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .bind(collection_id)
            .bind(include_deleted)
            .fetch_all(pool)
            .await
    }

    /// Updates only the fields set in `data`
    ///
    /// Returns `None` when no task with that id belongs to `user_id`.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.end_at.is_some() {
            bind_count += 1;
            query.push_str(&format!(", end_at = ${}", bind_count));
        }
        if data.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed = ${}", bind_count));
        }
        if data.deleted.is_some() {
            bind_count += 1;
            query.push_str(&format!(", deleted = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {TASK_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(user_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(end_at) = data.end_at {
            q = q.bind(end_at);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }
        if let Some(deleted) = data.deleted {
            q = q.bind(deleted);
        }

        q.fetch_optional(pool).await
    }

    /// Removes the row; returns what was deleted
    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "DELETE FROM tasks WHERE id = $1 AND user_id = $2 RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_serializes_camel_case() {
        let task = Task {
            id: Uuid::nil(),
            title: "Write report".to_string(),
            description: "Quarterly numbers".to_string(),
            end_at: None,
            completed: false,
            deleted: false,
            collection_id: 3,
            user_id: Uuid::nil(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["collectionId"], 3);
        assert!(json["endAt"].is_null());
        assert_eq!(json["completed"], false);
        assert!(json.get("userId").is_some());
    }

    #[test]
    fn test_update_task_default_touches_nothing() {
        let update = UpdateTask::default();
        assert!(update.title.is_none());
        assert!(update.end_at.is_none());
    }
}
