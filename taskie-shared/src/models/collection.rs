/// Collection model and database operations
///
/// A collection is a named, iconed group of tasks owned by one user. Every
/// lookup takes the owner id, so a collection id that belongs to someone else
/// behaves exactly like one that does not exist.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE collections (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(16) NOT NULL,
///     icon TEXT NOT NULL,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

const COLLECTION_COLUMNS: &str = "id, name, icon, user_id, created_at, updated_at";

/// Longest accepted collection name, in characters
pub const MAX_COLLECTION_NAME_LENGTH: u64 = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub icon: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCollection {
    pub name: String,
    pub icon: String,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCollection {
    pub name: Option<String>,
    pub icon: Option<String>,
}

impl Collection {
    pub async fn create(pool: &PgPool, data: CreateCollection) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO collections (name, icon, user_id) VALUES ($1, $2, $3) RETURNING {COLLECTION_COLUMNS}"
        );

        sqlx::query_as::<_, Collection>(&query)
            .bind(data.name)
            .bind(data.icon)
            .bind(data.user_id)
            .fetch_one(pool)
            .await
    }

    /// Finds a collection owned by `user_id`
    pub async fn find_for_user(
        pool: &PgPool,
        user_id: Uuid,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = $1 AND user_id = $2"
        );

        sqlx::query_as::<_, Collection>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists_for_user(pool: &PgPool, user_id: Uuid, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM collections WHERE id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Oldest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections WHERE user_id = $1 ORDER BY created_at ASC, id ASC"
        );

        sqlx::query_as::<_, Collection>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Updates only the fields set in `data`
    ///
    /// Returns `None` when no collection with that id belongs to `user_id`.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: i64,
        data: UpdateCollection,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE collections SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.icon.is_some() {
            bind_count += 1;
            query.push_str(&format!(", icon = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {COLLECTION_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Collection>(&query).bind(id).bind(user_id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(icon) = data.icon {
            q = q.bind(icon);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a collection together with all of its tasks
    ///
    /// Both deletes run in one transaction: either the collection and every
    /// task in it are gone, or nothing changed. Returns the deleted
    /// collection, or `None` (and rolls back) when it does not belong to
    /// `user_id`.
    pub async fn delete_with_tasks(
        pool: &PgPool,
        user_id: Uuid,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut transaction = pool.begin().await?;

        let locked: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM collections WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *transaction)
        .await?;

        if locked.is_none() {
            transaction.rollback().await?;
            return Ok(None);
        }

        let removed_tasks = sqlx::query("DELETE FROM tasks WHERE collection_id = $1")
            .bind(id)
            .execute(&mut *transaction)
            .await?
            .rows_affected();

        let query = format!(
            "DELETE FROM collections WHERE id = $1 AND user_id = $2 RETURNING {COLLECTION_COLUMNS}"
        );
        let collection = sqlx::query_as::<_, Collection>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_one(&mut *transaction)
            .await?;

        transaction.commit().await?;

        debug!(collection_id = id, removed_tasks, "Deleted collection with its tasks");
        Ok(Some(collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_serializes_camel_case() {
        let collection = Collection {
            id: 7,
            name: "Work".to_string(),
            icon: "briefcase".to_string(),
            user_id: Uuid::nil(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&collection).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["userId"], Uuid::nil().to_string());
        assert!(json.get("user_id").is_none());
    }
}
