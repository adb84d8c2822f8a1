/// Database models for Taskie
///
/// Each model owns its SQL. Queries that concern a user's data take the owner
/// id and filter on it.
///
/// # Models
///
/// - `role`: access role names, seeded at startup
/// - `user`: accounts
/// - `collection`: named groups of tasks
/// - `task`: the tasks themselves
///
/// # Example
///
/// ```no_run
/// use taskie_shared::models::collection::{Collection, CreateCollection};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let collection = Collection::create(&pool, CreateCollection {
///     name: "Work".to_string(),
///     icon: "briefcase".to_string(),
///     user_id,
/// })
/// .await?;
///
/// let deleted = Collection::delete_with_tasks(&pool, user_id, collection.id).await?;
/// assert!(deleted.is_some());
/// # Ok(())
/// # }
/// ```

pub mod collection;
pub mod role;
pub mod task;
pub mod user;
