/// Access roles
///
/// The `roles` table only holds names; what each role may do lives in
/// [`crate::auth::authorization::AUTHORIZATION_RULES`]. Every name in that
/// table is upserted at startup so the `users.role_name` foreign key always
/// resolves.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::auth::authorization::ROLES;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub name: String,
}

impl Role {
    /// Inserts every known role that is not present yet
    ///
    /// Safe to run on every start.
    pub async fn seed_defaults(pool: &PgPool) -> Result<(), sqlx::Error> {
        for role in ROLES {
            let inserted = sqlx::query("INSERT INTO roles (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
                .bind(role)
                .execute(pool)
                .await?
                .rows_affected();

            if inserted > 0 {
                info!(role = %role, "Seeded role");
            }
        }

        Ok(())
    }
}
