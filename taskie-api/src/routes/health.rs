/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "migrations": { "applied_migrations": 1, "latest_version": 20250301000000, "is_up_to_date": true },
///   "pool": { "active_connections": 0, "idle_connections": 1, "total_connections": 1 }
/// }
/// ```
///
/// Always answers 200; a failing database shows up as `"degraded"`.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::Serialize;
use taskie_shared::db::{
    migrations::{get_migration_status, MigrationStatus},
    pool::{get_pool_stats, health_check as database_health_check, PoolStats},
};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: &'static str,

    pub version: &'static str,

    /// `connected` or `disconnected`
    pub database: &'static str,

    /// `None` when the database could not be queried
    pub migrations: Option<MigrationStatus>,

    pub pool: PoolStats,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let connected = match database_health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    let migrations = if connected {
        get_migration_status(&state.db)
            .await
            .map_err(|e| tracing::warn!(error = %e, "Could not read migration status"))
            .ok()
    } else {
        None
    };

    let healthy = connected && migrations.as_ref().is_some_and(|m| m.is_up_to_date);

    Ok(Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: if connected { "connected" } else { "disconnected" },
        migrations,
        pool: get_pool_stats(&state.db),
    }))
}
