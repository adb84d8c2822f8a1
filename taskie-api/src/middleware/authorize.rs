/// Resource ownership and role checks
///
/// Two `from_fn` middlewares run after session authentication:
///
/// 1. [`extract_resource_owner`] reads the `:user_id` path parameter into a
///    [`ResourceOwner`] request extension.
/// 2. [`authorize_role`] checks the caller's role against the route's
///    [`AllowedRoles`] and the owner through the shared rules table.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use taskie_api::middleware::authorize::{authorize_role, extract_resource_owner, AllowedRoles};
///
/// let routes: Router = Router::new()
///     .route("/:user_id", get(|| async { "mine" }))
///     .route_layer(middleware::from_fn_with_state(AllowedRoles::ANY_MEMBER, authorize_role))
///     .route_layer(middleware::from_fn(extract_resource_owner));
/// ```

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use taskie_shared::auth::{
    authorization::{authorize, ADMIN, USER},
    middleware::AuthContext,
};
use uuid::Uuid;

use crate::error::ApiError;

/// Path parameter naming the owner of the addressed data
pub const OWNER_PARAM: &str = "user_id";

/// Owner of the data a request addresses; `None` on routes without `:user_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceOwner(pub Option<Uuid>);

/// Roles a route accepts
#[derive(Debug, Clone, Copy)]
pub struct AllowedRoles(pub &'static [&'static str]);

impl AllowedRoles {
    pub const ADMIN_ONLY: Self = Self(&[ADMIN]);
    pub const ANY_MEMBER: Self = Self(&[ADMIN, USER]);
}

fn parse_owner(params: Option<&HashMap<String, String>>) -> Result<ResourceOwner, ApiError> {
    match params.and_then(|params| params.get(OWNER_PARAM)) {
        None => Ok(ResourceOwner(None)),
        Some(raw) => Uuid::parse_str(raw)
            .map(|id| ResourceOwner(Some(id)))
            .map_err(|_| ApiError::BadRequest("Invalid user id".to_string())),
    }
}

/// Stores the `:user_id` path parameter as a [`ResourceOwner`]
pub async fn extract_resource_owner(
    params: Option<Path<HashMap<String, String>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let owner = parse_owner(params.as_ref().map(|Path(params)| params))?;
    req.extensions_mut().insert(owner);

    Ok(next.run(req).await)
}

/// Rejects callers whose role or ownership does not fit the route
pub async fn authorize_role(
    State(allowed): State<AllowedRoles>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = req.extensions().get::<AuthContext>();
    let owner = req
        .extensions()
        .get::<ResourceOwner>()
        .copied()
        .unwrap_or(ResourceOwner(None));

    if let Err(err) = authorize(auth, allowed.0, owner.0) {
        tracing::debug!(
            user_id = ?auth.map(|auth| auth.user_id),
            resource_owner = ?owner.0,
            error = %err,
            "Authorization denied"
        );
        return Err(err.into());
    }

    Ok(next.run(req).await)
}
