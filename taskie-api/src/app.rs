/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskie_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskie_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{
        authorize::{authorize_role, extract_resource_owner, AllowedRoles},
        security::SecurityHeadersLayer,
    },
};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskie_shared::{
    auth::middleware::authenticate,
    mail::{sendgrid::SendGridMailer, Mailer},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Largest accepted request body; portraits may arrive as data URLs
pub const BODY_LIMIT_BYTES: usize = 5 * 1024 * 1024;

/// Shared application state
///
/// Cloned for each request via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,

    pub config: Arc<Config>,

    /// `None` when no SendGrid key is configured
    pub mailer: Option<Arc<dyn Mailer>>,
}

impl AppState {
    /// Creates the state, with a SendGrid mailer when a key is configured
    pub fn new(db: PgPool, config: Config) -> Self {
        let mailer = config.mail.sendgrid_api_key.as_ref().map(|key| {
            Arc::new(SendGridMailer::new(key.clone(), config.mail.sender())) as Arc<dyn Mailer>
        });

        if mailer.is_none() {
            tracing::warn!("SENDGRID_API_KEY not set; password reset mail is disabled");
        }

        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Replaces the mail transport
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
///
/// ```text
/// /
/// ├── GET /health
/// ├── /auth/                          public
/// │   ├── POST  /ping | /register | /login | /logout | /forgot-password
/// │   ├── GET   /auth-token (POST accepted too)
/// │   ├── GET   /reset-password-validation/:token
/// │   └── PATCH /reset-password/:token
/// └── /users/                         session cookie required
///     ├── GET /                       admin only
///     └── /:user_id/...               admin, or the user themself
///         ├── GET|PATCH /             PATCH /portrait
///         ├── GET|POST /tasks         GET|PATCH|DELETE /tasks/:task_id
///         └── GET|POST /collections   GET|PATCH|DELETE /collections/:collection_id
///                                     GET /collections/:collection_id/tasks
/// ```
///
/// Layers on `/users` run in order: session cookie, resource owner, role
/// check.
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{auth, collections, health, tasks, users};

    let auth_routes = Router::new()
        .route("/ping", post(auth::ping))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route(
            "/auth-token",
            get(auth::token_validation).post(auth::token_validation),
        )
        .route("/forgot-password", post(auth::forgot_password))
        .route(
            "/reset-password-validation/:token",
            get(auth::reset_token_validation),
        )
        .route("/reset-password/:token", patch(auth::reset_password));

    let admin_routes = Router::new()
        .route("/", get(users::list_users))
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles::ADMIN_ONLY,
            authorize_role,
        ));

    let owner_routes = Router::new()
        .route("/:user_id", get(users::get_user).patch(users::update_user))
        .route("/:user_id/portrait", patch(users::update_portrait))
        .route(
            "/:user_id/tasks",
            get(tasks::list_tasks).post(tasks::create_task),
        )
        .route(
            "/:user_id/tasks/:task_id",
            get(tasks::get_task)
                .patch(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route(
            "/:user_id/collections",
            get(collections::list_collections).post(collections::create_collection),
        )
        .route(
            "/:user_id/collections/:collection_id",
            get(collections::get_collection)
                .patch(collections::update_collection)
                .delete(collections::delete_collection),
        )
        .route(
            "/:user_id/collections/:collection_id/tasks",
            get(collections::list_collection_tasks),
        )
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles::ANY_MEMBER,
            authorize_role,
        ))
        .route_layer(middleware::from_fn(extract_resource_owner));

    let user_routes = admin_routes
        .merge(owner_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS for the single client origin, with credentials so the cookie flows
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = match config.api.client_url.parse() {
        Ok(origin) => vec![origin],
        Err(_) => {
            tracing::warn!(
                client_url = %config.api.client_url,
                "CLIENT_URL is not a valid origin; cross-origin requests will be refused"
            );
            Vec::new()
        }
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true)
        .expose_headers([header::SET_COOKIE])
}

/// Session cookie authentication
///
/// Validates the `authToken` cookie and injects the caller's
/// [`AuthContext`](taskie_shared::auth::middleware::AuthContext) into request
/// extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret())?;

    tracing::debug!(user_id = %auth.user_id, role = %auth.role_name, "Session authenticated");
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
