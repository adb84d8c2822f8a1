/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST  /auth/ping` - Keep-alive
/// - `POST  /auth/register` - Create an account
/// - `POST  /auth/login` - Check credentials and set the session cookie
/// - `POST  /auth/logout` - Clear the session cookie
/// - `GET   /auth/auth-token` - Who the session cookie belongs to
/// - `POST  /auth/forgot-password` - Mail a password reset link
/// - `GET   /auth/reset-password-validation/:token` - Check a reset link
/// - `PATCH /auth/reset-password/:token` - Choose a new password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{strong_password, RequestSchema, ValidPath, ValidatedJson},
    routes::{users::user_name_fits, MessageResponse},
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use taskie_shared::{
    auth::{
        jwt::{self, JwtError, ResetClaims, SessionClaims},
        middleware::{authenticate, AuthContext, AuthError, AUTH_COOKIE},
        password,
    },
    mail::password_reset_email,
    models::user::{CreateUser, User},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Name is required"),
        custom(function = "user_name_fits")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    #[validate(custom(function = "strong_password"))]
    pub password: String,
}

impl RequestSchema for RegisterRequest {
    const FIELDS: &'static [&'static str] = &["name", "email", "password"];
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// Extends the session from one day to thirty
    #[serde(default)]
    pub remember_me: bool,
}

impl RequestSchema for LoginRequest {
    const FIELDS: &'static [&'static str] = &["email", "password"];
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

impl RequestSchema for ForgotPasswordRequest {
    const FIELDS: &'static [&'static str] = &["email"];
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[validate(custom(function = "strong_password"))]
    pub password: String,
}

impl RequestSchema for ResetPasswordRequest {
    const FIELDS: &'static [&'static str] = &["password"];
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: AuthContext,
}

/// `Set-Cookie` value carrying the session token
pub fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{AUTH_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that makes the browser drop the session cookie
pub fn cleared_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

pub async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse::new("pong"))
}

/// Register a new user
///
/// ```text
/// POST /auth/register
/// { "name": "Ada", "email": "ada@example.com", "password": "Secure!123" }
/// ```
///
/// # Errors
///
/// - `400`: validation failed, or `Email already exists.`
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully",
            user,
        }),
    ))
}

/// Log in and receive the session cookie
///
/// ```text
/// POST /auth/login
/// { "email": "ada@example.com", "password": "Secure!123", "rememberMe": true }
/// ```
///
/// # Errors
///
/// - `404`: no user with that email
/// - `401`: wrong password
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login with wrong password");
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let claims = SessionClaims::new(
        user.id,
        &user.email,
        &user.name,
        &user.role_name,
        req.remember_me,
    );
    let token = jwt::create_token(&claims, state.jwt_secret())?;
    let cookie = session_cookie(&token, claims.lifetime_seconds(), state.config.api.production);

    tracing::info!(user_id = %user.id, remember_me = req.remember_me, "User logged in");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse::new("Login successful")),
    ))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(
            header::SET_COOKIE,
            cleared_session_cookie(state.config.api.production),
        )],
        Json(MessageResponse::new("Logout successful")),
    )
}

/// Identity behind the session cookie
///
/// Every failure is a 401 here: the client only needs to know whether it is
/// still logged in.
pub async fn token_validation(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SessionResponse>> {
    match authenticate(&headers, state.jwt_secret()) {
        Ok(user) => Ok(Json(SessionResponse { user })),
        Err(AuthError::MissingCredentials) => {
            Err(ApiError::Unauthorized("Token not provided".to_string()))
        }
        Err(AuthError::Expired) => Err(ApiError::Unauthorized("Token expired".to_string())),
        Err(AuthError::InvalidToken(_)) => {
            Err(ApiError::Unauthorized("Invalid token".to_string()))
        }
    }
}

/// Mail a password reset link valid for five minutes
///
/// # Errors
///
/// - `404`: no user with that email
/// - `403`: mail delivery is not configured
/// - `500`: the mail provider failed
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| ApiError::Forbidden("Sendgrid key not provided".to_string()))?;

    let token = jwt::create_token(&ResetClaims::new(user.id), state.jwt_secret())?;
    let message = password_reset_email(&user.email, &state.config.api.client_url, &token);

    mailer.send(&message).await?;

    tracing::info!(user_id = %user.id, "Password reset link sent");
    Ok(Json(MessageResponse::new("Reset link sent to your email")))
}

/// Check a reset link before showing the new-password form
pub async fn reset_token_validation(
    State(state): State<AppState>,
    ValidPath(token): ValidPath<String>,
) -> ApiResult<Json<MessageResponse>> {
    jwt::validate_reset_token(&token, state.jwt_secret())
        .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

    Ok(Json(MessageResponse::new("Token is valid")))
}

/// Set a new password from a reset link
///
/// # Errors
///
/// - `400`: weak password, or an invalid token
/// - `401`: the token expired
/// - `404`: the user no longer exists
pub async fn reset_password(
    State(state): State<AppState>,
    ValidPath(token): ValidPath<String>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let claims = jwt::validate_reset_token(&token, state.jwt_secret()).map_err(|e| match e {
        JwtError::Expired => ApiError::Unauthorized(
            "Token has expired. Please request a new password reset.".to_string(),
        ),
        _ => ApiError::BadRequest("Invalid or expired token".to_string()),
    })?;

    let password_hash = password::hash_password(&req.password)?;

    if !User::update_password(&state.db, claims.sub, &password_hash).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %claims.sub, "Password reset");
    Ok(Json(MessageResponse::new("Password updated successfully")))
}
