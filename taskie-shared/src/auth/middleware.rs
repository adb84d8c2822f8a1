/// Cookie session authentication
///
/// The login route sets the session token in the HTTP-only `authToken`
/// cookie. Protected routes read it back here, validate it and turn the claims
/// into an [`AuthContext`] that the API layer stores in request extensions.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use taskie_shared::auth::jwt::{create_token, SessionClaims};
/// use taskie_shared::auth::middleware::authenticate;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-secret-of-at-least-thirty-two-bytes";
/// let claims = SessionClaims::new(Uuid::new_v4(), "ada@example.com", "Ada", "user", false);
/// let token = create_token(&claims, secret)?;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::COOKIE, HeaderValue::from_str(&format!("authToken={token}"))?);
///
/// let auth = authenticate(&headers, secret)?;
/// assert_eq!(auth.user_id, claims.sub);
/// # Ok(())
/// # }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_session_token, JwtError, SessionClaims};

/// Name of the cookie holding the session token
pub const AUTH_COOKIE: &str = "authToken";

/// Identity of the caller, attached to request extensions after authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    #[serde(rename = "id")]
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role_name: String,
}

impl From<SessionClaims> for AuthContext {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            role_name: claims.role_name,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `authToken` cookie on the request
    #[error("No token provided")]
    MissingCredentials,

    #[error("Token expired")]
    Expired,

    /// Bad signature, malformed token or wrong token type
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            other => AuthError::InvalidToken(other.to_string()),
        }
    }
}

/// Finds a cookie by name across every `Cookie` header
///
/// Values are returned as sent; surrounding double quotes are stripped.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// Reads the session token from the request cookies
pub fn token_from_cookies(headers: &HeaderMap) -> Option<&str> {
    cookie_value(headers, AUTH_COOKIE)
}

/// Authenticates a request from its `authToken` cookie
///
/// # Errors
///
/// - `MissingCredentials` when the cookie is absent
/// - `Expired` when the token is past its `exp`
/// - `InvalidToken` for anything else that fails validation
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = token_from_cookies(headers).ok_or(AuthError::MissingCredentials)?;
    let claims = validate_session_token(token, secret)?;
    Ok(AuthContext::from(claims))
}
