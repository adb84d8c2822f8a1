/// Signed token creation and validation
///
/// Tokens are HS256 JWTs with issuer `taskie`. Two kinds exist:
///
/// - **Session**: carried in the `authToken` cookie, identifies the caller
///   (`sub`, `email`, `name`, `role_name`). Lives 1 day, or 30 days when the
///   login asked to be remembered.
/// - **Password reset**: embedded in the reset link, identifies the user whose
///   password may be changed. Lives 5 minutes.
///
/// Each kind carries its `token_type`, and validation rejects the wrong kind,
/// so a reset link can never be replayed as a session cookie.
///
/// # Example
///
/// ```
/// use taskie_shared::auth::jwt::{create_token, validate_session_token, SessionClaims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-secret-of-at-least-thirty-two-bytes";
/// let user_id = Uuid::new_v4();
///
/// let claims = SessionClaims::new(user_id, "ada@example.com", "Ada", "user", false);
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_session_token(&token, secret)?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// Issuer written into and required from every token
pub const ISSUER: &str = "taskie";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    /// A valid token of another kind was presented
    #[error("Expected {expected} token, got {actual}")]
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Session,
    PasswordReset,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Session => "session",
            TokenType::PasswordReset => "password_reset",
        }
    }
}

/// Lifetime of a session token
pub fn session_lifetime(remember_me: bool) -> Duration {
    if remember_me {
        Duration::days(30)
    } else {
        Duration::days(1)
    }
}

/// Lifetime of a password reset token
pub fn reset_lifetime() -> Duration {
    Duration::minutes(5)
}

/// Claims of the session cookie token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: Uuid,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub token_type: TokenType,
    pub email: String,
    pub name: String,
    pub role_name: String,
}

impl SessionClaims {
    pub fn new(user_id: Uuid, email: &str, name: &str, role_name: &str, remember_me: bool) -> Self {
        Self::with_expiration(user_id, email, name, role_name, session_lifetime(remember_me))
    }

    pub fn with_expiration(
        user_id: Uuid,
        email: &str,
        name: &str,
        role_name: &str,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            token_type: TokenType::Session,
            email: email.to_string(),
            name: name.to_string(),
            role_name: role_name.to_string(),
        }
    }

    /// Seconds between issue and expiry, used as the cookie `Max-Age`
    pub fn lifetime_seconds(&self) -> i64 {
        (self.exp - self.iat).max(0)
    }
}

/// Claims of the password reset link token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetClaims {
    /// User ID
    pub sub: Uuid,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub token_type: TokenType,
}

impl ResetClaims {
    pub fn new(user_id: Uuid) -> Self {
        Self::with_expiration(user_id, reset_lifetime())
    }

    pub fn with_expiration(user_id: Uuid, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            token_type: TokenType::PasswordReset,
        }
    }
}

/// Signs claims with HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if serialization or signing fails.
pub fn create_token<C: Serialize>(claims: &C, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, issuer, `exp` and `nbf`, then decodes the claims
fn validate_token<C: DeserializeOwned>(token: &str, secret: &str) -> Result<C, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<C>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

fn expect_type(expected: TokenType, actual: TokenType) -> Result<(), JwtError> {
    if expected == actual {
        Ok(())
    } else {
        Err(JwtError::WrongType {
            expected: expected.as_str(),
            actual: actual.as_str(),
        })
    }
}

/// Validates a session cookie token
pub fn validate_session_token(token: &str, secret: &str) -> Result<SessionClaims, JwtError> {
    let claims: SessionClaims = validate_token(token, secret)?;
    expect_type(TokenType::Session, claims.token_type)?;
    Ok(claims)
}

/// Validates a password reset token
///
/// Session claims are a superset of reset claims, so a session token decodes
/// here and is then rejected as `WrongType`.
pub fn validate_reset_token(token: &str, secret: &str) -> Result<ResetClaims, JwtError> {
    let claims: ResetClaims = validate_token(token, secret)?;
    expect_type(TokenType::PasswordReset, claims.token_type)?;
    Ok(claims)
}
