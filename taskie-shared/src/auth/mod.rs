/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and password strength rules
/// - [`jwt`]: session and password reset tokens
/// - [`middleware`]: reading and validating the session cookie
/// - [`authorization`]: the role rules table and the ownership check
///
/// # Example
///
/// ```
/// use taskie_shared::auth::password::{hash_password, verify_password};
/// use taskie_shared::auth::jwt::{create_token, validate_session_token, SessionClaims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Sup3r$ecret7")?;
/// assert!(verify_password("Sup3r$ecret7", &hash)?);
///
/// let claims = SessionClaims::new(Uuid::new_v4(), "ada@example.com", "Ada", "user", true);
/// let token = create_token(&claims, "a-secret-of-at-least-thirty-two-bytes")?;
/// assert!(validate_session_token(&token, "a-secret-of-at-least-thirty-two-bytes").is_ok());
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
