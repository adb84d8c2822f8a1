/// Password hashing and strength rules
///
/// Hashes are Argon2id PHC strings (64 MB memory, 3 passes, 4 lanes, 32-byte
/// output). Only the hash is ever stored; the `User` model never serializes it.
///
/// # Example
///
/// ```
/// use taskie_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Sup3r$ecret7")?;
/// assert!(verify_password("Sup3r$ecret7", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Minimum password length, counted in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum number of ASCII digits in a password
pub const MIN_PASSWORD_DIGITS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    /// Password rejected by the strength rules; carries the user-facing message
    #[error("{0}")]
    TooWeak(&'static str),
}

/// Hashes a password with Argon2id and a fresh random salt
///
/// # Errors
///
/// Returns `PasswordError::HashError` if the parameters or hashing fail.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Checks a password against a stored PHC hash
///
/// `Ok(false)` means the password is wrong; `Err` means the hash itself is
/// unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    if parsed_hash.hash.is_none() {
        return Err(PasswordError::InvalidHash("Hash has no output".to_string()));
    }

    // Parameters come from the PHC string
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Applies the password rules in order and reports the first one broken
///
/// 1. at least 8 characters
/// 2. at least one special character (anything but an ASCII letter or digit)
/// 3. at least 3 digits
/// 4. at least one uppercase letter
/// 5. at least one lowercase letter
///
/// ```
/// use taskie_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("MyP@ssw0rd123").is_ok());
/// assert!(validate_password_strength("MyP@ssw0rd").is_err());
/// ```
pub fn validate_password_strength(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooWeak(
            "Password must be at least 8 characters long",
        ));
    }

    if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        return Err(PasswordError::TooWeak(
            "Password must contain at least 1 special character",
        ));
    }

    if password.chars().filter(|c| c.is_ascii_digit()).count() < MIN_PASSWORD_DIGITS {
        return Err(PasswordError::TooWeak(
            "Password must contain at least 3 numbers",
        ));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordError::TooWeak(
            "Password must contain at least one uppercase letter",
        ));
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordError::TooWeak(
            "Password must contain at least one lowercase letter",
        ));
    }

    Ok(())
}
