/// Request extractors with JSON error bodies
///
/// [`ValidatedJson`] parses the body like `axum::Json` and then runs the
/// request type's `validator` rules. Either failure becomes a 400 whose
/// message is the first problem found: the JSON parser's message, or the
/// message of the first failing field in [`RequestSchema::FIELDS`] order.
///
/// [`ValidPath`] and [`ValidQuery`] wrap axum's extractors so a malformed id
/// or query string is answered with the usual [`ApiError`] body.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use taskie_api::extract::{RequestSchema, ValidatedJson};
/// use validator::Validate;
///
/// #[derive(Debug, Deserialize, Validate)]
/// struct Rename {
///     #[serde(default)]
///     #[validate(length(min = 1, message = "Name is required"))]
///     name: String,
/// }
///
/// impl RequestSchema for Rename {
///     const FIELDS: &'static [&'static str] = &["name"];
/// }
///
/// async fn rename(ValidatedJson(body): ValidatedJson<Rename>) -> String {
///     body.name
/// }
/// ```

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use taskie_shared::auth::password::{validate_password_strength, PasswordError};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::ApiError;

/// A request body with validation rules
pub trait RequestSchema: Validate + DeserializeOwned {
    /// Field names in the order their errors should be reported
    const FIELDS: &'static [&'static str];
}

/// JSON body that passed its validation rules
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: RequestSchema,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| ApiError::BadRequest(first_message(&errors, T::FIELDS)))?;

        Ok(Self(value))
    }
}

/// Path parameters; a value that does not parse is a 400
#[derive(Debug, Clone)]
pub struct ValidPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        Ok(Self(value))
    }
}

/// Query string parameters; a value that does not parse is a 400
#[derive(Debug, Clone)]
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        Ok(Self(value))
    }
}

/// Message of the first failing field, following `order`
///
/// Fields missing from `order` are considered afterwards, alphabetically, so
/// the result is deterministic.
pub fn first_message(errors: &ValidationErrors, order: &[&str]) -> String {
    let field_errors = errors.field_errors();

    let mut remaining: Vec<&str> = field_errors
        .keys()
        .map(|key| &**key)
        .filter(|key| !order.contains(key))
        .collect();
    remaining.sort_unstable();

    order
        .iter()
        .copied()
        .chain(remaining)
        .filter_map(|field| field_errors.get(field))
        .flat_map(|errors| errors.iter())
        .map(|error| match &error.message {
            Some(message) => message.to_string(),
            None => format!("Invalid value ({})", error.code),
        })
        .next()
        .unwrap_or_else(|| "Invalid request body".to_string())
}

/// Postgres text columns cannot store `\0`
pub fn no_nul_chars(text: &str) -> Result<(), ValidationError> {
    if text.contains('\0') {
        let mut error = ValidationError::new("nul_character");
        error.message = Some(Cow::Borrowed("Text must not contain NUL characters"));
        return Err(error);
    }
    Ok(())
}

/// `validator` adapter for the shared password rules
pub fn strong_password(password: &str) -> Result<(), ValidationError> {
    match validate_password_strength(password) {
        Ok(()) => Ok(()),
        Err(PasswordError::TooWeak(message)) => {
            let mut error = ValidationError::new("password_strength");
            error.message = Some(Cow::Borrowed(message));
            Err(error)
        }
        Err(other) => {
            let mut error = ValidationError::new("password_strength");
            error.message = Some(Cow::Owned(other.to_string()));
            Err(error)
        }
    }
}
