/// API route handlers, organized by resource
///
/// - `health`: health check
/// - `auth`: registration, login, session and password reset
/// - `users`: profiles and the admin user list
/// - `tasks`: a user's tasks
/// - `collections`: a user's collections and the tasks inside them

pub mod auth;
pub mod collections;
pub mod health;
pub mod tasks;
pub mod users;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Body of responses that only carry a message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 200 with the list, or 204 without a body when it is empty
pub(crate) fn list_or_no_content<T: Serialize>(items: Vec<T>) -> Response {
    if items.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        Json(items).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_is_no_content() {
        let response = list_or_no_content(Vec::<u8>::new());
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_non_empty_list_is_ok() {
        let response = list_or_no_content(vec![1, 2, 3]);
        assert_eq!(response.status(), StatusCode::OK);
    }
}
