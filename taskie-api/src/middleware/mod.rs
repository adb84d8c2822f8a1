/// Middleware for the API server
///
/// - `security`: security response headers
/// - `authorize`: resource owner extraction and role checks
///
/// Session cookie authentication lives in `app` next to the router, since it
/// needs the application state.

pub mod authorize;
pub mod security;
