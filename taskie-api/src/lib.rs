//! # Taskie API Server Library
//!
//! HTTP layer of the Taskie task and collection backend.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from the environment
//! - `error`: error handling and HTTP response mapping
//! - `extract`: validated JSON, path and query extractors
//! - `middleware`: security headers, resource owner and role checks
//! - `routes`: route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
