//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! The upload endpoint is mounted at `/` and `/api/upload`. Both paths accept any method so the
//! handler can answer non-POST requests with its own plain-text 405.

pub mod handlers;
pub mod models;
