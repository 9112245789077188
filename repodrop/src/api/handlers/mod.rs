//! HTTP request handlers.
//!
//! - [`upload`]: Multipart upload committed to the configured GitHub repository

pub mod upload;
