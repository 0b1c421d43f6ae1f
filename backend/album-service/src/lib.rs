//! Album Service
//!
//! Album upload/profile CRUD plus the asynchronous review pipeline. Two
//! binaries share this crate: `album-service` (HTTP API, review producer)
//! and `review-worker` (queue consumer). The queue contract itself lives in
//! the `review-schema` crate so both sides agree on it.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod queue;
pub mod services;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};
