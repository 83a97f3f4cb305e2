//! Middleware and auth extractors.

pub mod auth;

pub use auth::RequireBearer;
