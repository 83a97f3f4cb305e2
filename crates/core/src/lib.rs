//! Dish Digest Core - Shared types library.
//!
//! This crate provides the common types used across Dish Digest components:
//! - `server` - The subscription HTTP service
//! - downstream jobs that store the day's picks or consume the subscriber
//!   list to send mail
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no key-value access, no
//! HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Normalized email addresses, subscriber records, and the
//!   daily picks payload

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
