//! Dish Digest Server library.
//!
//! This crate provides the subscription service as a library, allowing it
//! to be tested through the router without binding a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod extract;
pub mod kv;
pub mod middleware;
pub mod notify;
pub mod routes;
pub mod state;
pub mod store;
pub mod token;
