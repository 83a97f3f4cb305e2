//! Core types for Dish Digest.
//!
//! This module provides type-safe wrappers for the domain concepts shared
//! between the server and the jobs that consume its data.

pub mod email;
pub mod picks;
pub mod subscriber;

pub use email::{Email, EmailError};
pub use picks::{DailyPicks, EateryPicks, MealSlot};
pub use subscriber::SubscriberRecord;
