// src/lib.rs

//! Leaderboard Sync Library
//!
//! Polls race leaderboards, joins the top riders against a local roster and
//! publishes JSON/CSV snapshots for a broadcast overlay.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
