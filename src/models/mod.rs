// src/models/mod.rs

//! Domain models for the leaderboard sync engine.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod category;
mod config;
mod lanes;
mod rider;
mod roster;

// Re-export all public types
pub use category::{Category, RaceSlot, catalog};
pub use config::{
    Config, DisplayConfig, EventType, HttpConfig, PollConfig, SessionConfig, SessionOverrides,
};
pub use lanes::{LaneDataset, LaneEntry};
pub use rider::{
    CATEGORY_FIELD, DigestRecord, EnrichedRider, LeaderboardRow, ROW_ID_FIELD, ROW_NAME_FIELD,
    row_id, row_name, strip_id,
};
pub use roster::RosterEntry;
