//! Service layer for the leaderboard sync engine.
//!
//! This module contains the business logic for:
//! - Roster lookup (`RiderDirectory`)
//! - Leaderboard fan-out (`LeaderboardFetcher`)
//! - Photo resolution (`PhotoCache`, `PhotoResolver`)
//! - Rider enrichment and the top-riders digest (`RiderEnricher`)
//! - Start-lane rendering (`StartLanesTransformer`)

mod directory;
mod enrichment;
mod lanes;
mod leaderboard;
mod photos;

pub use directory::RiderDirectory;
pub use enrichment::RiderEnricher;
pub use lanes::{LANES_HEADER, StartLanesTransformer, sort_entries};
pub use leaderboard::{FetchOutcome, LeaderboardFetcher};
pub use photos::{PhotoCache, PhotoResolver};
