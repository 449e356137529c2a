//! Storage abstractions for snapshot publishing.
//!
//! The overlay reads plain files from one output directory:
//!
//! ```text
//! {output_dir}/
//! ├── Men_Pro.json          # One array per category, identifiers stripped
//! ├── ...
//! ├── top_riders.json       # Flattened top-N digest, catalog order
//! └── start_lanes.csv       # Optional gate assignments
//! ```
//!
//! Files are replaced atomically so the overlay never reads a half-written
//! snapshot; the last good file stays in place when a write fails.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Category, DigestRecord, LeaderboardRow, strip_id};

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Make sure the destination exists.
    async fn prepare(&self) -> Result<()>;

    /// Replace a file with the given bytes.
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Write one category's rows, identifiers stripped.
    async fn write_category(&self, category: &Category, rows: &[LeaderboardRow]) -> Result<()> {
        let public: Vec<LeaderboardRow> = rows.iter().map(strip_id).collect();
        let bytes = serde_json::to_vec(&public)?;
        self.write_bytes(&category.file_name(), &bytes).await
    }

    /// Write the top-riders digest.
    async fn write_digest(&self, key: &str, records: &[DigestRecord]) -> Result<()> {
        let bytes = serde_json::to_vec(records)?;
        self.write_bytes(key, &bytes).await
    }
}
