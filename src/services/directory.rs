// src/services/directory.rs

//! Rider directory loaded from the roster CSV.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::RosterEntry;

/// In-memory roster, immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct RiderDirectory {
    entries: Vec<RosterEntry>,
    /// Identifier -> index of its first row
    index: HashMap<String, usize>,
}

impl RiderDirectory {
    /// Load the roster from a CSV file with a header row.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::directory_load(path, e))?;
        Self::from_csv(&bytes).map_err(|e| AppError::directory_load(path, e))
    }

    /// Parse roster CSV content.
    pub fn from_csv(data: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(data);

        let entries = reader
            .deserialize::<RosterEntry>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: Vec<RosterEntry>) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.member_sn.is_empty() {
                continue;
            }
            // First row wins for duplicate identifiers.
            index.entry(entry.member_sn.clone()).or_insert(i);
        }
        Self { entries, index }
    }

    /// First entry whose identifier equals `id`.
    pub fn find(&self, id: &str) -> Option<&RosterEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
