// src/models/rider.rs

//! Leaderboard rows and the enriched records published to the overlay.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field carrying the roster identifier on a leaderboard row.
///
/// Used for the join only; it never reaches a published file.
pub const ROW_ID_FIELD: &str = "id";

/// Field carrying the rider's own display name on a leaderboard row.
pub const ROW_NAME_FIELD: &str = "name";

/// Field tagging a digest record with its category label.
pub const CATEGORY_FIELD: &str = "category";

/// A leaderboard row; everything except the identifier is passed through as-is.
pub type LeaderboardRow = Map<String, Value>;

/// Identifier of a row, if it has a usable one.
///
/// Accepts string and numeric ids; empty strings and `null` count as missing.
pub fn row_id(row: &LeaderboardRow) -> Option<String> {
    match row.get(ROW_ID_FIELD)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Display name carried on the row itself.
pub fn row_name(row: &LeaderboardRow) -> Option<String> {
    row.get(ROW_NAME_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Copy of the row without its identifier.
pub fn strip_id(row: &LeaderboardRow) -> LeaderboardRow {
    row.iter()
        .filter(|(key, _)| key.as_str() != ROW_ID_FIELD)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// A display-ready rider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hometown: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// One entry of the top-riders digest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DigestRecord {
    /// Joined against the roster (or a placeholder)
    Rider(EnrichedRider),

    /// A row without an identifier, published as already-final display data
    Unenriched(LeaderboardRow),
}

impl DigestRecord {
    /// Placeholder for a category with no rows: only the label.
    pub fn placeholder(category: &str) -> Self {
        Self::Rider(EnrichedRider {
            category: Some(category.to_string()),
            ..EnrichedRider::default()
        })
    }

    /// Tag the record with its category label.
    pub fn with_category(self, category: &str) -> Self {
        match self {
            Self::Rider(mut rider) => {
                rider.category = Some(category.to_string());
                Self::Rider(rider)
            }
            Self::Unenriched(mut row) => {
                row.insert(CATEGORY_FIELD.to_string(), Value::from(category));
                Self::Unenriched(row)
            }
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Rider(rider) => rider.category.as_deref(),
            Self::Unenriched(row) => row.get(CATEGORY_FIELD).and_then(Value::as_str),
        }
    }
}
