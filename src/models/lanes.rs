// src/models/lanes.rs

//! Start-lane assignment data.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One rider's gate assignment in a moto.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneEntry {
    #[serde(default, deserialize_with = "number_like")]
    pub moto_number: u32,

    #[serde(default, deserialize_with = "number_like")]
    pub lane: u32,

    #[serde(default, deserialize_with = "text_like")]
    pub race_name: String,

    #[serde(default, deserialize_with = "text_like")]
    pub class_name: String,

    #[serde(default, deserialize_with = "text_like")]
    pub first_name: String,

    #[serde(default, deserialize_with = "text_like")]
    pub last_name: String,

    #[serde(default, deserialize_with = "text_like")]
    pub bike_number: String,

    #[serde(default, deserialize_with = "text_like")]
    pub country_code: String,
}

impl LaneEntry {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Accepted shapes of a lane dataset.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LaneDataset {
    List(Vec<LaneEntry>),
    Wrapped { entries: Vec<LaneEntry> },
}

impl LaneDataset {
    pub fn into_entries(self) -> Vec<LaneEntry> {
        match self {
            LaneDataset::List(entries) | LaneDataset::Wrapped { entries } => entries,
        }
    }
}

/// Numbers sometimes arrive quoted.
fn number_like<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| D::Error::custom(format!("invalid number {n}"))),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid number '{s}'"))),
        other => Err(D::Error::custom(format!("expected number, got {other}"))),
    }
}

/// Bike numbers and codes may be numeric in the feed.
fn text_like<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}
