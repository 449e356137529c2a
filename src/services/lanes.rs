// src/services/lanes.rs

//! Start-lanes transformer.
//!
//! Reads a lane-assignment dataset from a URL or a local file, orders it by
//! moto then lane, and renders the flat CSV the overlay's gate graphic reads.

use std::path::Path;

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{LaneDataset, LaneEntry};
use crate::storage::SnapshotStorage;
use crate::utils::http::fetch_json;
use crate::utils::url::is_remote;

/// Column header of the rendered file.
pub const LANES_HEADER: [&str; 7] = [
    "Race",
    "Class",
    "Lane",
    "Name",
    "Bike Number",
    "Country",
    "Flag",
];

#[derive(Clone)]
pub struct StartLanesTransformer {
    client: Client,
    flag_url_template: String,
}

impl StartLanesTransformer {
    pub fn new(client: Client, flag_url_template: impl Into<String>) -> Self {
        Self {
            client,
            flag_url_template: flag_url_template.into(),
        }
    }

    /// Load and sort the configured dataset.
    ///
    /// `None` when no source is configured or the source could not be read.
    pub async fn fetch_sorted(
        &self,
        source: Option<&str>,
        ascending: bool,
    ) -> Option<Vec<LaneEntry>> {
        let source = source.map(str::trim).filter(|s| !s.is_empty())?;

        let mut entries = match self.load(source).await {
            Ok(entries) => entries,
            Err(e) => {
                log::info!("Skipping start lanes: {}", e);
                return None;
            }
        };
        sort_entries(&mut entries, ascending);
        Some(entries)
    }

    /// Render sorted entries and replace the target file; returns the row count.
    pub async fn write(
        &self,
        target: &dyn SnapshotStorage,
        file_name: &str,
        entries: &[LaneEntry],
    ) -> Result<usize> {
        let bytes = self.render(entries)?;
        target.write_bytes(file_name, &bytes).await?;
        Ok(entries.len())
    }

    /// Try the source over the network first, then as a local file.
    pub async fn load(&self, source: &str) -> Result<Vec<LaneEntry>> {
        if is_remote(source) {
            match fetch_json::<LaneDataset>(&self.client, source).await {
                Ok(dataset) => return Ok(dataset.into_entries()),
                Err(e) => log::debug!("Start lanes fetch from {} failed: {}", source, e),
            }
        }

        match read_local(Path::new(source)).await {
            Ok(dataset) => Ok(dataset.into_entries()),
            Err(e) => {
                log::debug!("Start lanes file {} unreadable: {}", source, e);
                Err(AppError::LanesUnavailable(source.to_string()))
            }
        }
    }

    /// Render sorted entries as CSV.
    pub fn render(&self, entries: &[LaneEntry]) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(LANES_HEADER)?;

        for entry in entries {
            let lane = entry.lane.to_string();
            let name = entry.full_name();
            let flag = self.flag_url(&entry.country_code);
            writer.write_record([
                entry.race_name.as_str(),
                entry.class_name.as_str(),
                lane.as_str(),
                name.as_str(),
                entry.bike_number.as_str(),
                entry.country_code.as_str(),
                flag.as_str(),
            ])?;
        }

        writer
            .into_inner()
            .map_err(|e| AppError::Io(e.into_error()))
    }

    /// Flag image for a country code; empty when the code is missing.
    pub fn flag_url(&self, country_code: &str) -> String {
        let code = country_code.trim();
        if code.is_empty() {
            return String::new();
        }
        self.flag_url_template
            .replace("{code}", &code.to_lowercase())
    }
}

async fn read_local(path: &Path) -> Result<LaneDataset> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Moto ascending, then lane ascending or descending.
pub fn sort_entries(entries: &mut [LaneEntry], ascending: bool) {
    entries.sort_by(|a, b| {
        a.moto_number.cmp(&b.moto_number).then_with(|| {
            let lanes = a.lane.cmp(&b.lane);
            if ascending { lanes } else { lanes.reverse() }
        })
    });
}
