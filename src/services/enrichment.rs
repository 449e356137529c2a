// src/services/enrichment.rs

//! Joins leaderboard rows against the rider directory.

use std::sync::Arc;

use crate::models::{
    Category, DigestRecord, EnrichedRider, LeaderboardRow, row_id, row_name, strip_id,
};
use crate::services::{PhotoResolver, RiderDirectory};

/// Produces display-ready rider records.
#[derive(Clone)]
pub struct RiderEnricher {
    directory: Arc<RiderDirectory>,
    photos: PhotoResolver,
}

impl RiderEnricher {
    pub fn new(directory: Arc<RiderDirectory>, photos: PhotoResolver) -> Self {
        Self { directory, photos }
    }

    /// Enrich one leaderboard row.
    pub async fn enrich(&self, row: Option<&LeaderboardRow>) -> DigestRecord {
        let Some(row) = row else {
            log::warn!("No rider found in leaderboard response");
            return DigestRecord::Rider(EnrichedRider::default());
        };

        let Some(id) = row_id(row) else {
            log::warn!("No rider identifier in leaderboard row; publishing it unenriched");
            return DigestRecord::Unenriched(strip_id(row));
        };

        match self.directory.find(&id) {
            Some(entry) => {
                let photo = self.photos.resolve(entry.photo_link.as_deref(), &id).await;
                DigestRecord::Rider(EnrichedRider {
                    name: entry.name.clone(),
                    sponsor: entry.sponsor.clone(),
                    hometown: entry.hometown(),
                    photo: Some(photo),
                    category: None,
                })
            }
            None => {
                let name = row_name(row);
                log::warn!(
                    "Unable to find rider information for {} ID {} in roster",
                    name.as_deref().unwrap_or("<unnamed>"),
                    id
                );
                DigestRecord::Rider(EnrichedRider {
                    name,
                    photo: Some(self.photos.placeholder().to_string()),
                    ..EnrichedRider::default()
                })
            }
        }
    }

    /// Build the flattened top-riders digest in catalog order.
    ///
    /// Each category contributes its first `top_n` rows, enriched and tagged
    /// with the label, or a single label-only placeholder when it has no rows.
    /// Enrichment is sequential so photo cache reads and writes stay ordered.
    pub async fn digest(
        &self,
        categories: &[Category],
        results: &[Vec<LeaderboardRow>],
        top_n: usize,
    ) -> Vec<DigestRecord> {
        let mut records = Vec::new();

        for (category, rows) in categories.iter().zip(results) {
            if rows.is_empty() {
                records.push(DigestRecord::placeholder(category.label));
                continue;
            }
            for row in rows.iter().take(top_n) {
                let record = self.enrich(Some(row)).await;
                records.push(record.with_category(category.label));
            }
        }

        records
    }
}
