// src/models/category.rs

//! Leaderboard categories and the ordered request catalog.
//!
//! The catalog order is the contract with the overlay: the Nth fetch result
//! belongs to the Nth category, and both the snapshot files and the top-riders
//! digest follow that order.

use url::Url;

use crate::error::{AppError, Result};
use crate::models::{EventType, HttpConfig, SessionConfig};

/// Which of the two configured races a category is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceSlot {
    Primary,
    Weekend,
}

/// One named leaderboard view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Display label, also the basis of the snapshot file name
    pub label: &'static str,

    /// Race the view is read from
    pub race: RaceSlot,

    /// Query parameters, in request order
    pub query: Vec<(&'static str, String)>,
}

impl Category {
    fn new(label: &'static str, race: RaceSlot, query: &[(&'static str, &str)]) -> Self {
        Self {
            label,
            race,
            query: query.iter().map(|(k, v)| (*k, v.to_string())).collect(),
        }
    }

    /// Snapshot file name: label with spaces replaced by underscores.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.label.replace(' ', "_"))
    }

    /// Build the request URL for this category.
    pub fn url(&self, http: &HttpConfig, session: &SessionConfig) -> Result<Url> {
        let race_id = match self.race {
            RaceSlot::Primary => session.race_id.trim(),
            RaceSlot::Weekend => session.weekend_race_id.trim(),
        };
        if race_id.is_empty() {
            return Err(AppError::config(format!(
                "no race id configured for category {}",
                self.label
            )));
        }

        let base = http.leaderboard_base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!(
            "{base}/{race_id}/{}",
            http.sanctioning_body.trim_matches('/')
        ))?;
        url.query_pairs_mut()
            .extend_pairs(self.query.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(url)
    }
}

/// Build the ordered catalog for a session.
///
/// 13 base categories, then 6 sector-time and 4 hill-time categories when
/// those views are enabled. Sector and hill views always query combined events.
pub fn catalog(session: &SessionConfig) -> Vec<Category> {
    use RaceSlot::{Primary, Weekend};

    let event = session.event_type.as_str();
    let combined = EventType::Combined.as_str();

    let mut categories = vec![
        Category::new("Men Pro", Primary, &[("eventType", event), ("proficiencyCode", "A")]),
        Category::new("Women Pro", Primary, &[("eventType", event), ("proficiencyCode", "Z")]),
        Category::new("Vet Pro", Primary, &[("eventType", event), ("proficiencyCode", "V")]),
        Category::new("Girl Cruiser", Primary, &[("eventType", event), ("proficiencyCode", "H")]),
        Category::new("Cruiser", Primary, &[("eventType", event), ("proficiencyCode", "C")]),
        Category::new("Novice", Primary, &[("eventType", event), ("proficiencyCode", "N")]),
        Category::new("Intermediate", Primary, &[("eventType", event), ("proficiencyCode", "I")]),
        Category::new("Girls Expert", Primary, &[("eventType", event), ("proficiencyCode", "G")]),
        Category::new("Expert", Primary, &[("eventType", event), ("proficiencyCode", "E")]),
        Category::new(
            "Flat Girls",
            Primary,
            &[("eventType", event), ("gender", "female"), ("minAge", "5"), ("maxAge", "12")],
        ),
        Category::new(
            "Flat Boys",
            Primary,
            &[("eventType", event), ("gender", "male"), ("minAge", "5"), ("maxAge", "12")],
        ),
        Category::new("Overall Women", Weekend, &[("eventType", event), ("gender", "female")]),
        Category::new("Overall Men", Weekend, &[("eventType", event), ("gender", "male")]),
    ];

    if session.include_sector_time {
        let sector = |label, race, extra: &[(&'static str, &'static str)]| {
            let mut query = vec![("eventType", combined), ("sortBy", "sectorTime")];
            query.extend_from_slice(extra);
            Category::new(label, race, &query)
        };
        categories.extend([
            sector("Sector Time Women", Weekend, &[("gender", "female")]),
            sector("Sector Time Men", Weekend, &[("gender", "male")]),
            sector("Sector Overall Men", Primary, &[("gender", "male")]),
            sector("Sector Overall Women", Primary, &[("gender", "female")]),
            sector("Sector Male Flats", Weekend, &[("gender", "male"), ("maxAge", "12")]),
            sector("Sector Female Flats", Weekend, &[("gender", "female"), ("maxAge", "12")]),
        ]);
    }

    if session.include_hill_time {
        let hill = |label, extra: &[(&'static str, &'static str)]| {
            let mut query = vec![("eventType", combined), ("sortBy", "hillTime")];
            query.extend_from_slice(extra);
            Category::new(label, Weekend, &query)
        };
        categories.extend([
            hill("Hill Time Male", &[("gender", "male")]),
            hill("Hill Time Female", &[("gender", "female")]),
            hill("Hill Time Flats Male", &[("gender", "male"), ("maxAge", "12")]),
            hill("Hill Time Flats Female", &[("gender", "female"), ("maxAge", "12")]),
        ]);
    }

    categories
}
