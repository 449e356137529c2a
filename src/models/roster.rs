// src/models/roster.rs

//! Roster rows loaded from the event's rider CSV.

use serde::{Deserialize, Deserializer, Serialize};

/// One registered participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Membership serial; matches the leaderboard `id`
    #[serde(rename = "Member_SN", alias = "MEMBER_SN", deserialize_with = "trimmed")]
    pub member_sn: String,

    #[serde(rename = "NAME", default, deserialize_with = "non_empty")]
    pub name: Option<String>,

    #[serde(rename = "SPONSOR", default, deserialize_with = "non_empty")]
    pub sponsor: Option<String>,

    #[serde(rename = "CITY", default, deserialize_with = "non_empty")]
    pub city: Option<String>,

    #[serde(rename = "STATE", default, deserialize_with = "non_empty")]
    pub state: Option<String>,

    #[serde(rename = "COUNTRY", default, deserialize_with = "non_empty")]
    pub country: Option<String>,

    /// Raw photo link; may be relative, host-only or missing
    #[serde(rename = "PHOTO_LINK", default, deserialize_with = "non_empty")]
    pub photo_link: Option<String>,
}

impl RosterEntry {
    /// Compose the hometown from the most specific combination available.
    ///
    /// city+state+country > city+state > city+country > state+country > any
    /// single field. `None` only when all three are absent.
    pub fn hometown(&self) -> Option<String> {
        let city = self.city.as_deref();
        let state = self.state.as_deref();
        let country = self.country.as_deref();

        let parts: Vec<&str> = match (city, state, country) {
            (Some(c), Some(s), Some(n)) => vec![c, s, n],
            (Some(c), Some(s), None) => vec![c, s],
            (Some(c), None, Some(n)) => vec![c, n],
            (None, Some(s), Some(n)) => vec![s, n],
            (single_c, single_s, single_n) => {
                vec![single_c.or(single_s).or(single_n)?]
            }
        };

        Some(parts.join(", "))
    }
}

fn trimmed<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

/// Empty cells count as missing values.
fn non_empty<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(city: Option<&str>, state: Option<&str>, country: Option<&str>) -> RosterEntry {
        RosterEntry {
            member_sn: "1".into(),
            city: city.map(Into::into),
            state: state.map(Into::into),
            country: country.map(Into::into),
            ..RosterEntry::default()
        }
    }

    #[test]
    fn hometown_all_three() {
        let e = entry(Some("A"), Some("B"), Some("C"));
        assert_eq!(e.hometown().as_deref(), Some("A, B, C"));
    }

    #[test]
    fn hometown_pairs() {
        assert_eq!(
            entry(Some("A"), Some("B"), None).hometown().as_deref(),
            Some("A, B")
        );
        assert_eq!(
            entry(Some("A"), None, Some("C")).hometown().as_deref(),
            Some("A, C")
        );
        assert_eq!(
            entry(None, Some("B"), Some("C")).hometown().as_deref(),
            Some("B, C")
        );
    }

    #[test]
    fn hometown_single_field() {
        assert_eq!(entry(None, Some("B"), None).hometown().as_deref(), Some("B"));
        assert_eq!(entry(Some("A"), None, None).hometown().as_deref(), Some("A"));
        assert_eq!(entry(None, None, Some("C")).hometown().as_deref(), Some("C"));
    }

    #[test]
    fn hometown_omitted_when_empty() {
        assert_eq!(entry(None, None, None).hometown(), None);
    }
}
