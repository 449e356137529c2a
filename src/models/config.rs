//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client and upstream endpoint settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Polling cadence and output file names
    #[serde(default)]
    pub poll: PollConfig,

    /// Display fallbacks used by enrichment and start lanes
    #[serde(default)]
    pub display: DisplayConfig,

    /// Initial session settings (what the host would pass to Start)
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate engine-wide values for basic sanity.
    ///
    /// Session values are checked separately by [`SessionConfig::validate`],
    /// since they may still be supplied by overrides at start time.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.http.leaderboard_base_url).map_err(|e| {
            AppError::validation(format!("http.leaderboard_base_url is invalid: {e}"))
        })?;
        if self.http.sanctioning_body.trim().is_empty() {
            return Err(AppError::validation("http.sanctioning_body is empty"));
        }
        if self.poll.interval_ms == 0 {
            return Err(AppError::validation("poll.interval_ms must be > 0"));
        }
        if self.poll.top_riders_file.trim().is_empty() {
            return Err(AppError::validation("poll.top_riders_file is empty"));
        }
        if self.display.placeholder_photo_url.trim().is_empty() {
            return Err(AppError::validation("display.placeholder_photo_url is empty"));
        }
        Ok(())
    }
}

/// HTTP client and upstream endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Leaderboard endpoint; the race id and sanctioning body are appended
    #[serde(default = "defaults::leaderboard_base_url")]
    pub leaderboard_base_url: String,

    /// Path segment following the race id
    #[serde(default = "defaults::sanctioning_body")]
    pub sanctioning_body: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            leaderboard_base_url: defaults::leaderboard_base_url(),
            sanctioning_body: defaults::sanctioning_body(),
        }
    }
}

/// Polling cadence and output file names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between the end of one cycle and the start of the next
    #[serde(default = "defaults::interval")]
    pub interval_ms: u64,

    /// File name of the flattened top-riders digest
    #[serde(default = "defaults::top_riders_file")]
    pub top_riders_file: String,

    /// File name of the rendered start lanes
    #[serde(default = "defaults::start_lanes_file")]
    pub start_lanes_file: String,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: defaults::interval(),
            top_riders_file: defaults::top_riders_file(),
            start_lanes_file: defaults::start_lanes_file(),
        }
    }
}

/// Display fallbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Generic headshot used whenever a rider photo is missing or unreachable
    #[serde(default = "defaults::placeholder_photo_url")]
    pub placeholder_photo_url: String,

    /// Flag image URL; `{code}` is replaced by the lower-cased country code
    #[serde(default = "defaults::flag_url_template")]
    pub flag_url_template: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            placeholder_photo_url: defaults::placeholder_photo_url(),
            flag_url_template: defaults::flag_url_template(),
        }
    }
}

/// Leaderboard event type filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[default]
    Race,
    Training,
    Combined,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Race => "race",
            EventType::Training => "training",
            EventType::Combined => "combined",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "race" => Ok(EventType::Race),
            "training" => Ok(EventType::Training),
            "combined" => Ok(EventType::Combined),
            other => Err(AppError::config(format!(
                "unknown event type '{other}' (expected race, training or combined)"
            ))),
        }
    }
}

/// Settings for one polling session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Primary race id
    #[serde(default)]
    pub race_id: String,

    /// Weekend race id used by the overall, sector and hill views
    #[serde(default)]
    pub weekend_race_id: String,

    /// Roster CSV file
    #[serde(default)]
    pub roster_file: PathBuf,

    /// Directory receiving the snapshot files
    #[serde(default)]
    pub output_dir: PathBuf,

    #[serde(default = "defaults::include_sector_time")]
    pub include_sector_time: bool,

    #[serde(default)]
    pub include_hill_time: bool,

    #[serde(default)]
    pub event_type: EventType,

    /// URL or local path of the lane-assignment dataset
    #[serde(default)]
    pub start_lanes_source: Option<String>,

    /// Lane order within a moto
    #[serde(default = "defaults::start_lanes_ascending")]
    pub start_lanes_ascending: bool,

    /// Number of riders per category in the digest
    #[serde(default = "defaults::top_riders")]
    pub top_riders: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            race_id: String::new(),
            weekend_race_id: String::new(),
            roster_file: PathBuf::new(),
            output_dir: PathBuf::new(),
            include_sector_time: defaults::include_sector_time(),
            include_hill_time: false,
            event_type: EventType::default(),
            start_lanes_source: None,
            start_lanes_ascending: defaults::start_lanes_ascending(),
            top_riders: defaults::top_riders(),
        }
    }
}

impl SessionConfig {
    /// Merge a partial override; fields left as `None` keep their value.
    pub fn apply(&mut self, overrides: SessionOverrides) {
        let SessionOverrides {
            race_id,
            weekend_race_id,
            roster_file,
            output_dir,
            include_sector_time,
            include_hill_time,
            event_type,
            start_lanes_source,
            start_lanes_ascending,
            top_riders,
        } = overrides;

        if let Some(v) = race_id {
            self.race_id = v;
        }
        if let Some(v) = weekend_race_id {
            self.weekend_race_id = v;
        }
        if let Some(v) = roster_file {
            self.roster_file = v;
        }
        if let Some(v) = output_dir {
            self.output_dir = v;
        }
        if let Some(v) = include_sector_time {
            self.include_sector_time = v;
        }
        if let Some(v) = include_hill_time {
            self.include_hill_time = v;
        }
        if let Some(v) = event_type {
            self.event_type = v;
        }
        if let Some(v) = start_lanes_source {
            // An empty string clears a previously configured source.
            self.start_lanes_source = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Some(v) = start_lanes_ascending {
            self.start_lanes_ascending = v;
        }
        if let Some(v) = top_riders {
            self.top_riders = v;
        }
    }

    /// Check that a session can be started with these values.
    pub fn validate(&self) -> Result<()> {
        if self.race_id.trim().is_empty() {
            return Err(AppError::validation("session.race_id is empty"));
        }
        if self.weekend_race_id.trim().is_empty() {
            return Err(AppError::validation("session.weekend_race_id is empty"));
        }
        if self.roster_file.as_os_str().is_empty() {
            return Err(AppError::validation("session.roster_file is not set"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(AppError::validation("session.output_dir is not set"));
        }
        if self.top_riders == 0 {
            return Err(AppError::validation("session.top_riders must be > 0"));
        }
        Ok(())
    }
}

/// Partial session settings supplied with a Start command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOverrides {
    pub race_id: Option<String>,
    pub weekend_race_id: Option<String>,
    pub roster_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub include_sector_time: Option<bool>,
    pub include_hill_time: Option<bool>,
    pub event_type: Option<EventType>,
    pub start_lanes_source: Option<String>,
    pub start_lanes_ascending: Option<bool>,
    pub top_riders: Option<usize>,
}

mod defaults {
    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; leaderboard-sync/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn leaderboard_base_url() -> String {
        "https://our.sqorz.com/json/leaderboard".into()
    }
    pub fn sanctioning_body() -> String {
        "usabmx".into()
    }

    // Poll defaults
    pub fn interval() -> u64 {
        10_000
    }
    pub fn top_riders_file() -> String {
        "top_riders.json".into()
    }
    pub fn start_lanes_file() -> String {
        "start_lanes.csv".into()
    }

    // Display defaults
    pub fn placeholder_photo_url() -> String {
        "https://art-department-usabmx.s3.us-west-1.amazonaws.com/Sqorz+Headshots/NOPHOTO.png"
            .into()
    }
    pub fn flag_url_template() -> String {
        "https://flagcdn.com/w80/{code}.png".into()
    }

    // Session defaults
    pub fn include_sector_time() -> bool {
        true
    }
    pub fn start_lanes_ascending() -> bool {
        true
    }
    pub fn top_riders() -> usize {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_session() -> SessionConfig {
        SessionConfig {
            race_id: "1001".into(),
            weekend_race_id: "1002".into(),
            roster_file: PathBuf::from("riders.csv"),
            output_dir: PathBuf::from("out"),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.poll.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.http.leaderboard_base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_session_is_not_startable() {
        assert!(SessionConfig::default().validate().is_err());
        assert!(ready_session().validate().is_ok());
    }

    #[test]
    fn session_rejects_zero_top_riders() {
        let mut session = ready_session();
        session.top_riders = 0;
        assert!(session.validate().is_err());
    }

    #[test]
    fn partial_override_keeps_previous_values() {
        let mut session = ready_session();
        session.include_hill_time = true;

        session.apply(SessionOverrides {
            include_sector_time: Some(false),
            ..SessionOverrides::default()
        });

        assert!(!session.include_sector_time);
        assert!(session.include_hill_time);
        assert_eq!(session.race_id, "1001");
        assert_eq!(session.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn empty_lane_source_override_clears_it() {
        let mut session = ready_session();
        session.start_lanes_source = Some("lanes.json".into());

        session.apply(SessionOverrides {
            start_lanes_source: Some(String::new()),
            ..SessionOverrides::default()
        });

        assert_eq!(session.start_lanes_source, None);
    }

    #[test]
    fn parse_toml_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [poll]
            interval_ms = 2500

            [session]
            race_id = "77"
            weekend_race_id = "78"
            event_type = "training"
            include_hill_time = true
            "#,
        )
        .unwrap();

        assert_eq!(config.poll.interval(), Duration::from_millis(2500));
        assert_eq!(config.poll.top_riders_file, "top_riders.json");
        assert_eq!(config.session.event_type, EventType::Training);
        assert!(config.session.include_sector_time);
        assert!(config.session.include_hill_time);
        assert_eq!(config.session.top_riders, 3);
        assert_eq!(config.http.sanctioning_body, "usabmx");
    }

    #[test]
    fn sample_config_matches_defaults() {
        let config: Config = toml::from_str(include_str!("../../leaderboard-sync.toml")).unwrap();
        let defaults = Config::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.http.leaderboard_base_url, defaults.http.leaderboard_base_url);
        assert_eq!(config.poll.interval_ms, defaults.poll.interval_ms);
        assert_eq!(config.session.start_lanes_source, None);
        assert_eq!(config.session.output_dir, PathBuf::from("overlay"));
    }

    #[test]
    fn event_type_from_str() {
        assert_eq!("Combined".parse::<EventType>().unwrap(), EventType::Combined);
        assert!("practice".parse::<EventType>().is_err());
    }
}
