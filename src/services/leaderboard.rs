// src/services/leaderboard.rs

//! Leaderboard fetcher service.
//!
//! Issues one request per category in parallel. Each request fails on its
//! own: a bad status, a non-JSON body or a transport error yields an empty
//! result for that category only.

use futures::future::join_all;
use reqwest::Client;

use crate::error::Result;
use crate::models::{Category, HttpConfig, LeaderboardRow, SessionConfig};
use crate::utils::http::fetch_json;

/// Rows fetched for a whole catalog, index-aligned with it.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub results: Vec<Vec<LeaderboardRow>>,
    pub failures: usize,
}

/// Service for fetching leaderboard views.
#[derive(Clone)]
pub struct LeaderboardFetcher {
    client: Client,
    http: HttpConfig,
}

impl LeaderboardFetcher {
    pub fn new(client: Client, http: HttpConfig) -> Self {
        Self { client, http }
    }

    /// Fetch every category of the catalog concurrently.
    ///
    /// All requests are issued together and awaited until every one has
    /// settled; results keep catalog order no matter which finishes first.
    pub async fn fetch_all(
        &self,
        categories: &[Category],
        session: &SessionConfig,
    ) -> FetchOutcome {
        let settled = join_all(categories.iter().map(|category| {
            let request = self.fetch_category(category, session);
            async move { (category, request.await) }
        }))
        .await;

        let mut outcome = FetchOutcome {
            results: Vec::with_capacity(settled.len()),
            failures: 0,
        };

        for (category, result) in settled {
            match result {
                Ok(rows) => {
                    log::debug!("{}: {} rows", category.label, rows.len());
                    outcome.results.push(rows);
                }
                Err(error) => {
                    outcome.failures += 1;
                    log::warn!("Failed to fetch leaderboard {}: {}", category.label, error);
                    outcome.results.push(Vec::new());
                }
            }
        }

        outcome
    }

    /// Fetch a single category.
    pub async fn fetch_category(
        &self,
        category: &Category,
        session: &SessionConfig,
    ) -> Result<Vec<LeaderboardRow>> {
        let url = category.url(&self.http, session)?;
        fetch_json(&self.client, url.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::matchers::request;
    use httptest::responders::{json_encoded, status_code};
    use httptest::{Expectation, Server};
    use serde_json::json;

    use crate::models::catalog;
    use crate::utils::http::create_async_client;

    fn fetcher(server: &Server) -> LeaderboardFetcher {
        let http = HttpConfig {
            leaderboard_base_url: server.url_str("/json/leaderboard"),
            ..HttpConfig::default()
        };
        let client = create_async_client(&http).unwrap();
        LeaderboardFetcher::new(client, http)
    }

    fn session() -> SessionConfig {
        SessionConfig {
            race_id: "111".into(),
            weekend_race_id: "222".into(),
            include_sector_time: false,
            ..SessionConfig::default()
        }
    }

    #[tokio::test]
    async fn failures_are_isolated_per_category() {
        let server = Server::run();
        // The 11 primary-race views fail, the 2 weekend views succeed.
        server.expect(
            Expectation::matching(request::method_path("GET", "/json/leaderboard/111/usabmx"))
                .times(..)
                .respond_with(status_code(500)),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/json/leaderboard/222/usabmx"))
                .times(..)
                .respond_with(json_encoded(json!([{"id": "1", "name": "A"}]))),
        );

        let session = session();
        let categories = catalog(&session);
        let outcome = fetcher(&server).fetch_all(&categories, &session).await;

        assert_eq!(outcome.results.len(), categories.len());
        assert_eq!(outcome.failures, 11);
        assert!(outcome.results[..11].iter().all(Vec::is_empty));
        assert_eq!(outcome.results[11].len(), 1);
        assert_eq!(outcome.results[12].len(), 1);
    }

    #[tokio::test]
    async fn non_array_json_is_a_failure() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/json/leaderboard/111/usabmx"))
                .respond_with(json_encoded(json!({"error": "race not found"}))),
        );

        let session = session();
        let result = fetcher(&server)
            .fetch_category(&catalog(&session)[0], &session)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn transport_errors_are_isolated() {
        let http = HttpConfig {
            // Nothing listens on the discard port.
            leaderboard_base_url: "http://127.0.0.1:9/json/leaderboard".into(),
            timeout_secs: 2,
            ..HttpConfig::default()
        };
        let client = create_async_client(&http).unwrap();
        let fetcher = LeaderboardFetcher::new(client, http);

        let session = session();
        let categories = catalog(&session);
        let outcome = fetcher.fetch_all(&categories, &session).await;

        assert_eq!(outcome.results.len(), 13);
        assert_eq!(outcome.failures, 13);
    }
}
