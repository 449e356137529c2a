// src/pipeline/cycle.rs

//! One polling cycle: fetch, write category snapshots, digest, start lanes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Config, PollConfig, SessionConfig, catalog};
use crate::services::{
    LeaderboardFetcher, PhotoCache, PhotoResolver, RiderDirectory, RiderEnricher,
    StartLanesTransformer,
};
use crate::storage::{LocalStorage, SnapshotStorage};
use crate::utils::http::create_async_client;
use crate::utils::log::{step, success, summary};

const TOTAL_STEPS: usize = 4;

/// Summary of a completed cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub categories: usize,
    pub failed_fetches: usize,
    pub files_written: usize,
    pub write_failures: usize,
    pub digest_records: usize,
    /// Lane rows written, when a start-lanes source produced data
    pub start_lanes: Option<usize>,
}

/// Everything a cycle needs; built once per session.
#[derive(Clone)]
pub struct CycleContext {
    pub session: SessionConfig,
    pub poll: PollConfig,
    pub fetcher: LeaderboardFetcher,
    pub enricher: RiderEnricher,
    pub lanes: StartLanesTransformer,
    pub storage: Arc<dyn SnapshotStorage>,
}

impl CycleContext {
    /// Wire the services for a session writing to its output directory.
    pub fn new(
        config: &Config,
        session: SessionConfig,
        client: Client,
        directory: Arc<RiderDirectory>,
        photos: Arc<PhotoCache>,
    ) -> Self {
        let storage = Arc::new(LocalStorage::new(session.output_dir.clone()));
        Self::with_storage(config, session, client, directory, photos, storage)
    }

    pub fn with_storage(
        config: &Config,
        session: SessionConfig,
        client: Client,
        directory: Arc<RiderDirectory>,
        photos: Arc<PhotoCache>,
        storage: Arc<dyn SnapshotStorage>,
    ) -> Self {
        let resolver = PhotoResolver::new(
            client.clone(),
            photos,
            config.display.placeholder_photo_url.clone(),
        );
        Self {
            session,
            poll: config.poll.clone(),
            fetcher: LeaderboardFetcher::new(client.clone(), config.http.clone()),
            enricher: RiderEnricher::new(directory, resolver),
            lanes: StartLanesTransformer::new(client, config.display.flag_url_template.clone()),
            storage,
        }
    }
}

/// Run one cycle.
///
/// Returns `Ok(None)` when `active` was cleared while the cycle was in
/// flight. The flag is checked before every write, so nothing reaches the
/// output directory once a stop has been observed; results still in flight
/// are discarded. Fetch, probe and write failures are absorbed here; only
/// failures outside those scopes surface as `Err`.
pub async fn run_cycle(ctx: &CycleContext, active: &AtomicBool) -> Result<Option<CycleReport>> {
    let started_at = Utc::now();
    ctx.storage.prepare().await?;

    let categories = catalog(&ctx.session);

    step(1, TOTAL_STEPS, "Fetching leaderboards");
    let fetched = ctx.fetcher.fetch_all(&categories, &ctx.session).await;
    if fetched.results.len() != categories.len() {
        return Err(AppError::cycle(format!(
            "{} results for {} categories",
            fetched.results.len(),
            categories.len()
        )));
    }

    let mut report = CycleReport {
        started_at,
        finished_at: started_at,
        categories: categories.len(),
        failed_fetches: fetched.failures,
        files_written: 0,
        write_failures: 0,
        digest_records: 0,
        start_lanes: None,
    };

    step(2, TOTAL_STEPS, "Writing category snapshots");
    for (category, rows) in categories.iter().zip(&fetched.results) {
        if stopped(active, "category snapshots") {
            return Ok(None);
        }
        match ctx.storage.write_category(category, rows).await {
            Ok(()) => report.files_written += 1,
            Err(e) => {
                report.write_failures += 1;
                log::error!("Failed to write {}: {}", category.file_name(), e);
            }
        }
    }

    step(3, TOTAL_STEPS, "Building top riders digest");
    let digest = ctx
        .enricher
        .digest(&categories, &fetched.results, ctx.session.top_riders)
        .await;
    if stopped(active, "top riders digest") {
        return Ok(None);
    }
    report.digest_records = digest.len();
    match ctx.storage.write_digest(&ctx.poll.top_riders_file, &digest).await {
        Ok(()) => report.files_written += 1,
        Err(e) => {
            report.write_failures += 1;
            log::error!("Failed to write {}: {}", ctx.poll.top_riders_file, e);
        }
    }

    step(4, TOTAL_STEPS, "Transforming start lanes");
    let lanes = ctx
        .lanes
        .fetch_sorted(
            ctx.session.start_lanes_source.as_deref(),
            ctx.session.start_lanes_ascending,
        )
        .await;
    if let Some(entries) = lanes {
        if stopped(active, "start lanes") {
            return Ok(None);
        }
        match ctx
            .lanes
            .write(ctx.storage.as_ref(), &ctx.poll.start_lanes_file, &entries)
            .await
        {
            Ok(rows) => {
                success(&format!("Start lanes written ({} rows)", rows));
                report.files_written += 1;
                report.start_lanes = Some(rows);
            }
            Err(e) => {
                report.write_failures += 1;
                log::error!("Failed to write {}: {}", ctx.poll.start_lanes_file, e);
            }
        }
    }

    report.finished_at = Utc::now();
    summary(
        "Cycle complete",
        &[
            ("categories", report.categories.to_string()),
            ("failed fetches", report.failed_fetches.to_string()),
            ("files written", report.files_written.to_string()),
            ("write failures", report.write_failures.to_string()),
            ("digest records", report.digest_records.to_string()),
        ],
    );

    Ok(Some(report))
}

fn stopped(active: &AtomicBool, stage: &str) -> bool {
    let stopped = !active.load(Ordering::SeqCst);
    if stopped {
        log::info!("Session stopped before {}; discarding results", stage);
    }
    stopped
}

/// Load the roster and run a single cycle without a session loop.
pub async fn run_once(config: &Config) -> Result<CycleReport> {
    config.validate()?;
    config.session.validate()?;

    let directory = RiderDirectory::load(&config.session.roster_file).await?;
    log::info!(
        "Loaded {} riders from {}",
        directory.len(),
        config.session.roster_file.display()
    );

    let client = create_async_client(&config.http)?;
    let ctx = CycleContext::new(
        config,
        config.session.clone(),
        client,
        Arc::new(directory),
        Arc::new(PhotoCache::new()),
    );

    let active = AtomicBool::new(true);
    run_cycle(&ctx, &active)
        .await?
        .ok_or_else(|| AppError::cycle("cycle discarded"))
}
