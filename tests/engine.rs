use std::path::Path;
use std::time::Duration;

use httptest::matchers::{all_of, matches, request};
use httptest::responders::{delay_and_then, json_encoded, status_code};
use httptest::{Expectation, Server};
use serde_json::json;
use tempfile::{TempDir, tempdir};
use tokio::sync::broadcast;

use leaderboard_sync::models::{Config, SessionOverrides};
use leaderboard_sync::pipeline::{Engine, EngineEvent, run_once};

const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

fn config(server: &Server, dir: &TempDir, interval_ms: u64) -> Config {
    let roster = dir.path().join("roster.csv");
    std::fs::write(
        &roster,
        format!(
            "Member_SN,NAME,SPONSOR,CITY,STATE,COUNTRY,PHOTO_LINK\n\
             9,Nina Vale,Acme,Austin,TX,USA,{}\n",
            server.url_str("/photos/9.png")
        ),
    )
    .unwrap();

    let mut config = Config::default();
    config.http.leaderboard_base_url = server.url_str("/json/leaderboard");
    config.display.placeholder_photo_url = "https://cdn.example.com/NOPHOTO.png".into();
    config.poll.interval_ms = interval_ms;
    config.session.race_id = "111".into();
    config.session.weekend_race_id = "222".into();
    config.session.roster_file = roster;
    config.session.output_dir = dir.path().join("out");
    config
}

fn expect_leaderboards(server: &Server) {
    server.expect(
        Expectation::matching(all_of!(
            request::method("GET"),
            request::path(matches("^/json/leaderboard/"))
        ))
        .times(..)
        .respond_with(json_encoded(json!([
            {"id": "9", "name": "N. Vale", "rank": 1}
        ]))),
    );
}

async fn wait_for<F>(events: &mut broadcast::Receiver<EngineEvent>, mut wanted: F) -> EngineEvent
where
    F: FnMut(&EngineEvent) -> bool,
{
    tokio::time::timeout(EVENT_TIMEOUT, async {
        loop {
            match events.recv().await {
                Ok(event) if wanted(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("engine closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for engine event")
}

fn json_files(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".json"))
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn stop_halts_writes_and_clears_photo_cache() {
    let server = Server::run();
    expect_leaderboards(&server);
    // Unreachable once per session: cached within a session, re-probed after Stop.
    server.expect(
        Expectation::matching(request::method_path("GET", "/photos/9.png"))
            .times(2..=2)
            .respond_with(status_code(404)),
    );

    let dir = tempdir().unwrap();
    let config = config(&server, &dir, 500);
    let out = config.session.output_dir.clone();

    let handle = Engine::spawn(config).unwrap();
    let mut events = handle.subscribe();

    handle.start(SessionOverrides::default());
    wait_for(&mut events, |e| matches!(e, EngineEvent::SessionStarted { .. })).await;
    let event = wait_for(&mut events, |e| matches!(e, EngineEvent::CycleCompleted(_))).await;
    let EngineEvent::CycleCompleted(report) = event else {
        unreachable!()
    };
    assert_eq!(report.failed_fetches, 0);

    let digest: serde_json::Value =
        serde_json::from_slice(&std::fs::read(out.join("top_riders.json")).unwrap()).unwrap();
    assert_eq!(
        digest[0],
        json!({
            "name": "Nina Vale",
            "sponsor": "Acme",
            "hometown": "Austin, TX, USA",
            "photo": "https://cdn.example.com/NOPHOTO.png",
            "category": "Men Pro"
        })
    );

    handle.stop();
    wait_for(&mut events, |e| matches!(e, EngineEvent::SessionStopped)).await;

    for name in json_files(&out) {
        std::fs::remove_file(out.join(name)).unwrap();
    }
    // Several intervals pass with no session.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(json_files(&out).is_empty());

    handle.start(SessionOverrides::default());
    wait_for(&mut events, |e| matches!(e, EngineEvent::CycleCompleted(_))).await;
    assert!(out.join("top_riders.json").exists());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn stop_during_probe_leaves_next_session_a_clean_cache() {
    let server = Server::run();
    expect_leaderboards(&server);
    // Settles long after Stop; its verdict must not carry into the next session.
    server.expect(
        Expectation::matching(request::method_path("GET", "/photos/9.png"))
            .times(2..=2)
            .respond_with(delay_and_then(
                Duration::from_millis(800),
                status_code(404),
            )),
    );

    let dir = tempdir().unwrap();
    let config = config(&server, &dir, 60_000);
    let out = config.session.output_dir.clone();

    let handle = Engine::spawn(config).unwrap();
    let mut events = handle.subscribe();

    handle.start(SessionOverrides::default());
    wait_for(&mut events, |e| matches!(e, EngineEvent::SessionStarted { .. })).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    handle.stop();
    wait_for(&mut events, |e| matches!(e, EngineEvent::SessionStopped)).await;

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(!out.join("top_riders.json").exists());

    handle.start(SessionOverrides::default());
    wait_for(&mut events, |e| matches!(e, EngineEvent::CycleCompleted(_))).await;
    assert!(out.join("top_riders.json").exists());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn stop_during_lanes_fetch_writes_no_lanes() {
    let server = Server::run();
    expect_leaderboards(&server);
    server.expect(
        Expectation::matching(request::method_path("GET", "/photos/9.png"))
            .times(..)
            .respond_with(status_code(200)),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/lanes"))
            .respond_with(delay_and_then(
                Duration::from_millis(800),
                json_encoded(json!([{"motoNumber": 1, "lane": 1, "firstName": "Nina"}])),
            )),
    );

    let dir = tempdir().unwrap();
    let config = config(&server, &dir, 60_000);
    let out = config.session.output_dir.clone();

    let handle = Engine::spawn(config).unwrap();
    let mut events = handle.subscribe();

    handle.start(SessionOverrides {
        start_lanes_source: Some(server.url_str("/lanes")),
        ..SessionOverrides::default()
    });
    wait_for(&mut events, |e| matches!(e, EngineEvent::SessionStarted { .. })).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    handle.stop();
    wait_for(&mut events, |e| matches!(e, EngineEvent::SessionStopped)).await;

    // Let the lanes request settle.
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(out.join("top_riders.json").exists());
    assert!(!out.join("start_lanes.csv").exists());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn restart_merges_partial_overrides() {
    let server = Server::run();
    expect_leaderboards(&server);
    server.expect(
        Expectation::matching(request::method_path("GET", "/photos/9.png"))
            .times(..)
            .respond_with(status_code(200)),
    );

    let dir = tempdir().unwrap();
    let config = config(&server, &dir, 60_000);
    let handle = Engine::spawn(config).unwrap();
    let mut events = handle.subscribe();

    handle.start(SessionOverrides {
        include_sector_time: Some(false),
        ..SessionOverrides::default()
    });
    let event = wait_for(&mut events, |e| matches!(e, EngineEvent::SessionStarted { .. })).await;
    assert!(matches!(event, EngineEvent::SessionStarted { categories: 13 }));

    // Sector time stays off; hill time is added on top.
    handle.start(SessionOverrides {
        include_hill_time: Some(true),
        ..SessionOverrides::default()
    });
    let event = wait_for(&mut events, |e| matches!(e, EngineEvent::SessionStarted { .. })).await;
    assert!(matches!(event, EngineEvent::SessionStarted { categories: 17 }));

    // A cycle from the first session may still settle; wait for the merged one.
    wait_for(&mut events, |e| {
        matches!(e, EngineEvent::CycleCompleted(report) if report.categories == 17)
    })
    .await;
    assert!(dir.path().join("out/Hill_Time_Male.json").exists());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn missing_roster_fails_start() {
    let server = Server::run();
    let dir = tempdir().unwrap();
    let config = config(&server, &dir, 60_000);

    let handle = Engine::spawn(config).unwrap();
    let mut events = handle.subscribe();
    handle.start(SessionOverrides {
        roster_file: Some(dir.path().join("missing.csv")),
        ..SessionOverrides::default()
    });

    let event = wait_for(&mut events, |e| {
        matches!(
            e,
            EngineEvent::StartFailed { .. } | EngineEvent::SessionStarted { .. }
        )
    })
    .await;
    match event {
        EngineEvent::StartFailed { reason } => assert!(reason.contains("missing.csv")),
        other => panic!("unexpected event: {other:?}"),
    }

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn single_cycle_writes_one_file_per_category() {
    let server = Server::run();
    expect_leaderboards(&server);
    server.expect(
        Expectation::matching(request::method_path("GET", "/photos/9.png"))
            .respond_with(status_code(200)),
    );

    let dir = tempdir().unwrap();
    let mut config = config(&server, &dir, 60_000);
    config.session.include_hill_time = true;
    let out = config.session.output_dir.clone();

    let report = run_once(&config).await.unwrap();

    // 13 base + 6 sector + 4 hill, plus the digest.
    assert_eq!(report.categories, 23);
    assert_eq!(report.files_written, 24);
    assert_eq!(json_files(&out).len(), 24);
    assert_eq!(report.digest_records, 23);
}
