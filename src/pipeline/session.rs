// src/pipeline/session.rs

//! Polling sessions and the command surface a host drives them through.
//!
//! ```text
//! Idle ──Start──► Starting ──roster loaded──► Polling ◄──timer──┐
//!   ▲                │                           │              │
//!   │           load failed                 cycle done ──► Scheduled
//!   │                ▼                           │
//!   └──────────── StartFailed          Stop ─────┴──► Stopped
//! ```
//!
//! The host never calls into a running session directly. It sends
//! [`Command`]s to the [`Engine`] task through an [`EngineHandle`] and
//! observes progress on the [`EngineEvent`] broadcast.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use reqwest::Client;
use tokio::sync::{Notify, broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::models::{Config, SessionConfig, SessionOverrides, catalog};
use crate::pipeline::cycle::{CycleContext, CycleReport, run_cycle};
use crate::services::{PhotoCache, RiderDirectory};
use crate::utils::http::create_async_client;
use crate::utils::log::{header, sub_item, success};

const EVENT_CAPACITY: usize = 64;

/// Host-issued control signals.
#[derive(Debug, Clone)]
pub enum Command {
    /// Start (or restart) a session, merging the overrides into the
    /// previous session settings.
    Start(SessionOverrides),
    /// Stop the current session and clear the photo cache.
    Stop,
    /// Stop, wait for the poll loop to exit, then end the engine task.
    Shutdown,
}

/// Progress reported to subscribers.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    SessionStarted { categories: usize },
    StartFailed { reason: String },
    CycleCompleted(CycleReport),
    CycleFailed { reason: String },
    SessionStopped,
}

/// State shared between the engine and one session's poll loop.
#[derive(Debug)]
pub struct SessionState {
    active: AtomicBool,
    wake: Notify,
}

impl SessionState {
    fn new() -> Self {
        Self {
            active: AtomicBool::new(true),
            wake: Notify::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Clear the active flag and cut the pending delay short.
    ///
    /// `notify_one` stores a permit when the loop is mid-cycle, so the next
    /// wait returns immediately and the loop observes the cleared flag.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.wake.notify_one();
    }
}

/// A running session: its shared state and the poll loop task.
struct Session {
    state: Arc<SessionState>,
    task: JoinHandle<()>,
}

impl Session {
    fn cancel(self) -> JoinHandle<()> {
        self.state.cancel();
        self.task
    }
}

/// Owns the current session and the photo cache shared across restarts.
///
/// A restart keeps the cache; Stop starts the next session with a fresh one.
pub struct Engine {
    config: Config,
    client: Client,
    session_config: SessionConfig,
    photos: Arc<PhotoCache>,
    session: Option<Session>,
    events: broadcast::Sender<EngineEvent>,
}

impl Engine {
    fn new(config: Config, client: Client, events: broadcast::Sender<EngineEvent>) -> Self {
        let session_config = config.session.clone();
        Self {
            config,
            client,
            session_config,
            photos: Arc::new(PhotoCache::new()),
            session: None,
            events,
        }
    }

    /// Validate the engine settings and spawn the engine task.
    pub fn spawn(config: Config) -> Result<EngineHandle> {
        config.validate()?;
        let client = create_async_client(&config.http)?;

        let (commands, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let engine = Self::new(config, client, events.clone());
        let task = tokio::spawn(engine.run(rx));

        Ok(EngineHandle {
            commands,
            events,
            task,
        })
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        log::info!("Engine ready");

        while let Some(command) = commands.recv().await {
            match command {
                Command::Start(overrides) => self.start(overrides).await,
                Command::Stop => {
                    self.stop();
                }
                Command::Shutdown => break,
            }
        }

        if let Some(task) = self.stop()
            && let Err(e) = task.await
        {
            log::error!("Poll loop ended abnormally: {}", e);
        }
        log::info!("Engine shut down");
    }

    async fn start(&mut self, overrides: SessionOverrides) {
        if let Some(previous) = self.session.take() {
            log::info!("Restarting session");
            // The old loop exits on its own; in-flight results are discarded.
            drop(previous.cancel());
        }

        let mut session = self.session_config.clone();
        session.apply(overrides);

        let directory = match Self::prepare(&session).await {
            Ok(directory) => directory,
            Err(e) => {
                log::error!("Failed to start session: {}", e);
                self.emit(EngineEvent::StartFailed {
                    reason: e.to_string(),
                });
                return;
            }
        };
        log::info!(
            "Loaded {} riders from {}",
            directory.len(),
            session.roster_file.display()
        );

        let categories = catalog(&session).len();
        let ctx = CycleContext::new(
            &self.config,
            session.clone(),
            self.client.clone(),
            Arc::new(directory),
            Arc::clone(&self.photos),
        );
        self.session_config = session;

        header("Leaderboard session");
        sub_item(&format!(
            "race {} / weekend {} ({})",
            self.session_config.race_id,
            self.session_config.weekend_race_id,
            self.session_config.event_type
        ));
        sub_item(&format!("{} categories", categories));
        sub_item(&format!("output: {}", self.session_config.output_dir.display()));
        success("Session started");
        // Announce before the first cycle can report.
        self.emit(EngineEvent::SessionStarted { categories });

        let state = Arc::new(SessionState::new());
        let task = tokio::spawn(poll_loop(
            ctx,
            Arc::clone(&state),
            self.config.poll.interval(),
            self.events.clone(),
        ));
        self.session = Some(Session { state, task });
    }

    async fn prepare(session: &SessionConfig) -> Result<RiderDirectory> {
        session.validate()?;
        RiderDirectory::load(&session.roster_file).await
    }

    /// Returns the stopped loop's task so shutdown can wait for it.
    fn stop(&mut self) -> Option<JoinHandle<()>> {
        // Swap rather than only clear: a probe still in flight in the stopped
        // session records its verdict in the detached cache.
        std::mem::take(&mut self.photos).clear();

        let session = self.session.take()?;
        log::info!("Stopping session");
        let task = session.cancel();
        self.emit(EngineEvent::SessionStopped);
        Some(task)
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Run cycles until the session is cancelled.
///
/// Every cycle, failed or not, is followed by the configured delay. Errors
/// and panics inside a cycle are reported and the loop carries on.
async fn poll_loop(
    ctx: CycleContext,
    state: Arc<SessionState>,
    interval: Duration,
    events: broadcast::Sender<EngineEvent>,
) {
    while state.is_active() {
        let outcome = AssertUnwindSafe(run_cycle(&ctx, &state.active))
            .catch_unwind()
            .await;

        let event = match outcome {
            Ok(Ok(Some(report))) => EngineEvent::CycleCompleted(report),
            Ok(Ok(None)) => break,
            Ok(Err(e)) => {
                log::error!("Cycle failed: {}", e);
                EngineEvent::CycleFailed {
                    reason: e.to_string(),
                }
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                log::error!("Cycle panicked: {}", reason);
                EngineEvent::CycleFailed { reason }
            }
        };
        let _ = events.send(event);

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = state.wake.notified() => {}
        }
    }

    log::debug!("Poll loop exited");
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Host-side handle: fire-and-forget commands plus an event feed.
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<EngineEvent>,
    task: JoinHandle<()>,
}

impl EngineHandle {
    pub fn start(&self, overrides: SessionOverrides) {
        self.send(Command::Start(overrides));
    }

    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Stop any session and wait for the engine task to finish.
    pub async fn shutdown(self) -> Result<()> {
        self.send(Command::Shutdown);
        self.task
            .await
            .map_err(|e| AppError::cycle(format!("engine task failed: {e}")))
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::warn!("Engine is no longer running");
        }
    }
}
