//! Pipeline entry points for the leaderboard engine.
//!
//! - `run_cycle`: fetch, publish snapshots, digest and start lanes once
//! - `run_once`: load the roster and run a single cycle
//! - `Engine`: session scheduler driven by host commands

pub mod cycle;
pub mod session;

pub use cycle::{CycleContext, CycleReport, run_cycle, run_once};
pub use session::{Command, Engine, EngineEvent, EngineHandle, SessionState};
