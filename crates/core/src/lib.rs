//! Core library for Spotify Autopause.
//!
//! Pauses a music player while other applications play audio and resumes it
//! once they fall silent. The crate holds the decision logic and the thin
//! macOS collaborators it needs (audio assertions via `pmset`, player control
//! via `osascript`); menus, windows and file output belong to the caller,
//! which talks to the core through [`AudioMonitor::check_audio`],
//! [`AudioMonitor::update_ignore_list`] and the [`AppHooks`] trait.

pub mod config;
pub mod error;
pub mod ignore;
pub mod monitor;
pub mod player;
pub mod schedule;
pub mod sources;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{AppConfig, PlayerConfig, PollingConfig};
pub use error::{AutopauseError, ControlError, Result};
pub use ignore::{filter_ignored, parse_ignore_input, FilterOutcome, IgnoreList, IgnoreStore};
pub use monitor::{AudioMonitor, CycleReport, MonitorPhase, MonitorState, PlayerAction, Transition};
pub use player::{AppleScriptPlayer, PlayerController};
pub use schedule::{AppHooks, LoopControl, PollLoop, Request};
pub use sources::{AudioSource, AudioSourceEnumerator, PmsetEnumerator};
pub use status::{StatusRecorder, StatusRow, STATUS_CAPACITY};
