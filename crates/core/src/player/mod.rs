//! Control channel to the managed player.

use std::{ffi::OsStr, process::Command};

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use crate::ControlError;

const OSASCRIPT: &str = "osascript";

/// Commands the monitor needs from the player. Query methods never fail;
/// an unreachable player simply reads as not running and not playing.
pub trait PlayerController {
    /// Display name, also used in status labels.
    fn name(&self) -> &str;

    fn is_running(&self) -> bool;

    /// `false` whenever the player is not running.
    fn is_playing(&self) -> bool;

    fn pause(&self) -> Result<(), ControlError>;

    fn resume(&self) -> Result<(), ControlError>;
}

/// Drives a scriptable macOS player (Spotify by default) through `osascript`.
#[derive(Debug, Clone)]
pub struct AppleScriptPlayer {
    name: String,
}

impl AppleScriptPlayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn script(&self, verb: &str) -> String {
        format!("tell application \"{}\" to {verb}", self.name)
    }

    fn run_script(&self, verb: &str) -> Result<String, ControlError> {
        let script = self.script(verb);
        let output = Command::new(OSASCRIPT)
            .args(["-e", &script])
            .output()
            .map_err(|err| ControlError::Spawn {
                program: OSASCRIPT.to_string(),
                reason: err.to_string(),
            })?;

        if !output.status.success() {
            return Err(ControlError::Script {
                command: script,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn dispatch(&self, verb: &str) -> Result<(), ControlError> {
        if !self.is_running() {
            tracing::debug!(player = %self.name, verb, "player not running, skipping command");
            return Ok(());
        }
        self.run_script(verb).map(|_| ())
    }
}

impl PlayerController for AppleScriptPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_running(&self) -> bool {
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );
        let found = system
            .processes_by_exact_name(OsStr::new(&self.name))
            .next()
            .is_some();
        found
    }

    fn is_playing(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        match self.run_script("player state") {
            Ok(state) => is_playing_state(&state),
            Err(err) => {
                tracing::debug!(error = %err, "could not query player state");
                false
            }
        }
    }

    fn pause(&self) -> Result<(), ControlError> {
        self.dispatch("pause")
    }

    fn resume(&self) -> Result<(), ControlError> {
        self.dispatch("play")
    }
}

fn is_playing_state(state: &str) -> bool {
    state.trim() == "playing"
}
