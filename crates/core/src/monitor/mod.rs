//! The pause/resume decision logic.
//!
//! Each cycle samples the player and the active audio sources, filters the
//! sources through the ignore list and feeds the result into a two-state
//! machine. Only the edges of that machine touch the player:
//!
//! * `Idle -> Suppressing` pauses the player, but only if it was playing.
//! * `Suppressing -> Idle` resumes it, but only if this monitor paused it.
//!
//! That asymmetry means playback is never started that the user had not
//! started themselves.

use std::time::Duration;

use chrono::Local;

use crate::{
    config::PollingConfig,
    ignore::{FilterOutcome, IgnoreList},
    player::PlayerController,
    sources::{AudioSource, AudioSourceEnumerator},
    status::StatusRecorder,
    ControlError,
};

const NO_OTHER_AUDIO: &str = "No Other Audio";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    /// No foreign audio on the last cycle; the player plays freely.
    Idle,
    /// Foreign audio was detected; the player has been or would be paused.
    Suppressing,
}

/// Edge produced by a single observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Suppress { pause_player: bool },
    Release { resume_player: bool },
}

/// Command actually sent to the player during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Pause,
    Resume,
}

/// Mutable state of the decision logic.
///
/// `player_was_playing_before_interrupt` can only be true while
/// `other_audio_playing` is true. It is set on entering suppression with the
/// player playing and cleared on the release edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorState {
    pub other_audio_playing: bool,
    pub player_was_playing_before_interrupt: bool,
}

impl MonitorState {
    pub fn phase(&self) -> MonitorPhase {
        if self.other_audio_playing {
            MonitorPhase::Suppressing
        } else {
            MonitorPhase::Idle
        }
    }

    /// Advances the machine with one cycle's observation and returns the edge
    /// taken, if any. Commits the new state before any command is issued.
    pub fn observe(&mut self, other_audio: bool, player_playing: bool) -> Transition {
        match (self.other_audio_playing, other_audio) {
            (false, true) => {
                self.other_audio_playing = true;
                self.player_was_playing_before_interrupt = player_playing;
                Transition::Suppress {
                    pause_player: player_playing,
                }
            }
            (true, false) => {
                self.other_audio_playing = false;
                let resume_player = std::mem::take(&mut self.player_was_playing_before_interrupt);
                Transition::Release { resume_player }
            }
            _ => Transition::Unchanged,
        }
    }
}

/// Everything observed and done during one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub player_playing: bool,
    pub filtered: FilterOutcome,
    pub transition: Transition,
    pub action: Option<PlayerAction>,
    /// Set when the command could not be delivered. The transition stands.
    pub control_error: Option<ControlError>,
    /// Whether the status log gained rows.
    pub logged: bool,
    /// Delay until the next cycle.
    pub interval: Duration,
}

/// Owns the decision state, the ignore list and the status log.
#[derive(Debug)]
pub struct AudioMonitor {
    state: MonitorState,
    ignore: IgnoreList,
    recorder: StatusRecorder,
    polling: PollingConfig,
    interval: Duration,
}

impl AudioMonitor {
    pub fn new(ignore: IgnoreList, polling: PollingConfig) -> Self {
        Self {
            state: MonitorState::default(),
            ignore,
            recorder: StatusRecorder::new(),
            interval: polling.start_delay(),
            polling,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn phase(&self) -> MonitorPhase {
        self.state.phase()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn ignore_list(&self) -> &IgnoreList {
        &self.ignore
    }

    pub fn recorder(&self) -> &StatusRecorder {
        &self.recorder
    }

    pub fn status_table(&self) -> String {
        self.recorder.render_table()
    }

    /// Swaps in a new user ignore list; the next cycle uses it.
    pub fn update_ignore_list(&self, entries: Vec<String>) {
        self.ignore.replace(entries);
    }

    /// Runs one full audio check cycle.
    pub fn check_audio<P, E>(&mut self, player: &P, sources: &E) -> CycleReport
    where
        P: PlayerController + ?Sized,
        E: AudioSourceEnumerator + ?Sized,
    {
        let player_playing = player.is_playing();
        let active = sources.list_active_audio_sources();
        let filtered = self.ignore.filter(&active);

        let transition = self
            .state
            .observe(filtered.other_audio_present, player_playing);

        let action = match transition {
            Transition::Suppress { pause_player: true } => Some(PlayerAction::Pause),
            Transition::Release {
                resume_player: true,
            } => Some(PlayerAction::Resume),
            _ => None,
        };

        if let Transition::Suppress { .. } | Transition::Release { .. } = transition {
            tracing::info!(
                ?transition,
                sources = ?filtered.names(),
                "audio state changed"
            );
        }

        let control_error = action.and_then(|action| self.dispatch(player, action).err());

        let player_label = if player_playing { "Playing" } else { "Paused" };
        let other_label = other_audio_label(&filtered);
        let action_label = action.map(|action| match action {
            PlayerAction::Pause => format!("Pausing {}", player.name()),
            PlayerAction::Resume => format!("Resuming {}", player.name()),
        });
        let logged = self.recorder.record(
            Local::now().naive_local(),
            player_label,
            &other_label,
            action_label.as_deref(),
        );

        CycleReport {
            player_playing,
            filtered,
            transition,
            action,
            control_error,
            logged,
            interval: self.interval,
        }
    }

    fn dispatch<P>(&mut self, player: &P, action: PlayerAction) -> Result<(), ControlError>
    where
        P: PlayerController + ?Sized,
    {
        let result = match action {
            PlayerAction::Pause => {
                tracing::info!(player = player.name(), "pausing player");
                self.interval = self.polling.delay_when_not_playing();
                player.pause()
            }
            PlayerAction::Resume => {
                tracing::info!(player = player.name(), "resuming player");
                self.interval = self.polling.delay_when_playing();
                player.resume()
            }
        };

        if let Err(err) = &result {
            tracing::warn!(error = %err, ?action, "player command failed");
        }
        result
    }
}

fn other_audio_label(filtered: &FilterOutcome) -> String {
    if !filtered.other_audio_present {
        return NO_OTHER_AUDIO.to_string();
    }
    filtered
        .non_ignored
        .iter()
        .map(AudioSource::short_name)
        .collect::<Vec<_>>()
        .join(", ")
}
