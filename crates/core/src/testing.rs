//! In-memory stand-ins for the OS collaborators.

use std::cell::{Cell, RefCell};

use crate::{AudioSource, AudioSourceEnumerator, ControlError, PlayerController};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCall {
    Pause,
    Resume,
}

/// Player whose state flips on pause/resume, recording every command.
#[derive(Debug)]
pub struct FakePlayer {
    pub running: Cell<bool>,
    pub playing: Cell<bool>,
    pub fail_commands: Cell<bool>,
    pub calls: RefCell<Vec<PlayerCall>>,
}

impl FakePlayer {
    pub fn playing() -> Self {
        let player = Self::stopped();
        player.playing.set(true);
        player
    }

    pub fn stopped() -> Self {
        Self {
            running: Cell::new(true),
            playing: Cell::new(false),
            fail_commands: Cell::new(false),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.calls.borrow().clone()
    }

    fn command(&self, call: PlayerCall, playing_after: bool) -> Result<(), ControlError> {
        if !self.running.get() {
            return Ok(());
        }
        self.calls.borrow_mut().push(call);
        if self.fail_commands.get() {
            return Err(ControlError::Script {
                command: format!("{call:?}"),
                status: 1,
                stderr: "application isn't running".into(),
            });
        }
        self.playing.set(playing_after);
        Ok(())
    }
}

impl PlayerController for FakePlayer {
    fn name(&self) -> &str {
        "Spotify"
    }

    fn is_running(&self) -> bool {
        self.running.get()
    }

    fn is_playing(&self) -> bool {
        self.running.get() && self.playing.get()
    }

    fn pause(&self) -> Result<(), ControlError> {
        self.command(PlayerCall::Pause, false)
    }

    fn resume(&self) -> Result<(), ControlError> {
        self.command(PlayerCall::Resume, true)
    }
}

/// Enumerator that reports whatever names the test sets.
#[derive(Debug, Default)]
pub struct FakeSources {
    current: RefCell<Vec<AudioSource>>,
}

impl FakeSources {
    pub fn set(&self, names: &[&str]) {
        *self.current.borrow_mut() = names
            .iter()
            .enumerate()
            .map(|(index, name)| AudioSource::new(100 + index as u32, *name))
            .collect();
    }
}

impl AudioSourceEnumerator for FakeSources {
    fn list_active_audio_sources(&self) -> Vec<AudioSource> {
        self.current.borrow().clone()
    }
}
