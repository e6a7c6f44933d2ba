//! Timer loop that drives [`AudioMonitor`] and relays requests from the
//! surrounding application.
//!
//! Cycles run strictly one after another on the calling thread. The next
//! deadline is armed only once a cycle has finished, so a slow OS query delays
//! the schedule instead of queueing extra cycles. Requests arriving on the
//! channel are handled between cycles.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::{
    monitor::{AudioMonitor, CycleReport},
    player::PlayerController,
    sources::AudioSourceEnumerator,
    Result,
};

/// Something the user asked for through the application's menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ReplaceIgnoreList(Vec<String>),
    ShowLog,
    Quit,
}

/// Capabilities the surrounding application provides. The loop never
/// performs file or terminal IO itself.
pub trait AppHooks {
    /// Persists a freshly edited user ignore list.
    fn on_edit_requested(&mut self, entries: &[String]) -> Result<()>;

    /// Presents the rendered status table.
    fn on_show_log_requested(&mut self, table: &str) -> Result<()>;

    fn on_quit_requested(&mut self);

    /// Called after every cycle with the rendered status table.
    fn on_cycle(&mut self, _report: &CycleReport, _table: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

enum Wake {
    Deadline,
    Request(Request),
}

/// Owns the monitor together with its OS collaborators.
#[derive(Debug)]
pub struct PollLoop<P, E> {
    monitor: AudioMonitor,
    player: P,
    sources: E,
    cycles: u64,
    overruns: u64,
}

impl<P, E> PollLoop<P, E>
where
    P: PlayerController,
    E: AudioSourceEnumerator,
{
    pub fn new(monitor: AudioMonitor, player: P, sources: E) -> Self {
        Self {
            monitor,
            player,
            sources,
            cycles: 0,
            overruns: 0,
        }
    }

    pub fn monitor(&self) -> &AudioMonitor {
        &self.monitor
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn sources(&self) -> &E {
        &self.sources
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Cycles that took longer than the interval that followed them.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Runs one cycle immediately.
    pub fn tick(&mut self) -> CycleReport {
        let started = Instant::now();
        let report = self.monitor.check_audio(&self.player, &self.sources);
        let elapsed = started.elapsed();

        self.cycles += 1;
        if elapsed > report.interval {
            self.overruns += 1;
            tracing::warn!(?elapsed, interval = ?report.interval, "audio check overran its interval");
        } else {
            tracing::trace!(?elapsed, cycle = self.cycles, "audio check finished");
        }
        report
    }

    /// Applies a request. Hook failures are logged and do not stop the loop.
    pub fn handle<H: AppHooks>(&mut self, request: Request, hooks: &mut H) -> LoopControl {
        match request {
            Request::ReplaceIgnoreList(entries) => {
                self.monitor.update_ignore_list(entries.clone());
                if let Err(err) = hooks.on_edit_requested(&entries) {
                    tracing::warn!(error = %err, "failed to persist ignore list");
                }
                LoopControl::Continue
            }
            Request::ShowLog => {
                if let Err(err) = hooks.on_show_log_requested(&self.monitor.status_table()) {
                    tracing::warn!(error = %err, "failed to show status log");
                }
                LoopControl::Continue
            }
            Request::Quit => {
                hooks.on_quit_requested();
                LoopControl::Stop
            }
        }
    }

    /// Polls until a [`Request::Quit`] arrives. If every sender is dropped the
    /// loop keeps polling on its timer alone.
    pub fn run<H: AppHooks>(&mut self, requests: &Receiver<Request>, hooks: &mut H) {
        tracing::info!(player = self.player.name(), "audio monitor started");
        let mut listening = true;
        let mut deadline = Instant::now() + self.monitor.interval();

        loop {
            let wait = deadline.saturating_duration_since(Instant::now());
            match wait_for(listening.then_some(requests), wait) {
                Some(Wake::Request(request)) => {
                    if self.handle(request, hooks) == LoopControl::Stop {
                        break;
                    }
                    continue;
                }
                Some(Wake::Deadline) => {}
                None => {
                    tracing::debug!("request channel closed, polling on timer only");
                    listening = false;
                    continue;
                }
            }

            let report = self.tick();
            if let Some(err) = &report.control_error {
                tracing::error!(error = %err, "could not control the player");
            }
            if let Err(err) = hooks.on_cycle(&report, &self.monitor.status_table()) {
                tracing::warn!(error = %err, "status hook failed");
            }
            deadline = Instant::now() + report.interval;
        }

        tracing::info!(cycles = self.cycles, "audio monitor stopped");
    }
}

/// Blocks until the deadline passes or a request arrives. `None` means the
/// channel disconnected.
fn wait_for(requests: Option<&Receiver<Request>>, wait: Duration) -> Option<Wake> {
    let Some(requests) = requests else {
        std::thread::sleep(wait);
        return Some(Wake::Deadline);
    };

    match requests.recv_timeout(wait) {
        Ok(request) => Some(Wake::Request(request)),
        Err(RecvTimeoutError::Timeout) => Some(Wake::Deadline),
        Err(RecvTimeoutError::Disconnected) => None,
    }
}
