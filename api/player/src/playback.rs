use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::selection::SelectionMachine;
use crate::ticker::Ticker;

/// How one playback step moves through the hour sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepPolicy {
    /// Next index, wrapping to 0 after the last frame.
    Cyclic,
    /// Adds `fine_step` hours while the current hour is below `threshold`,
    /// `coarse_step` hours after that, then jumps to the first frame at or
    /// past the target hour (index 0 when there is none).
    HourValue {
        #[serde(default = "default_threshold")]
        threshold: u32,
        #[serde(default = "default_fine_step")]
        fine_step: u32,
        #[serde(default = "default_coarse_step")]
        coarse_step: u32,
    },
}

fn default_threshold() -> u32 {
    48
}

fn default_fine_step() -> u32 {
    3
}

fn default_coarse_step() -> u32 {
    6
}

impl Default for StepPolicy {
    fn default() -> Self {
        StepPolicy::HourValue {
            threshold: default_threshold(),
            fine_step: default_fine_step(),
            coarse_step: default_coarse_step(),
        }
    }
}

impl StepPolicy {
    pub fn next_index(&self, hours: &[u32], current: usize) -> usize {
        if hours.is_empty() {
            return 0;
        }
        let current = current.min(hours.len() - 1);
        match *self {
            StepPolicy::Cyclic => (current + 1) % hours.len(),
            StepPolicy::HourValue {
                threshold,
                fine_step,
                coarse_step,
            } => {
                let hour = hours[current];
                let step = if hour < threshold { fine_step } else { coarse_step };
                let target = hour.saturating_add(step);
                hours.iter().position(|&h| h >= target).unwrap_or(0)
            }
        }
    }

    /// Frames visited when stepping from `start` until a frame repeats.
    pub fn lap_len(&self, hours: &[u32], start: usize) -> usize {
        if hours.is_empty() {
            return 0;
        }
        let mut seen = vec![false; hours.len()];
        let mut index = start.min(hours.len() - 1);
        let mut visited = 0;
        while !seen[index] {
            seen[index] = true;
            visited += 1;
            index = self.next_index(hours, index);
        }
        visited
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Two-state animation controller. Holds the only ticker; ticks and load
/// failures move the selection's hour index with the configured policy.
pub struct PlaybackEngine<T: Ticker> {
    ticker: T,
    state: PlaybackState,
    policy: StepPolicy,
    cadence: Duration,
    failures_in_a_row: usize,
    lap: usize,
}

impl<T: Ticker> PlaybackEngine<T> {
    pub fn new(ticker: T, policy: StepPolicy, cadence: Duration) -> Self {
        Self {
            ticker,
            state: PlaybackState::Stopped,
            policy,
            cadence,
            failures_in_a_row: 0,
            lap: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn policy(&self) -> StepPolicy {
        self.policy
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    pub fn ticker(&self) -> &T {
        &self.ticker
    }

    /// Starts playback, or stops it when already playing.
    pub fn play(&mut self) -> PlaybackState {
        match self.state {
            PlaybackState::Playing => self.stop(),
            PlaybackState::Stopped => {
                self.ticker.start(self.cadence);
                self.state = PlaybackState::Playing;
                self.failures_in_a_row = 0;
                info!("playback started, one step every {:?}", self.cadence);
            }
        }
        self.state
    }

    pub fn stop(&mut self) {
        if self.state == PlaybackState::Playing {
            self.ticker.stop();
            self.state = PlaybackState::Stopped;
            info!("playback stopped");
        }
    }

    /// Stops playback and moves back to the first frame.
    pub fn rewind(&mut self, selection: &mut SelectionMachine) {
        self.stop();
        if selection.set_hour_index(0).is_err() {
            debug!("rewind before the manifest is loaded");
        }
    }

    /// Scheduled step. Ignored while stopped.
    pub fn tick(&mut self, selection: &mut SelectionMachine) -> Option<usize> {
        if !self.is_playing() {
            debug!("tick while stopped ignored");
            return None;
        }
        self.advance(selection)
    }

    pub fn frame_loaded(&mut self) {
        self.failures_in_a_row = 0;
    }

    /// Skips past a frame that failed to load. Does nothing while stopped.
    /// A whole lap of failures without a single load stops playback.
    pub fn frame_failed(&mut self, selection: &mut SelectionMachine) -> Option<usize> {
        if !self.is_playing() {
            return None;
        }
        if self.failures_in_a_row == 0 {
            let policy = self.policy;
            let start = selection.selection().hour_index;
            self.lap = selection
                .manifest()
                .map(|m| policy.lap_len(m.hours(), start))
                .unwrap_or(0);
        }
        self.failures_in_a_row += 1;
        if self.failures_in_a_row >= self.lap {
            warn!(
                "{} frames in a row failed to load, stopping playback",
                self.failures_in_a_row
            );
            self.stop();
            return None;
        }
        self.advance(selection)
    }

    fn advance(&mut self, selection: &mut SelectionMachine) -> Option<usize> {
        let manifest = selection.manifest()?.clone();
        let current = selection.selection().hour_index;
        let next = self.policy.next_index(manifest.hours(), current);
        selection.set_hour_index(next as i64).ok()?;
        debug!(
            "step {} ({} h) -> {} ({} h)",
            current,
            manifest.hour_at(current).unwrap_or_default(),
            next,
            manifest.hour_at(next).unwrap_or_default()
        );
        Some(next)
    }
}
