//! Playback session state machine
//!
//! `PlaybackSession` owns the step list, the per-step countdown lengths
//! (computed once, at construction) and the current position. Every change
//! goes through `apply`, a synchronous transition that returns the side
//! effects the host must carry out (arm/disarm the clock, sync the gallery,
//! report completion). The session itself never touches a timer, so it can
//! be driven tick by tick in tests.

use crate::error::{Error, Result};
use crate::playback::duration::DurationParser;
use serde::Serialize;
use serene_common::events::PlaybackState;
use serene_common::{Activity, StepEntry};

/// Input to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Begin at step 0 (only from Idle)
    Start,
    /// One clock period elapsed
    Tick,
    /// Skip to the next step, or complete on the last one
    Advance,
    /// Go back one step; no-op at step 0
    Retreat,
    Pause,
    Resume,
    TogglePause,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Current step changed; `from` is None on start
    StepChanged { from: Option<usize>, to: usize },
    /// Countdown decremented without crossing a step boundary
    Countdown { time_left_seconds: u32 },
    /// Establish a fresh clock interval
    ClockArmed,
    /// Cancel any pending tick
    ClockDisarmed,
    /// Last step finished; emitted once per session
    Completed,
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub current_step_index: usize,
    pub time_left_seconds: u32,
    pub step_count: usize,
}

impl SessionSnapshot {
    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub fn is_complete(&self) -> bool {
        self.state == PlaybackState::Complete
    }
}

/// In-memory playback of one activity
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    steps: Vec<StepEntry>,
    step_durations: Vec<u32>,
    current_step_index: usize,
    time_left_seconds: u32,
    state: PlaybackState,
}

impl PlaybackSession {
    /// Build a session, parsing every step's duration up front
    pub fn new(steps: Vec<StepEntry>, parser: &DurationParser) -> Self {
        let step_durations = parser.parse_all(&steps);
        Self::build(steps, step_durations)
    }

    pub fn from_activity(activity: &Activity, parser: &DurationParser) -> Self {
        Self::new(activity.steps.clone(), parser)
    }

    /// Build a session with explicit countdown lengths (seconds)
    ///
    /// Zero lengths are raised to one second so every step takes at least one tick.
    pub fn with_durations(steps: Vec<StepEntry>, step_durations: Vec<u32>) -> Result<Self> {
        if steps.len() != step_durations.len() {
            return Err(Error::InvalidState(format!(
                "{} steps but {} durations",
                steps.len(),
                step_durations.len()
            )));
        }
        let step_durations = step_durations.into_iter().map(|d| d.max(1)).collect();
        Ok(Self::build(steps, step_durations))
    }

    fn build(steps: Vec<StepEntry>, step_durations: Vec<u32>) -> Self {
        Self {
            steps,
            step_durations,
            current_step_index: 0,
            time_left_seconds: 0,
            state: PlaybackState::Idle,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub fn is_complete(&self) -> bool {
        self.state == PlaybackState::Complete
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn current_step(&self) -> Option<&StepEntry> {
        self.steps.get(self.current_step_index)
    }

    pub fn time_left_seconds(&self) -> u32 {
        self.time_left_seconds
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[StepEntry] {
        &self.steps
    }

    pub fn step_durations(&self) -> &[u32] {
        &self.step_durations
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            current_step_index: self.current_step_index,
            time_left_seconds: self.time_left_seconds,
            step_count: self.steps.len(),
        }
    }

    /// Apply one command and return the effects to carry out, in order
    pub fn apply(&mut self, command: Command) -> Vec<Effect> {
        match command {
            Command::Start => self.start(),
            Command::Tick => self.tick(),
            Command::Advance => {
                let mut effects = self.advance();
                self.rearm_after_skip(&mut effects);
                effects
            }
            Command::Retreat => {
                let mut effects = self.retreat();
                self.rearm_after_skip(&mut effects);
                effects
            }
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::TogglePause => self.toggle_pause(),
        }
    }

    /// Begin playback at step 0; no-op with zero steps or once started
    pub fn start(&mut self) -> Vec<Effect> {
        if self.state != PlaybackState::Idle || self.steps.is_empty() {
            return Vec::new();
        }

        self.current_step_index = 0;
        self.time_left_seconds = self.step_durations[0];
        self.state = PlaybackState::Running;
        vec![Effect::StepChanged { from: None, to: 0 }, Effect::ClockArmed]
    }

    /// One clock period elapsed; crossing zero advances or completes
    pub fn tick(&mut self) -> Vec<Effect> {
        if self.state != PlaybackState::Running {
            return Vec::new();
        }

        self.time_left_seconds = self.time_left_seconds.saturating_sub(1);
        if self.time_left_seconds == 0 {
            self.advance()
        } else {
            vec![Effect::Countdown {
                time_left_seconds: self.time_left_seconds,
            }]
        }
    }

    /// Move to the next step, or complete when the last step is done
    ///
    /// Running/paused is preserved when moving between steps.
    pub fn advance(&mut self) -> Vec<Effect> {
        if !self.is_active() {
            return Vec::new();
        }

        let from = self.current_step_index;
        let next = from + 1;
        if next < self.steps.len() {
            self.current_step_index = next;
            self.time_left_seconds = self.step_durations[next];
            return vec![Effect::StepChanged {
                from: Some(from),
                to: next,
            }];
        }

        // Terminal: index stays on the last step
        self.state = PlaybackState::Complete;
        self.time_left_seconds = 0;
        vec![Effect::ClockDisarmed, Effect::Completed]
    }

    /// Go back one step with that step's full countdown; no-op at step 0
    pub fn retreat(&mut self) -> Vec<Effect> {
        if !self.is_active() || self.current_step_index == 0 {
            return Vec::new();
        }

        let from = self.current_step_index;
        let to = from - 1;
        self.current_step_index = to;
        self.time_left_seconds = self.step_durations[to];
        vec![Effect::StepChanged {
            from: Some(from),
            to,
        }]
    }

    pub fn pause(&mut self) -> Vec<Effect> {
        if self.state != PlaybackState::Running {
            return Vec::new();
        }
        self.state = PlaybackState::Paused;
        vec![Effect::ClockDisarmed]
    }

    pub fn resume(&mut self) -> Vec<Effect> {
        if self.state != PlaybackState::Paused {
            return Vec::new();
        }
        self.state = PlaybackState::Running;
        vec![Effect::ClockArmed]
    }

    /// Flip running/paused; position and countdown are untouched
    pub fn toggle_pause(&mut self) -> Vec<Effect> {
        match self.state {
            PlaybackState::Running => self.pause(),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Idle | PlaybackState::Complete => Vec::new(),
        }
    }

    fn is_active(&self) -> bool {
        matches!(self.state, PlaybackState::Running | PlaybackState::Paused)
    }

    /// A user skip while running restarts the interval so the new step gets whole seconds
    fn rearm_after_skip(&self, effects: &mut Vec<Effect>) {
        let changed_step = effects
            .iter()
            .any(|effect| matches!(effect, Effect::StepChanged { .. }));
        if changed_step && self.is_running() {
            effects.push(Effect::ClockArmed);
        }
    }
}
