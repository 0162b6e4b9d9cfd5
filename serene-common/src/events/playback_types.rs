//! Playback-related type definitions

use serde::{Deserialize, Serialize};

/// Playback session state
///
/// `Complete` is terminal: a session never leaves it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Loaded, not yet started
    Idle,
    /// Clock ticking
    Running,
    /// Stopped mid-step, resumable
    Paused,
    /// Last step finished
    Complete,
}

impl PlaybackState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackState::Complete)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Running => write!(f, "running"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Complete => write!(f, "complete"),
        }
    }
}
