//! # Serene Activity Player Library (serene-player)
//!
//! Guided activity playback engine.
//!
//! **Purpose:** Turn a stored activity's step list into a timed, navigable,
//! resumable playback session, keeping the gallery carousel in step and
//! reporting completion once.
//!
//! **Architecture:** A pure state machine (`playback::session`) driven by a
//! single injected clock (`playback::clock`) inside one async task
//! (`playback::player`).

pub mod content;
pub mod context;
pub mod error;
pub mod playback;

pub use context::{SessionContext, UserIdentity};
pub use error::{Error, Result};
pub use playback::{PlaybackSession, SessionHandle};
