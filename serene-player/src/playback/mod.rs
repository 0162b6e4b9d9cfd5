//! Step playback
//!
//! `session` is the synchronous state machine; `player` runs it on a task
//! against one `clock`, keeping the gallery (`media_sync`) in step and
//! reporting completion (`completion`).

pub mod clock;
pub mod completion;
pub mod duration;
pub mod media_sync;
pub mod player;
pub mod session;

pub use clock::{manual_clock, Clock, IntervalClock, ManualClock, ManualClockHandle};
pub use completion::CompletionReporter;
pub use duration::{DurationParser, DEFAULT_STEP_SECONDS};
pub use media_sync::{gallery_position, Carousel, MediaSync, TracingCarousel};
pub use player::{SessionHandle, SessionPlayer, SessionSummary, COMPLETION_FLUSH_TIMEOUT};
pub use session::{Command, Effect, PlaybackSession, SessionSnapshot};
