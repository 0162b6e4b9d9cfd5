//! Session context
//!
//! Everything a host needs to browse activities and start playback, passed
//! explicitly: who is signed in, where content comes from, where completions
//! go, and the shared event bus.

use crate::content::{sort_by_popularity, ActivityFilter, CompletionSink, ContentRepository};
use crate::error::Result;
use crate::playback::{
    Carousel, Clock, CompletionReporter, DurationParser, IntervalClock, MediaSync,
    PlaybackSession, SessionHandle, SessionPlayer,
};
use serene_common::config::PlayerConfig;
use serene_common::events::EventBus;
use serene_common::Activity;
use std::sync::Arc;
use tracing::{info, info_span};
use uuid::Uuid;

/// Signed-in user, as established by the host's auth provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
    pub display_name: Option<String>,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Throwaway identity for guest playback
    pub fn anonymous() -> Self {
        Self::new(format!("guest-{}", Uuid::new_v4()))
    }
}

pub struct SessionContext {
    user: Option<UserIdentity>,
    repository: Arc<dyn ContentRepository>,
    sink: Arc<dyn CompletionSink>,
    events: EventBus,
    config: PlayerConfig,
    carousel: Option<Arc<dyn Carousel>>,
}

impl SessionContext {
    pub fn new(
        config: PlayerConfig,
        repository: Arc<dyn ContentRepository>,
        sink: Arc<dyn CompletionSink>,
    ) -> Self {
        let events = EventBus::new(config.event_bus_capacity);
        Self {
            user: None,
            repository,
            sink,
            events,
            config,
            carousel: None,
        }
    }

    pub fn with_user(mut self, user: UserIdentity) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_carousel(mut self, carousel: Arc<dyn Carousel>) -> Self {
        self.carousel = Some(carousel);
        self
    }

    /// Share an existing bus instead of the one built from config
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Fetch an activity and build its (not yet started) session
    pub async fn load_session(&self, activity_id: &str) -> Result<(Activity, PlaybackSession)> {
        let activity = self.repository.get_activity_by_id(activity_id).await?;
        let parser = DurationParser::from_config(&self.config);
        let session = PlaybackSession::from_activity(&activity, &parser);
        Ok((activity, session))
    }

    /// Fetch an activity and spawn a real-time player for it
    ///
    /// Load errors propagate and no player is created. The session is left
    /// Idle; call `start()` on the returned handle.
    pub async fn begin_activity(&self, activity_id: &str) -> Result<SessionHandle> {
        let clock = IntervalClock::from_config(&self.config);
        self.begin_activity_with_clock(activity_id, clock).await
    }

    pub async fn begin_activity_with_clock<C: Clock + 'static>(
        &self,
        activity_id: &str,
        clock: C,
    ) -> Result<SessionHandle> {
        let (activity, session) = self.load_session(activity_id).await?;
        let media = MediaSync::for_activity(&activity, self.carousel.clone());
        let reporter = CompletionReporter::new(Arc::clone(&self.sink));

        let player = SessionPlayer::new(
            activity.id.clone(),
            session,
            clock,
            media,
            reporter,
            self.events.clone(),
        );
        let user_id = self
            .user
            .as_ref()
            .map(|u| u.user_id.as_str())
            .unwrap_or("anonymous");
        let span = info_span!("session", id = %player.session_id(), user = %user_id);
        span.in_scope(|| {
            info!("Loaded activity {} ({} steps)", activity.id, activity.step_count())
        });

        Ok(player.spawn_in(span))
    }

    /// Activities matching `filter`, most popular first
    pub async fn browse(&self, filter: &ActivityFilter) -> Result<Vec<Activity>> {
        let activities = self.repository.list_activities().await?;
        let mut found = filter.apply(&activities);
        sort_by_popularity(&mut found);
        Ok(found.into_iter().cloned().collect())
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("user", &self.user)
            .field("events", &self.events)
            .field("config", &self.config)
            .field("carousel", &self.carousel.is_some())
            .finish()
    }
}
