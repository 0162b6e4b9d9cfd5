//! Shared fakes for serene-player integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serene_common::events::SessionEvent;
use serene_common::{Activity, ActivityKind, ActivityStep, StepEntry};
use serene_player::content::{CompletionSink, JsonCatalog};
use serene_player::playback::Carousel;
use serene_player::{Error, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Carousel that records every slot it is scrolled to
#[derive(Default)]
pub struct RecordingCarousel {
    positions: Mutex<Vec<usize>>,
}

impl RecordingCarousel {
    pub fn positions(&self) -> Vec<usize> {
        self.positions.lock().unwrap().clone()
    }
}

impl Carousel for RecordingCarousel {
    fn scroll_to(&self, position: usize) {
        self.positions.lock().unwrap().push(position);
    }
}

/// Completion sink that records calls, optionally failing each one
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionSink for RecordingSink {
    async fn increment_popularity(&self, id: &str) -> Result<()> {
        self.calls.lock().unwrap().push(id.to_string());
        if self.fail {
            return Err(Error::Sink("write rejected".to_string()));
        }
        Ok(())
    }
}

/// Exercise activity with one detailed step per duration text
///
/// The gallery has a cover plus one image per step.
pub fn activity(id: &str, durations: &[&str]) -> Activity {
    let steps: Vec<StepEntry> = durations
        .iter()
        .enumerate()
        .map(|(i, duration)| {
            StepEntry::Detailed(ActivityStep {
                step_number: i as u32 + 1,
                title: format!("Step {}", i + 1),
                description: String::new(),
                duration: Some(duration.to_string()),
                instructions: vec![format!("Follow step {}", i + 1)],
            })
        })
        .collect();

    let imagepath = std::iter::once("cover.png".to_string())
        .chain((1..=steps.len()).map(|i| format!("step{i}.png")))
        .collect();

    Activity {
        id: id.to_string(),
        name: format!("Activity {id}"),
        description: String::new(),
        kind: ActivityKind::Exercise,
        duration: None,
        difficulty: None,
        tags: Vec::new(),
        emotions: vec!["anxious".to_string()],
        imagepath,
        steps,
        popularity: 0,
    }
}

pub fn catalog(activities: Vec<Activity>) -> Arc<JsonCatalog> {
    Arc::new(JsonCatalog::from_activities(activities).unwrap())
}

/// Everything currently buffered on a subscription
pub fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn count_completed(events: &[SessionEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SessionEvent::SessionCompleted { .. }))
        .count()
}
