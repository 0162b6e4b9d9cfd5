//! Gallery carousel synchronization
//!
//! Gallery slot 0 is the activity cover; slot `i + 1` illustrates step `i`.
//! Activities with fewer images than steps keep showing the last image.

use serene_common::Activity;
use std::sync::Arc;
use tracing::debug;

/// Visual carousel that can be moved to a gallery slot
///
/// Fire-and-forget: nothing flows back into the player.
pub trait Carousel: Send + Sync {
    fn scroll_to(&self, position: usize);
}

/// Gallery slot for a step, clamped to the last image; None for an empty gallery
pub fn gallery_position(step_index: usize, gallery_len: usize) -> Option<usize> {
    if gallery_len == 0 {
        return None;
    }
    Some(step_index.saturating_add(1).min(gallery_len - 1))
}

/// Moves the carousel in lockstep with the current step
#[derive(Clone)]
pub struct MediaSync {
    gallery_len: usize,
    carousel: Option<Arc<dyn Carousel>>,
}

impl MediaSync {
    pub fn new(gallery_len: usize, carousel: Arc<dyn Carousel>) -> Self {
        Self {
            gallery_len,
            carousel: Some(carousel),
        }
    }

    /// Resolve positions without driving any carousel
    pub fn detached(gallery_len: usize) -> Self {
        Self {
            gallery_len,
            carousel: None,
        }
    }

    pub fn for_activity(activity: &Activity, carousel: Option<Arc<dyn Carousel>>) -> Self {
        Self {
            gallery_len: activity.imagepath.len(),
            carousel,
        }
    }

    pub fn gallery_len(&self) -> usize {
        self.gallery_len
    }

    /// Scroll to the slot for `step_index`; returns the slot used
    pub fn sync(&self, step_index: usize) -> Option<usize> {
        let position = gallery_position(step_index, self.gallery_len)?;
        if let Some(carousel) = &self.carousel {
            carousel.scroll_to(position);
        }
        Some(position)
    }
}

impl std::fmt::Debug for MediaSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSync")
            .field("gallery_len", &self.gallery_len)
            .field("attached", &self.carousel.is_some())
            .finish()
    }
}

/// Carousel that only logs, for headless hosts
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCarousel;

impl Carousel for TracingCarousel {
    fn scroll_to(&self, position: usize) {
        debug!("Gallery scrolled to slot {}", position);
    }
}
