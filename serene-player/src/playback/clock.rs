//! Playback clock sources
//!
//! The session player waits on exactly one `Clock`. Arming starts a fresh
//! interval whose first tick lands one full period later; disarming drops any
//! pending tick. `IntervalClock` is the real-time source, `ManualClock` is
//! driven by hand (tests, scripted playback).

use async_trait::async_trait;
use serene_common::config::PlayerConfig;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::trace;

/// Single tick source for a playback session
#[async_trait]
pub trait Clock: Send {
    /// Establish a fresh interval, replacing any previous one
    fn arm(&mut self);

    /// Cancel the pending tick; `tick()` will not resolve until re-armed
    fn disarm(&mut self);

    fn is_armed(&self) -> bool;

    /// Resolve at the next tick while armed; never resolves while disarmed
    async fn tick(&mut self);
}

/// Real-time clock over `tokio::time::interval_at`
#[derive(Debug)]
pub struct IntervalClock {
    period: Duration,
    interval: Option<Interval>,
}

impl IntervalClock {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            interval: None,
        }
    }

    pub fn from_config(config: &PlayerConfig) -> Self {
        Self::new(Duration::from_millis(config.tick_interval_ms))
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for IntervalClock {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl Clock for IntervalClock {
    fn arm(&mut self) {
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        // A stalled host must not replay a burst of ticks
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    fn disarm(&mut self) {
        self.interval = None;
    }

    fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

/// Hand-driven clock
///
/// Ticks pushed through the paired `ManualClockHandle` are delivered only
/// while the clock is armed. Arming or disarming discards ticks still queued,
/// so a tick sent during a pause never lands after resume.
#[derive(Debug)]
pub struct ManualClock {
    ticks: mpsc::UnboundedReceiver<()>,
    armed: Arc<AtomicBool>,
    arm_count: Arc<AtomicUsize>,
}

/// Sending side of a `ManualClock`
#[derive(Debug, Clone)]
pub struct ManualClockHandle {
    ticks: mpsc::UnboundedSender<()>,
    armed: Arc<AtomicBool>,
    arm_count: Arc<AtomicUsize>,
}

/// Create a manual clock and its handle
pub fn manual_clock() -> (ManualClock, ManualClockHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    let armed = Arc::new(AtomicBool::new(false));
    let arm_count = Arc::new(AtomicUsize::new(0));
    (
        ManualClock {
            ticks: rx,
            armed: Arc::clone(&armed),
            arm_count: Arc::clone(&arm_count),
        },
        ManualClockHandle {
            ticks: tx,
            armed,
            arm_count,
        },
    )
}

impl ManualClock {
    fn discard_queued(&mut self) {
        while self.ticks.try_recv().is_ok() {
            trace!("Discarding queued manual tick");
        }
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn arm(&mut self) {
        self.discard_queued();
        self.armed.store(true, Ordering::SeqCst);
        self.arm_count.fetch_add(1, Ordering::SeqCst);
    }

    fn disarm(&mut self) {
        self.discard_queued();
        self.armed.store(false, Ordering::SeqCst);
    }

    fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    async fn tick(&mut self) {
        loop {
            match self.ticks.recv().await {
                Some(()) if self.is_armed() => return,
                Some(()) => trace!("Manual tick while disarmed, ignored"),
                None => std::future::pending::<()>().await,
            }
        }
    }
}

impl ManualClockHandle {
    /// Push one tick; returns false once the clock has been dropped
    pub fn tick(&self) -> bool {
        self.ticks.send(()).is_ok()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Number of times the clock has been armed (start, resume, re-arm after skip)
    pub fn arm_count(&self) -> usize {
        self.arm_count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_interval_clock_first_tick_after_one_period() {
        let mut clock = IntervalClock::new(Duration::from_secs(1));
        clock.arm();
        let armed_at = Instant::now();

        clock.tick().await;
        assert_eq!(armed_at.elapsed(), Duration::from_secs(1));

        clock.tick().await;
        assert_eq!(armed_at.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_clock_disarmed_never_ticks() {
        let mut clock = IntervalClock::default();
        clock.arm();
        clock.disarm();
        assert!(!clock.is_armed());

        let result = time::timeout(Duration::from_secs(10), clock.tick()).await;
        assert!(result.is_err(), "disarmed clock must not tick");
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_clock_rearm_restarts_period() {
        let mut clock = IntervalClock::new(Duration::from_secs(1));
        clock.arm();
        time::sleep(Duration::from_millis(900)).await;

        clock.arm();
        let rearmed_at = Instant::now();
        clock.tick().await;
        assert_eq!(rearmed_at.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn test_interval_clock_zero_period_clamped() {
        let clock = IntervalClock::new(Duration::ZERO);
        assert_eq!(clock.period(), Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_manual_clock_delivers_only_while_armed() {
        let (mut clock, handle) = manual_clock();

        // Tick before arming is dropped by arm()
        assert!(handle.tick());
        clock.arm();
        assert!(handle.is_armed());
        assert_eq!(handle.arm_count(), 1);

        handle.tick();
        time::timeout(Duration::from_secs(1), clock.tick())
            .await
            .expect("armed clock should tick");

        let pending = time::timeout(Duration::from_millis(50), clock.tick()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_manual_clock_ignores_ticks_while_disarmed() {
        let (mut clock, handle) = manual_clock();
        clock.arm();
        clock.disarm();
        assert!(!handle.is_armed());

        handle.tick();
        handle.tick();
        let result = time::timeout(Duration::from_millis(50), clock.tick()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_manual_handle_reports_dropped_clock() {
        let (clock, handle) = manual_clock();
        drop(clock);
        assert!(!handle.tick());
    }
}
