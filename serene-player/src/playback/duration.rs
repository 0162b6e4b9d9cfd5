//! Step duration parsing
//!
//! Turns a step's free-text `duration` ("4 seconds", "2 min") into the
//! countdown length used by the playback clock. Never fails: anything that
//! cannot be read falls back to the default step length.

use serene_common::config::{DurationUnitPolicy, PlayerConfig};
use serene_common::StepEntry;

/// Step length when nothing usable is found (seconds)
pub const DEFAULT_STEP_SECONDS: u32 = 120;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3600;

/// Free-text duration parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationParser {
    policy: DurationUnitPolicy,
    default_seconds: u32,
}

impl DurationParser {
    pub fn new(policy: DurationUnitPolicy, default_seconds: u32) -> Self {
        Self {
            policy,
            default_seconds: default_seconds.max(1),
        }
    }

    pub fn from_config(config: &PlayerConfig) -> Self {
        Self::new(config.duration_unit, config.default_step_seconds)
    }

    /// Every number read as minutes, as the content tool has always stored it
    pub fn legacy() -> Self {
        Self::new(DurationUnitPolicy::Minutes, DEFAULT_STEP_SECONDS)
    }

    pub fn policy(&self) -> DurationUnitPolicy {
        self.policy
    }

    pub fn default_seconds(&self) -> u32 {
        self.default_seconds
    }

    /// Countdown length for one step, in seconds (always positive)
    pub fn parse(&self, step: &StepEntry) -> u32 {
        match step {
            StepEntry::Plain(_) => self.default_seconds,
            StepEntry::Detailed(detail) => self.parse_text(detail.duration.as_deref()),
        }
    }

    /// Countdown length for a raw duration field
    pub fn parse_text(&self, text: Option<&str>) -> u32 {
        let Some((value, rest)) = text.and_then(leading_number) else {
            return self.default_seconds;
        };

        let multiplier = match self.policy {
            DurationUnitPolicy::Minutes => SECONDS_PER_MINUTE,
            DurationUnitPolicy::Detect => unit_multiplier(rest),
        };

        match value.saturating_mul(multiplier) {
            0 => self.default_seconds,
            seconds => u32::try_from(seconds).unwrap_or(u32::MAX),
        }
    }

    /// Durations for every step, in order
    pub fn parse_all(&self, steps: &[StepEntry]) -> Vec<u32> {
        steps.iter().map(|step| self.parse(step)).collect()
    }
}

impl Default for DurationParser {
    fn default() -> Self {
        Self::new(DurationUnitPolicy::Detect, DEFAULT_STEP_SECONDS)
    }
}

/// First contiguous run of ASCII digits and the text that follows it
fn leading_number(text: &str) -> Option<(u64, &str)> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits_len = text[start..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len() - start);
    let end = start + digits_len;

    let value = text[start..end].bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
    });
    Some((value, &text[end..]))
}

/// Seconds per unit named by the word right after the number
///
/// No keyword, or an unknown one, means minutes.
fn unit_multiplier(rest: &str) -> u64 {
    let word: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase();

    match word.as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "h" | "hr" | "hrs" | "hour" | "hours" => SECONDS_PER_HOUR,
        _ => SECONDS_PER_MINUTE,
    }
}
