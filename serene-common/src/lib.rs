//! # Serene Common Library
//!
//! Shared code for the Serene wellness services including:
//! - Activity and step data model
//! - Event types (SessionEvent enum) and EventBus
//! - Configuration loading
//! - Utility functions

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use models::{Activity, ActivityKind, ActivityStep, StepEntry};
