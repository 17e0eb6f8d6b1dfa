#![forbid(unsafe_code)]

//! Core domain model and business logic for the rehab schedule tracker.
//!
//! This crate provides:
//! - Domain types (users, questionnaires, exercises, schedules, trainings)
//! - The exercise catalog and per-exercise recurrence table
//! - Schedule generation and session bookkeeping
//! - Persistence (transactional record store, CSV export)
//! - Authentication and configuration

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod catalog;
pub mod recurrence;
pub mod calendar;
pub mod scheduler;
pub mod sessions;
pub mod schedules;
pub mod questionnaire;
pub mod identity;
pub mod history;
pub mod export;

// Re-export commonly used types
pub use error::{Error, ErrorKind, Result};
pub use types::*;
pub use config::Config;
pub use store::{FileStore, MemoryStore, RecordStore};
pub use recurrence::RecurrenceTable;
pub use scheduler::{generate_schedule, ScheduleContext};
pub use identity::{Credentials, IdentityProvider, StoreIdentity};
