//! # Remind Core Library
//!
//! Recurrence and notification engine for personal and shared reminders.
//! Reminders fire on a date-time, on proximity to a place, or both, and may
//! repeat daily, weekly, monthly or yearly.
//!
//! ## Features
//!
//! - **Occurrence arithmetic**: calendar-aware next-occurrence computation with
//!   month-end and leap-day clamping
//! - **In-place renewal**: completing a recurring reminder advances it to its
//!   next occurrence, bounded by an optional end date
//! - **Calendar expansion**: bounded projection of recurring reminders onto a
//!   month grid, including dateless location reminders
//! - **Sharing visibility**: owned, friend-shared and group-shared reminders
//!   merged into one deduplicated set with per-user mutation rights
//! - **Notification polling**: session-scoped, at-most-once delivery of due and
//!   nearby reminders with an explicit start/stop lifecycle
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`recurrence`]: Occurrence calculator
//! - [`calendar`]: Calendar expander and month view model
//! - [`renewal`]: Completion and renewal decisions
//! - [`visibility`]: Access levels and visibility merging
//! - [`repository`]: Data access layer with Repository pattern
//! - [`notify`]: Notification poller
//! - [`proximity`]: Great-circle distance checks
//! - [`geocoding`]: Address lookup collaborator
//! - [`api`]: Wire contracts and in-process client
//! - [`error`]: Error taxonomy
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chrono::{Duration, Utc};
//! use remind_core::{
//!     db,
//!     geocoding::{GeocoderConfig, NominatimGeocoder},
//!     models::{NewReminderData, RecurrencePattern, UpdateReminderData},
//!     repository::{ReminderRepository, SocialRepository, SqliteRepository},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), remind_core::error::CoreError> {
//!     let pool = db::establish_connection("remind.db").await?;
//!     let geocoder = Arc::new(NominatimGeocoder::new(GeocoderConfig::default())?);
//!     let repo = SqliteRepository::with_local_locations(pool, geocoder);
//!
//!     let user = repo.add_user("Ana".into(), "ana@example.com".into()).await?;
//!     let reminder = repo
//!         .add_reminder(
//!             user.id,
//!             NewReminderData {
//!                 title: "Water the plants".to_string(),
//!                 datetime: Some(Utc::now() + Duration::hours(1)),
//!                 recurrence_pattern: Some(RecurrencePattern::Weekly),
//!                 ..Default::default()
//!             },
//!         )
//!         .await?;
//!
//!     let done = UpdateReminderData { is_completed: Some(true), ..Default::default() };
//!     let outcome = repo.update_reminder(user.id, reminder.id, done).await?;
//!     println!("next occurrence: {:?}", outcome.next_occurrence());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod calendar;
pub mod db;
pub mod error;
pub mod geocoding;
pub mod models;
pub mod notify;
pub mod proximity;
pub mod recurrence;
pub mod renewal;
pub mod repository;
pub mod visibility;
