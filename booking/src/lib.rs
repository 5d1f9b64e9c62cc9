//! # Airfare Booking
//!
//! A concurrent flight-booking pipeline built on the Airfare architecture.
//!
//! This crate showcases:
//! - Simulated-latency data sources exposed as lazy streams
//! - Concurrent fan-out (user lookup with geolocation, then every agency)
//! - Uniform random selection and a join into a [`Ticket`](types::Ticket)
//! - Per-pipeline error containment with observable failures
//! - A reducer feature (the booking desk) that runs pipelines as cancellable
//!   effects under a time budget
//!
//! ## Architecture
//!
//! ```text
//! BookingService ─┬─ UserDirectory::find_by_id ─┐
//!                 └─ Geolocator::locate ────────┴─ AgencyPool::search_all ─ pick ─ Ticket
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use airfare_booking::aggregate::collect_within;
//! use airfare_booking::config::BookingConfig;
//! use airfare_booking::data;
//! use airfare_booking::service::BookingService;
//! use airfare_runtime::TokioScheduler;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let config = BookingConfig::default();
//! let service = BookingService::simulated(&config, Arc::new(TokioScheduler));
//!
//! let tickets = service.book_all_for(data::user_ids());
//! let collected = collect_within(tickets, &TokioScheduler, config.budget).await;
//! for ticket in collected.items {
//!     println!("{ticket}\n");
//! }
//! # }
//! ```

pub mod agency;
pub mod aggregate;
pub mod config;
pub mod data;
pub mod desk;
pub mod directory;
pub mod error;
pub mod geolocator;
pub mod latency;
pub mod random;
pub mod service;
pub mod types;

pub use desk::{BookingAction, BookingEnvironment, BookingReducer, BookingState};
pub use error::BookingError;
pub use service::{BookingOutcome, BookingService};
pub use types::{Flight, GeoLocation, Ticket, User, UserId};
