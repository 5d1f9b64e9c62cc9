//! Error types for the booking pipeline.

use crate::types::{GeoLocation, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a booking produced no ticket
///
/// Errors are contained per pipeline: one failed booking never affects its
/// siblings, and the aggregate ticket stream itself never fails.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingError {
    /// The user id is not in the directory
    #[error("user {user_id} not found")]
    NotFound {
        /// The id that was looked up
        user_id: UserId,
    },

    /// No agency offers a flight departing the resolved location
    #[error("no flights available from {location}")]
    NoAvailability {
        /// Where the user was located
        location: GeoLocation,
    },

    /// A collaborator failed
    #[error("transient fault: {0}")]
    TransientFault(String),

    /// The booking was cancelled before it finished
    #[error("booking cancelled")]
    Cancelled,
}

impl BookingError {
    /// Stable label for metrics and reports
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::NoAvailability { .. } => "no_availability",
            Self::TransientFault(_) => "transient_fault",
            Self::Cancelled => "cancelled",
        }
    }

    /// Create a transient fault from any displayable cause
    pub fn transient(cause: impl std::fmt::Display) -> Self {
        Self::TransientFault(cause.to_string())
    }
}

/// Result type alias for booking operations
pub type Result<T> = std::result::Result<T, BookingError>;
