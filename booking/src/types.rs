//! Domain types for the flight-booking pipeline.
//!
//! Value objects shared by every stage: users, flights, locations and the
//! tickets produced by joining them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a user
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

// ============================================================================
// Value Objects
// ============================================================================

/// A registered user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: UserId,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

impl User {
    /// Creates a new user
    #[must_use]
    pub fn new(id: UserId, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// `"{first} {last}"`, the name printed on tickets
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A city flights depart from and arrive at
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeoLocation {
    /// London
    London,
    /// New York
    NewYork,
    /// Paris
    Paris,
    /// Sydney
    Sydney,
}

impl GeoLocation {
    /// Every location, in declaration order
    pub const ALL: [Self; 4] = [Self::London, Self::NewYork, Self::Paris, Self::Sydney];

    /// Human-readable name
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::London => "London",
            Self::NewYork => "New York",
            Self::Paris => "Paris",
            Self::Sydney => "Sydney",
        }
    }
}

impl fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Error returned when a location name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown location: {0}")]
pub struct UnknownLocation(pub String);

impl FromStr for GeoLocation {
    type Err = UnknownLocation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();

        match normalised.as_str() {
            "london" => Ok(Self::London),
            "newyork" => Ok(Self::NewYork),
            "paris" => Ok(Self::Paris),
            "sydney" => Ok(Self::Sydney),
            _ => Err(UnknownLocation(s.to_string())),
        }
    }
}

/// A scheduled flight
///
/// Ordered by id, then departure, then arrival, then airline.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Flight {
    /// Flight number, e.g. `BA111`
    pub id: String,
    /// Departure location
    pub depart: GeoLocation,
    /// Arrival location
    pub arrive: GeoLocation,
    /// Operating airline
    pub airline: String,
}

impl Flight {
    /// Creates a new flight
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        airline: impl Into<String>,
        depart: GeoLocation,
        arrive: GeoLocation,
    ) -> Self {
        Self {
            id: id.into(),
            depart,
            arrive,
            airline: airline.into(),
        }
    }
}

/// A booked ticket: one flight joined with one user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Passenger name
    pub for_name: String,
    /// Operating airline
    pub airline: String,
    /// Flight number
    pub flight_id: String,
    /// Departure location
    pub departing: GeoLocation,
    /// Arrival location
    pub arriving: GeoLocation,
}

impl Ticket {
    /// Issue a ticket for `user` on `flight`
    #[must_use]
    pub fn issue(user: &User, flight: &Flight) -> Self {
        Self {
            for_name: user.full_name(),
            airline: flight.airline.clone(),
            flight_id: flight.id.clone(),
            departing: flight.depart,
            arriving: flight.arrive,
        }
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}\nFlight #{}\nDeparting: {}\nArriving: {}",
            self.for_name, self.airline, self.flight_id, self.departing, self.arriving
        )
    }
}
