//! User directory and flight catalog.
//!
//! Both are leaf data sources: a lazy stream over a read-only snapshot that
//! becomes visible after one simulated access delay.

use crate::error::{BookingError, Result};
use crate::latency::SimulatedLatency;
use crate::types::{Flight, User, UserId};
use async_stream::stream;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use std::pin::pin;
use std::sync::Arc;

/// Source of user records
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Every user, as a lazy stream
    fn all_users(&self) -> BoxStream<'static, Result<User>>;

    /// The user with `id`, if any
    ///
    /// Absence is not an error. Two records with the same id are a
    /// [`BookingError::TransientFault`].
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        tracing::debug!(source = "users", user_id = %id, "Find by id: start");

        let mut matches = pin!(self.all_users().try_filter(move |user| {
            let found = user.id == id;
            async move { found }
        }));

        let Some(user) = matches.try_next().await? else {
            tracing::debug!(source = "users", user_id = %id, "Find by id: no match");
            return Ok(None);
        };

        if matches.try_next().await?.is_some() {
            return Err(BookingError::transient(format!("duplicate user record {id}")));
        }

        tracing::debug!(source = "users", user_id = %id, "Find by id: exit");
        Ok(Some(user))
    }
}

/// Source of flight records
pub trait FlightCatalog: Send + Sync {
    /// Every flight, as a lazy stream
    fn all_flights(&self) -> BoxStream<'static, Result<Flight>>;
}

/// Emit every record of `snapshot` after one simulated delay
fn delayed_snapshot<T>(
    source: &'static str,
    snapshot: &Arc<[T]>,
    latency: &SimulatedLatency,
) -> BoxStream<'static, Result<T>>
where
    T: Clone + Send + Sync + 'static,
{
    tracing::debug!(source, "Starting simulated database request");

    let snapshot = Arc::clone(snapshot);
    let delay = latency.delay();

    let records = stream! {
        tracing::debug!(source, "Start simulated database access");
        let waited = delay.await;
        for record in snapshot.iter() {
            yield Ok(record.clone());
        }
        tracing::debug!(
            source,
            delay_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
            "End simulated database transmission"
        );
    };

    tracing::debug!(source, "Exiting simulated database request");
    records.boxed()
}

/// In-memory user directory with simulated latency
#[derive(Debug, Clone)]
pub struct SimulatedUserDirectory {
    users: Arc<[User]>,
    latency: SimulatedLatency,
}

impl SimulatedUserDirectory {
    /// Creates a directory over `users`
    #[must_use]
    pub fn new(users: Arc<[User]>, latency: SimulatedLatency) -> Self {
        Self { users, latency }
    }
}

impl UserDirectory for SimulatedUserDirectory {
    fn all_users(&self) -> BoxStream<'static, Result<User>> {
        delayed_snapshot("users", &self.users, &self.latency)
    }
}

/// In-memory flight catalog with simulated latency
#[derive(Debug, Clone)]
pub struct SimulatedFlightCatalog {
    flights: Arc<[Flight]>,
    latency: SimulatedLatency,
}

impl SimulatedFlightCatalog {
    /// Creates a catalog over `flights`
    #[must_use]
    pub fn new(flights: Arc<[Flight]>, latency: SimulatedLatency) -> Self {
        Self { flights, latency }
    }
}

impl FlightCatalog for SimulatedFlightCatalog {
    fn all_flights(&self) -> BoxStream<'static, Result<Flight>> {
        delayed_snapshot("flights", &self.flights, &self.latency)
    }
}
