//! Booking orchestrator.
//!
//! One booking is a small pipeline:
//!
//! 1. Look the user up and locate them, concurrently
//! 2. Search every agency for flights departing that location, concurrently
//! 3. Pick one candidate uniformly at random
//! 4. Join the flight with the user into a [`Ticket`]
//!
//! [`BookingService::book_all_outcomes`] runs one such pipeline per id, all
//! concurrently, and yields outcomes in arrival order.

use crate::agency::AgencyPool;
use crate::config::BookingConfig;
use crate::data;
use crate::directory::{FlightCatalog, SimulatedFlightCatalog, SimulatedUserDirectory, UserDirectory};
use crate::error::{BookingError, Result};
use crate::geolocator::{FixedGeolocator, Geolocator, RandomGeolocator};
use crate::latency::SimulatedLatency;
use crate::random::SharedRng;
use crate::types::{Ticket, UserId};
use airfare_core::environment::Scheduler;
use airfare_core::task::TaskHandle;
use airfare_runtime::metrics::BookingMetrics;
use futures::{Stream, StreamExt, future, stream};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// The result of one booking request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingOutcome {
    /// Who the booking was for
    pub user_id: UserId,
    /// The ticket, or why there is none
    pub result: Result<Ticket>,
}

/// Runs booking pipelines
///
/// Cheap to clone: every collaborator is shared.
#[derive(Clone)]
pub struct BookingService {
    directory: Arc<dyn UserDirectory>,
    geolocator: Arc<dyn Geolocator>,
    agencies: Arc<AgencyPool>,
    rng: SharedRng,
    scheduler: Arc<dyn Scheduler>,
}

impl BookingService {
    /// Assemble a service from its collaborators
    #[must_use]
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        geolocator: Arc<dyn Geolocator>,
        agencies: AgencyPool,
        rng: SharedRng,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            directory,
            geolocator,
            agencies: Arc::new(agencies),
            rng,
            scheduler,
        }
    }

    /// The simulated system: seed data, simulated latency, three agencies
    ///
    /// Every random decision draws from one generator, seeded from
    /// `config.seed` when set.
    #[must_use]
    pub fn simulated(config: &BookingConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        let rng = SharedRng::new(config.seed);
        let latency = SimulatedLatency::new(Arc::clone(&scheduler), config.max_latency, rng.clone());

        let directory = Arc::new(SimulatedUserDirectory::new(data::users(), latency.clone()));
        let catalog: Arc<dyn FlightCatalog> =
            Arc::new(SimulatedFlightCatalog::new(data::flights(), latency));

        let geolocator: Arc<dyn Geolocator> = match config.location {
            Some(location) => Arc::new(FixedGeolocator::new(
                location,
                Arc::clone(&scheduler),
                config.geolocation_delay,
            )),
            None => Arc::new(RandomGeolocator::new(
                Arc::clone(&scheduler),
                config.geolocation_delay,
                rng.clone(),
            )),
        };

        let agencies = AgencyPool::standard(&catalog, config.candidate_policy);

        Self::new(directory, geolocator, agencies, rng, scheduler)
    }

    /// Book one ticket on a random flight departing the user's location
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`]: the id is not in the directory
    /// - [`BookingError::NoAvailability`]: no agency offers a flight from the location
    /// - [`BookingError::TransientFault`]: a collaborator failed
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn book_random_ticket_for(&self, user_id: UserId) -> Result<Ticket> {
        tracing::debug!("Random ticket: start");
        BookingMetrics::record_request();
        let started = Instant::now();

        let result = self.book(user_id).await;

        match &result {
            Ok(ticket) => {
                BookingMetrics::record_ticket(started.elapsed());
                tracing::info!(flight = %ticket.flight_id, departing = %ticket.departing, "Ticket issued");
            },
            Err(error) => {
                BookingMetrics::record_failure(error.reason(), started.elapsed());
                tracing::debug!(reason = error.reason(), error = %error, "Booking produced no ticket");
            },
        }

        result
    }

    async fn book(&self, user_id: UserId) -> Result<Ticket> {
        let user = async {
            self.directory
                .find_by_id(user_id)
                .await?
                .ok_or(BookingError::NotFound { user_id })
        };
        let (user, location) = future::try_join(user, self.geolocator.locate()).await?;

        let candidates = self.agencies.search_all(&user, location).await?;
        tracing::debug!(%location, candidates = candidates.len(), "Agencies searched");

        let flight = self
            .rng
            .index(candidates.len())
            .and_then(|i| candidates.get(i))
            .ok_or(BookingError::NoAvailability { location })?;

        Ok(Ticket::issue(&user, flight))
    }

    /// Run one pipeline per id, concurrently
    ///
    /// Outcomes arrive in completion order. Dropping the returned stream
    /// cancels every pipeline still running.
    #[must_use]
    pub fn book_all_outcomes(&self, user_ids: impl IntoIterator<Item = UserId>) -> BookingStream {
        let (sender, receiver) = mpsc::unbounded_channel();

        let tasks = user_ids
            .into_iter()
            .map(|user_id| {
                let service = self.clone();
                let sender = sender.clone();
                self.scheduler.spawn(Box::pin(async move {
                    let result = service.book_random_ticket_for(user_id).await;
                    // Receiver gone means nobody is listening any more
                    let _ = sender.send(BookingOutcome { user_id, result });
                }))
            })
            .collect();

        BookingStream { receiver, tasks }
    }

    /// Run one pipeline per id and yield only the issued tickets
    ///
    /// Failed bookings are dropped from the stream; they are still logged and
    /// counted. Dropping the stream cancels every pipeline still running.
    pub fn book_all_for(&self, user_ids: impl IntoIterator<Item = UserId>) -> TicketStream {
        self.book_all_outcomes(user_ids)
            .filter_map(issued_ticket as fn(BookingOutcome) -> future::Ready<Option<Ticket>>)
    }
}

fn issued_ticket(outcome: BookingOutcome) -> future::Ready<Option<Ticket>> {
    future::ready(outcome.result.ok())
}

/// Tickets of concurrently running booking pipelines, in arrival order
pub type TicketStream =
    stream::FilterMap<BookingStream, future::Ready<Option<Ticket>>, fn(BookingOutcome) -> future::Ready<Option<Ticket>>>;

/// Outcomes of concurrently running booking pipelines
///
/// Ends once every pipeline has reported. Dropping it cancels the rest.
pub struct BookingStream {
    receiver: mpsc::UnboundedReceiver<BookingOutcome>,
    tasks: Vec<TaskHandle>,
}

impl BookingStream {
    /// Number of pipelines started
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no pipeline was started
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Cancel every pipeline still running
    ///
    /// The stream ends once the cancelled pipelines have stopped.
    pub fn cancel_all(&self) {
        for task in &self.tasks {
            task.cancel();
        }
    }
}

impl Stream for BookingStream {
    type Item = BookingOutcome;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for BookingStream {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl std::fmt::Debug for BookingStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingStream")
            .field("pipelines", &self.tasks.len())
            .finish_non_exhaustive()
    }
}
