//! Shared fixtures for the booking integration tests.

#![allow(dead_code)] // Not every suite uses every fixture
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use airfare_booking::agency::{AgencyPool, CandidatePolicy};
use airfare_booking::data;
use airfare_booking::directory::{FlightCatalog, SimulatedFlightCatalog, SimulatedUserDirectory, UserDirectory};
use airfare_booking::error::{BookingError, Result};
use airfare_booking::geolocator::{FixedGeolocator, Geolocator};
use airfare_booking::latency::SimulatedLatency;
use airfare_booking::random::SharedRng;
use airfare_booking::{BookingService, Flight, GeoLocation, User, UserId};
use airfare_core::environment::Scheduler;
use airfare_testing::TestScheduler;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const MAX_LATENCY: Duration = Duration::from_millis(2000);
pub const GEOLOCATION_DELAY: Duration = Duration::from_millis(3000);

/// Collaborators of a booking service, with knobs for each test
pub struct Fixture {
    pub scheduler: TestScheduler,
    pub users: Arc<[User]>,
    pub flights: Arc<[Flight]>,
    pub location: GeoLocation,
    pub policy: CandidatePolicy,
    pub seed: u64,
}

impl Fixture {
    /// Seed data, virtual time, geolocator pinned to `location`
    pub fn new(location: GeoLocation) -> Self {
        Self {
            scheduler: TestScheduler::virtual_time(),
            users: data::users(),
            flights: data::flights(),
            location,
            policy: CandidatePolicy::KeepDuplicates,
            seed: 42,
        }
    }

    pub fn with_flights(mut self, flights: Vec<Flight>) -> Self {
        self.flights = flights.into();
        self
    }

    pub fn with_scheduler(mut self, scheduler: TestScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn latency(&self, rng: &SharedRng) -> SimulatedLatency {
        SimulatedLatency::new(self.scheduler(), MAX_LATENCY, rng.clone())
    }

    pub fn scheduler(&self) -> Arc<dyn Scheduler> {
        Arc::new(self.scheduler.clone())
    }

    pub fn directory(&self, rng: &SharedRng) -> Arc<dyn UserDirectory> {
        Arc::new(SimulatedUserDirectory::new(Arc::clone(&self.users), self.latency(rng)))
    }

    pub fn catalog(&self, rng: &SharedRng) -> Arc<dyn FlightCatalog> {
        Arc::new(SimulatedFlightCatalog::new(Arc::clone(&self.flights), self.latency(rng)))
    }

    pub fn geolocator(&self) -> FixedGeolocator {
        FixedGeolocator::new(self.location, self.scheduler(), GEOLOCATION_DELAY)
    }

    /// Service over the fixture's collaborators
    pub fn service(&self) -> BookingService {
        self.service_with(|_, directory| directory, Arc::new(self.geolocator()))
    }

    /// Service with a wrapped directory and a custom geolocator
    pub fn service_with(
        &self,
        wrap_directory: impl FnOnce(&Self, Arc<dyn UserDirectory>) -> Arc<dyn UserDirectory>,
        geolocator: Arc<dyn Geolocator>,
    ) -> BookingService {
        let rng = SharedRng::seeded(self.seed);
        let directory = wrap_directory(self, self.directory(&rng));
        let agencies = AgencyPool::standard(&self.catalog(&rng), self.policy);
        BookingService::new(directory, geolocator, agencies, rng, self.scheduler())
    }
}

/// Seed user ids plus the unknown one
pub fn seed_ids_with_unknown() -> Vec<UserId> {
    let mut ids = data::user_ids();
    ids.push(data::UNKNOWN_USER);
    ids
}

/// Geolocator that counts how many lookups ran to completion
pub struct CountingGeolocator {
    inner: FixedGeolocator,
    pub completed: Arc<AtomicUsize>,
}

impl CountingGeolocator {
    pub fn new(inner: FixedGeolocator) -> Self {
        Self {
            inner,
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geolocator for CountingGeolocator {
    async fn locate(&self) -> Result<GeoLocation> {
        let location = self.inner.locate().await?;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(location)
    }
}

/// Directory that faults for one id and delegates every other lookup
pub struct FlakyDirectory {
    pub inner: Arc<dyn UserDirectory>,
    pub faulty: UserId,
}

#[async_trait]
impl UserDirectory for FlakyDirectory {
    fn all_users(&self) -> BoxStream<'static, Result<User>> {
        self.inner.all_users()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        if id == self.faulty {
            return Err(BookingError::transient("directory connection reset"));
        }
        self.inner.find_by_id(id).await
    }
}

/// Flights departing London only: BA111 and FR789
pub fn two_london_flights() -> Vec<Flight> {
    vec![
        Flight::new("BA111", "British Airways", GeoLocation::London, GeoLocation::NewYork),
        Flight::new("FR789", "Air France", GeoLocation::London, GeoLocation::Paris),
    ]
}
