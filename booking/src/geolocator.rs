//! Geolocation of the current user.

use crate::error::Result;
use crate::random::SharedRng;
use crate::types::GeoLocation;
use airfare_core::environment::Scheduler;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Default delay before a location is reported
pub const DEFAULT_GEOLOCATION_DELAY: Duration = Duration::from_millis(3000);

/// Resolves the location a booking departs from
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// The current location
    async fn locate(&self) -> Result<GeoLocation>;
}

/// Picks one of the four locations uniformly, after a fixed delay
#[derive(Clone)]
pub struct RandomGeolocator {
    scheduler: Arc<dyn Scheduler>,
    delay: Duration,
    rng: SharedRng,
}

impl RandomGeolocator {
    /// Creates a geolocator that answers after `delay`
    #[must_use]
    pub fn new(scheduler: Arc<dyn Scheduler>, delay: Duration, rng: SharedRng) -> Self {
        Self {
            scheduler,
            delay,
            rng,
        }
    }
}

#[async_trait]
impl Geolocator for RandomGeolocator {
    async fn locate(&self) -> Result<GeoLocation> {
        let location = self
            .rng
            .index(GeoLocation::ALL.len())
            .and_then(|i| GeoLocation::ALL.get(i).copied())
            .unwrap_or(GeoLocation::London);

        tracing::debug!(source = "geolocator", "GeoLocating: start");
        self.scheduler.sleep(self.delay).await;
        tracing::debug!(source = "geolocator", %location, "GeoLocating: finish");

        Ok(location)
    }
}

/// Always reports the same location
///
/// Used for pinned runs and deterministic tests.
#[derive(Clone)]
pub struct FixedGeolocator {
    location: GeoLocation,
    scheduler: Arc<dyn Scheduler>,
    delay: Duration,
}

impl FixedGeolocator {
    /// Creates a geolocator that reports `location` after `delay`
    #[must_use]
    pub fn new(location: GeoLocation, scheduler: Arc<dyn Scheduler>, delay: Duration) -> Self {
        Self {
            location,
            scheduler,
            delay,
        }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<GeoLocation> {
        self.scheduler.sleep(self.delay).await;
        tracing::debug!(source = "geolocator", location = %self.location, "GeoLocating: fixed");
        Ok(self.location)
    }
}
