//! Travel agencies and the pool that searches them concurrently.

use crate::directory::FlightCatalog;
use crate::error::Result;
use crate::types::{Flight, GeoLocation, User};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt, future};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Display names of the standard agencies
pub const STANDARD_AGENCIES: [&str; 3] = [
    "First Travel Agency",
    "Second Travel Agency",
    "Third Travel Agency",
];

/// Something that can be searched for flights
pub trait TravelAgency: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Flights departing `location`, in no particular order
    ///
    /// `user` is accepted for future personalisation; it does not filter.
    fn search(&self, user: &User, location: GeoLocation) -> BoxStream<'static, Result<Flight>>;
}

/// Agency backed by the shared flight catalog
#[derive(Clone)]
pub struct CatalogAgency {
    name: String,
    catalog: Arc<dyn FlightCatalog>,
}

impl CatalogAgency {
    /// Creates an agency named `name` over `catalog`
    #[must_use]
    pub fn new(name: impl Into<String>, catalog: Arc<dyn FlightCatalog>) -> Self {
        Self {
            name: name.into(),
            catalog,
        }
    }
}

impl TravelAgency for CatalogAgency {
    fn name(&self) -> &str {
        &self.name
    }

    fn search(&self, _user: &User, location: GeoLocation) -> BoxStream<'static, Result<Flight>> {
        self.catalog
            .all_flights()
            .try_filter(move |flight| future::ready(flight.depart == location))
            .boxed()
    }
}

/// How the pooled search results are turned into candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePolicy {
    /// Keep one entry per agency result
    ///
    /// A flight offered by several agencies is proportionally more likely to
    /// be picked.
    #[default]
    KeepDuplicates,
    /// Keep one entry per flight id
    Deduplicate,
}

/// The fixed set of agencies a booking searches
#[derive(Clone)]
pub struct AgencyPool {
    agencies: Vec<Arc<dyn TravelAgency>>,
    policy: CandidatePolicy,
}

impl AgencyPool {
    /// Creates a pool over `agencies`
    #[must_use]
    pub fn new(agencies: Vec<Arc<dyn TravelAgency>>, policy: CandidatePolicy) -> Self {
        Self { agencies, policy }
    }

    /// The three standard agencies, all searching `catalog`
    #[must_use]
    pub fn standard(catalog: &Arc<dyn FlightCatalog>, policy: CandidatePolicy) -> Self {
        let agencies = STANDARD_AGENCIES
            .iter()
            .map(|name| Arc::new(CatalogAgency::new(*name, Arc::clone(catalog))) as Arc<dyn TravelAgency>)
            .collect();
        Self::new(agencies, policy)
    }

    /// Number of agencies in the pool
    #[must_use]
    pub fn len(&self) -> usize {
        self.agencies.len()
    }

    /// Whether the pool has no agencies
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agencies.is_empty()
    }

    /// Candidate policy of the pool
    #[must_use]
    pub const fn policy(&self) -> CandidatePolicy {
        self.policy
    }

    /// Search every agency concurrently and pool the results
    ///
    /// # Errors
    ///
    /// Fails as soon as any agency fails; the other searches are dropped.
    pub async fn search_all(&self, user: &User, location: GeoLocation) -> Result<Vec<Flight>> {
        let searches = self.agencies.iter().map(|agency| {
            let name = agency.name().to_string();
            let search = agency.search(user, location).try_collect::<Vec<_>>();
            async move {
                let flights = search.await?;
                tracing::debug!(agency = %name, found = flights.len(), "Agency search complete");
                Ok::<_, crate::error::BookingError>(flights)
            }
        });

        let mut candidates: Vec<Flight> = future::try_join_all(searches)
            .await?
            .into_iter()
            .flatten()
            .collect();

        if self.policy == CandidatePolicy::Deduplicate {
            candidates.sort();
            candidates.dedup_by(|a, b| a.id == b.id);
        }

        Ok(candidates)
    }
}
