//! Booking fan-out benchmarks
//!
//! Simulated latency is switched off (instant scheduler), so these measure
//! the pipeline machinery itself:
//! - One booking end to end
//! - A batch through `book_all_outcomes` (task spawn + channel)
//! - A batch through the booking desk `Store`
//! - The desk reducer alone
//!
//! Run with: `cargo bench -p airfare-booking`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::expect_used)] // Benchmarks can use expect for setup

use airfare_booking::agency::{AgencyPool, CandidatePolicy};
use airfare_booking::desk::RequestId;
use airfare_booking::directory::{FlightCatalog, SimulatedFlightCatalog, SimulatedUserDirectory};
use airfare_booking::geolocator::FixedGeolocator;
use airfare_booking::latency::SimulatedLatency;
use airfare_booking::random::SharedRng;
use airfare_booking::{
    BookingAction, BookingEnvironment, BookingReducer, BookingService, BookingState, GeoLocation, Ticket,
    UserId, data,
};
use airfare_core::environment::Scheduler;
use airfare_core::reducer::Reducer;
use airfare_runtime::Store;
use airfare_testing::{TestScheduler, test_clock};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

fn instant_service(policy: CandidatePolicy) -> BookingService {
    let scheduler: Arc<dyn Scheduler> = Arc::new(TestScheduler::instant());
    let rng = SharedRng::seeded(42);
    let latency = SimulatedLatency::new(Arc::clone(&scheduler), Duration::from_millis(2000), rng.clone());

    let directory = Arc::new(SimulatedUserDirectory::new(data::users(), latency.clone()));
    let catalog: Arc<dyn FlightCatalog> = Arc::new(SimulatedFlightCatalog::new(data::flights(), latency));
    let geolocator = Arc::new(FixedGeolocator::new(
        GeoLocation::London,
        Arc::clone(&scheduler),
        Duration::from_millis(3000),
    ));

    BookingService::new(
        directory,
        geolocator,
        AgencyPool::standard(&catalog, policy),
        rng,
        scheduler,
    )
}

/// Batch of `size` ids cycling through the seed users
fn batch(size: usize) -> Vec<UserId> {
    data::user_ids().into_iter().cycle().take(size).collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
}

/// One booking, both candidate policies
fn benchmark_single_booking(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_booking");
    group.throughput(Throughput::Elements(1));
    let runtime = runtime();
    let bob = data::user_ids()[0];

    for policy in [CandidatePolicy::KeepDuplicates, CandidatePolicy::Deduplicate] {
        let service = instant_service(policy);
        group.bench_function(BenchmarkId::from_parameter(format!("{policy:?}")), |b| {
            b.to_async(&runtime).iter(|| async {
                let _ticket = service.book_random_ticket_for(black_box(bob)).await;
            });
        });
    }

    group.finish();
}

/// Concurrent batches of growing size
fn benchmark_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("fanout");
    let runtime = runtime();
    let service = instant_service(CandidatePolicy::KeepDuplicates);

    for size in [1_usize, 10, 100] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.to_async(&runtime).iter(|| async {
                let outcomes: Vec<_> = service.book_all_outcomes(batch(size)).collect().await;
                black_box(outcomes);
            });
        });
    }

    group.finish();
}

/// A batch through the booking desk store, budget armed
fn benchmark_desk_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("desk_store");
    let runtime = runtime();

    for size in [10_usize, 100] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let environment = BookingEnvironment::new(
                instant_service(CandidatePolicy::KeepDuplicates),
                Arc::new(test_clock()),
                Some(Duration::from_secs(10)),
            );
            let store = runtime.block_on(async {
                Store::new(BookingState::default(), BookingReducer::new(), environment)
            });

            b.to_async(&runtime).iter(|| async {
                let mut handle = store
                    .send(black_box(BookingAction::BookAll { user_ids: batch(size) }))
                    .await
                    .expect("store accepts bookings");
                handle.wait().await;
            });
        });
    }

    group.finish();
}

/// The desk reducer in isolation (no Store overhead)
fn benchmark_desk_reducer(c: &mut Criterion) {
    let mut group = c.benchmark_group("desk_reducer");
    group.throughput(Throughput::Elements(1));

    let reducer = BookingReducer::new();
    let env = BookingEnvironment::new(
        instant_service(CandidatePolicy::KeepDuplicates),
        Arc::new(test_clock()),
        Some(Duration::from_secs(10)),
    );
    let users = data::users();
    let flights = data::flights();
    let ticket = Ticket::issue(&users[0], &flights[0]);

    group.bench_function("book_all_10", |b| {
        b.iter(|| {
            let mut state = BookingState::default();
            let _effects = reducer.reduce(
                &mut state,
                black_box(BookingAction::BookAll { user_ids: batch(10) }),
                &env,
            );
        });
    });

    group.bench_function("ticket_issued", |b| {
        b.iter(|| {
            let mut state = BookingState::default();
            state.pending.insert(RequestId::new(0), users[0].id);
            let _effects = reducer.reduce(
                &mut state,
                black_box(BookingAction::TicketIssued {
                    request_id: RequestId::new(0),
                    ticket: ticket.clone(),
                }),
                &env,
            );
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_single_booking,
    benchmark_fanout,
    benchmark_desk_store,
    benchmark_desk_reducer
);
criterion_main!(benches);
