//! Integration tests for the booking desk.
//!
//! The first half drives the reducer directly; the second half runs it in a
//! `Store` on tokio's paused clock.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use airfare_booking::data;
use airfare_booking::desk::{BOOKINGS_GROUP, BUDGET_GROUP, RequestId};
use airfare_booking::{
    BookingAction, BookingEnvironment, BookingError, BookingReducer, BookingService, BookingState,
    GeoLocation, Ticket, UserId,
};
use airfare_core::environment::Clock;
use airfare_runtime::Store;
use airfare_testing::{ReducerTest, assertions, test_clock};
use common::{CountingGeolocator, Fixture, FlakyDirectory, GEOLOCATION_DELAY};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const BUDGET: Duration = Duration::from_secs(10);

fn environment(service: BookingService, budget: Option<Duration>) -> BookingEnvironment {
    BookingEnvironment::new(service, Arc::new(test_clock()), budget)
}

fn desk_environment() -> BookingEnvironment {
    environment(Fixture::new(GeoLocation::London).service(), Some(BUDGET))
}

fn ticket_for_bob() -> Ticket {
    let users = data::users();
    let flights = data::flights();
    Ticket::issue(&users[0], &flights[0])
}

/// State with `count` requests for Bob still running
fn pending_state(count: u64) -> BookingState {
    let bob = data::user_ids()[0];
    BookingState {
        next_request: count,
        pending: (0..count).map(|n| (RequestId::new(n), bob)).collect::<BTreeMap<_, _>>(),
        ..BookingState::default()
    }
}

// Reducer

#[test]
fn test_book_all_starts_one_pipeline_per_id() {
    ReducerTest::new(BookingReducer::new())
        .with_env(desk_environment())
        .given_state(BookingState::default())
        .when_action(BookingAction::BookAll {
            user_ids: common::seed_ids_with_unknown(),
        })
        .then_state(|state| {
            assert_eq!(state.pending.len(), 6);
            assert_eq!(state.next_request, 6);
            assert!(!state.budget_elapsed);
        })
        .then_effects(|effects| {
            assertions::assert_has_cancellable(effects, BOOKINGS_GROUP);
            assertions::assert_has_cancellable(effects, BUDGET_GROUP);
            assertions::assert_has_cancel_effect(effects, BUDGET_GROUP);
            assertions::assert_has_future_effect(effects);
            assertions::assert_has_delay_effect(effects);
            assert_eq!(assertions::count_future_effects(effects), 6);
        })
        .run();
}

#[test]
fn test_book_all_with_no_ids_does_nothing() {
    ReducerTest::new(BookingReducer::new())
        .with_env(desk_environment())
        .given_state(BookingState::default())
        .when_action(BookingAction::BookAll { user_ids: vec![] })
        .then_state(|state| {
            assert!(state.is_settled());
            assert_eq!(state.next_request, 0);
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_book_without_budget_arms_no_timer() {
    let env = environment(Fixture::new(GeoLocation::Paris).service(), None);

    ReducerTest::new(BookingReducer::new())
        .with_env(env)
        .given_state(BookingState::default())
        .when_action(BookingAction::Book {
            user_id: data::user_ids()[2],
        })
        .then_state(|state| {
            assert_eq!(state.pending.len(), 1);
        })
        .then_effects(|effects| {
            assertions::assert_effects_count(effects, 1);
            assertions::assert_has_cancellable(effects, BOOKINGS_GROUP);
        })
        .run();
}

#[test]
fn test_duplicate_ids_get_distinct_requests() {
    let bob = data::user_ids()[0];

    ReducerTest::new(BookingReducer::new())
        .with_env(desk_environment())
        .given_state(BookingState::default())
        .when_action(BookingAction::BookAll {
            user_ids: vec![bob, bob],
        })
        .then_state(move |state| {
            let requests: Vec<_> = state.pending.iter().map(|(id, user)| (id.value(), *user)).collect();
            assert_eq!(requests, vec![(0, bob), (1, bob)]);
        })
        .run();
}

#[test]
fn test_ticket_is_recorded_while_others_run() {
    ReducerTest::new(BookingReducer::new())
        .with_env(desk_environment())
        .given_state(pending_state(2))
        .when_action(BookingAction::TicketIssued {
            request_id: RequestId::new(0),
            ticket: ticket_for_bob(),
        })
        .then_state(|state| {
            assert_eq!(state.tickets, vec![ticket_for_bob()]);
            assert_eq!(state.pending.len(), 1);
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_last_resolution_cancels_the_budget_timer() {
    ReducerTest::new(BookingReducer::new())
        .with_env(desk_environment())
        .given_state(pending_state(1))
        .when_action(BookingAction::TicketIssued {
            request_id: RequestId::new(0),
            ticket: ticket_for_bob(),
        })
        .then_state(|state| {
            assert!(state.is_settled());
        })
        .then_effects(|effects| {
            assertions::assert_effects_count(effects, 1);
            assertions::assert_has_cancel_effect(effects, BUDGET_GROUP);
        })
        .run();
}

#[test]
fn test_failure_is_recorded_with_reason_and_time() {
    let unknown = data::UNKNOWN_USER;

    ReducerTest::new(BookingReducer::new())
        .with_env(desk_environment())
        .given_state(pending_state(2))
        .when_action(BookingAction::BookingFailed {
            request_id: RequestId::new(1),
            user_id: unknown,
            error: BookingError::NotFound { user_id: unknown },
        })
        .then_state(move |state| {
            assert_eq!(state.failures.len(), 1);
            let failure = &state.failures[0];
            assert_eq!(failure.request_id, RequestId::new(1));
            assert_eq!(failure.error.reason(), "not_found");
            assert_eq!(failure.at, test_clock().now());
            assert!(state.tickets.is_empty());
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_late_ticket_is_ignored() {
    ReducerTest::new(BookingReducer::new())
        .with_env(desk_environment())
        .given_state(pending_state(1))
        .when_action(BookingAction::TicketIssued {
            request_id: RequestId::new(7),
            ticket: ticket_for_bob(),
        })
        .then_state(|state| {
            assert!(state.tickets.is_empty());
            assert_eq!(state.pending.len(), 1);
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_budget_cancels_every_pending_request() {
    ReducerTest::new(BookingReducer::new())
        .with_env(desk_environment())
        .given_state(pending_state(3))
        .when_action(BookingAction::BudgetElapsed)
        .then_state(|state| {
            assert!(state.is_settled());
            assert!(state.budget_elapsed);
            assert_eq!(state.failures.len(), 3);
            assert!(
                state
                    .failures
                    .iter()
                    .all(|failure| failure.error == BookingError::Cancelled)
            );
        })
        .then_effects(|effects| {
            assertions::assert_effects_count(effects, 1);
            assertions::assert_has_cancel_effect(effects, BOOKINGS_GROUP);
        })
        .run();
}

#[test]
fn test_budget_after_settling_is_a_no_op() {
    ReducerTest::new(BookingReducer::new())
        .with_env(desk_environment())
        .given_state(BookingState::default())
        .when_action(BookingAction::BudgetElapsed)
        .then_state(|state| {
            assert!(!state.budget_elapsed);
            assert!(state.failures.is_empty());
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

// Store

#[tokio::test(start_paused = true)]
async fn test_batch_settles_before_the_budget() {
    let store = Store::new(BookingState::default(), BookingReducer::new(), desk_environment());
    let started = Instant::now();

    let mut handle = store
        .send(BookingAction::BookAll {
            user_ids: common::seed_ids_with_unknown(),
        })
        .await
        .unwrap();
    handle.wait().await;

    assert!(started.elapsed() < BUDGET);
    let (tickets, failures, settled, budget_elapsed) = store
        .state(|s| (s.tickets.len(), s.failures.clone(), s.is_settled(), s.budget_elapsed))
        .await;
    assert_eq!(tickets, 5);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].user_id, data::UNKNOWN_USER);
    assert!(settled);
    assert!(!budget_elapsed);
    assert_eq!(store.pending_effects(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_budget_turns_running_bookings_into_cancellations() {
    let fixture = Fixture::new(GeoLocation::London);
    let geolocator = Arc::new(CountingGeolocator::new(fixture.geolocator()));
    let service = fixture.service_with(|_, directory| directory, geolocator.clone());
    let env = environment(service, Some(Duration::from_secs(1)));
    let store = Store::new(BookingState::default(), BookingReducer::new(), env);

    let mut handle = store
        .send(BookingAction::BookAll {
            user_ids: data::user_ids(),
        })
        .await
        .unwrap();
    handle.wait().await;

    let state = store.state(Clone::clone).await;
    assert!(state.budget_elapsed);
    assert!(state.tickets.is_empty());
    assert_eq!(state.failures.len(), 5);
    assert!(
        state
            .failures
            .iter()
            .all(|failure| failure.error == BookingError::Cancelled)
    );

    // Nothing arrives late: the pipelines were cancelled, not abandoned
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(geolocator.completed(), 0);
    assert!(store.state(|s| s.tickets.is_empty()).await);
}

#[tokio::test(start_paused = true)]
async fn test_batch_overlapping_a_settling_one_keeps_its_budget() {
    let fixture = Fixture::new(GeoLocation::London);
    let ids = data::user_ids();
    let (bob, sally) = (ids[0], ids[1]);
    let service = fixture.service_with(
        |_, inner| Arc::new(FlakyDirectory { inner, faulty: sally }),
        Arc::new(fixture.geolocator()),
    );
    let env = environment(service, Some(Duration::from_secs(1)));
    let store = Store::new(BookingState::default(), BookingReducer::new(), env);
    let started = Instant::now();

    // Sally's booking fails at once and settles its batch while Bob's is submitted
    let mut first = store.send(BookingAction::Book { user_id: sally }).await.unwrap();
    let ((), second) = tokio::join!(first.wait(), store.send(BookingAction::Book { user_id: bob }));
    second.unwrap().wait().await;

    assert!(started.elapsed() < GEOLOCATION_DELAY);
    let state = store.state(Clone::clone).await;
    assert!(state.is_settled());
    assert!(state.budget_elapsed);
    assert!(state.tickets.is_empty());
    let reasons: Vec<_> = state
        .failures
        .iter()
        .map(|failure| (failure.user_id, failure.error.reason()))
        .collect();
    assert_eq!(reasons, vec![(sally, "transient_fault"), (bob, "cancelled")]);
}

#[tokio::test(start_paused = true)]
async fn test_observer_sees_issued_tickets() {
    let store = Store::new(BookingState::default(), BookingReducer::new(), desk_environment());

    let action = store
        .send_and_wait_for(
            BookingAction::Book {
                user_id: data::user_ids()[3],
            },
            |action| matches!(action, BookingAction::TicketIssued { .. }),
            BUDGET,
        )
        .await
        .unwrap();

    let BookingAction::TicketIssued { request_id, ticket } = action else {
        panic!("expected a ticket, got {action:?}");
    };
    assert_eq!(request_id, RequestId::new(0));
    assert_eq!(ticket.for_name, "Alice Smith");
    assert_eq!(ticket.departing, GeoLocation::London);
}

#[tokio::test(start_paused = true)]
async fn test_batches_accumulate_in_the_ledger() {
    let store = Store::new(BookingState::default(), BookingReducer::new(), desk_environment());
    let bob: UserId = data::user_ids()[0];

    for _ in 0..2 {
        let mut handle = store.send(BookingAction::Book { user_id: bob }).await.unwrap();
        handle.wait().await;
    }

    let (tickets, next_request) = store.state(|s| (s.tickets.len(), s.next_request)).await;
    assert_eq!(tickets, 2);
    assert_eq!(next_request, 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_after_batch_is_clean() {
    let store = Store::new(BookingState::default(), BookingReducer::new(), desk_environment());

    let mut handle = store
        .send(BookingAction::BookAll {
            user_ids: data::user_ids(),
        })
        .await
        .unwrap();
    handle.wait().await;

    store.shutdown(Duration::from_secs(1)).await.unwrap();
    assert!(
        store
            .send(BookingAction::Book {
                user_id: data::user_ids()[0]
            })
            .await
            .is_err()
    );
}
