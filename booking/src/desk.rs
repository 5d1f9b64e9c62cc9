//! Booking desk: the booking pipeline as a reducer feature.
//!
//! The desk accepts booking requests, runs one pipeline per request as an
//! effect, and keeps a ledger of issued tickets (arrival order) and failures
//! (with reasons). A per-batch time budget cancels whatever is still running.
//!
//! ## Cancellation groups
//!
//! - `bookings`: every running pipeline
//! - `budget`: the budget timer, cancelled as soon as nothing is pending

use crate::error::BookingError;
use crate::service::BookingService;
use crate::types::{Ticket, UserId};
use airfare_core::effect::{Effect, EffectId};
use airfare_core::environment::Clock;
use airfare_core::reducer::Reducer;
use airfare_core::{DateTime, SmallVec, Utc, smallvec};
use airfare_runtime::metrics::DeskMetrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Cancellation group of the running pipelines
pub const BOOKINGS_GROUP: &str = "bookings";

/// Cancellation group of the budget timer
pub const BUDGET_GROUP: &str = "budget";

/// Identifier the desk assigns to each request
///
/// Monotonically increasing, so two requests for the same user in one batch
/// are tracked independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    /// Create a `RequestId` from its number
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the inner number
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request that produced no ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFailure {
    /// Which request failed
    pub request_id: RequestId,
    /// Who it was for
    pub user_id: UserId,
    /// Why it failed
    pub error: BookingError,
    /// When the desk recorded the failure
    pub at: DateTime<Utc>,
}

/// Booking desk state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingState {
    /// Next request id to assign
    pub next_request: u64,
    /// Requests still running
    pub pending: BTreeMap<RequestId, UserId>,
    /// Issued tickets, in arrival order
    pub tickets: Vec<Ticket>,
    /// Failed requests, in arrival order
    pub failures: Vec<BookingFailure>,
    /// Whether the budget of the latest batch elapsed
    pub budget_elapsed: bool,
}

impl BookingState {
    /// Whether every request has resolved
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    fn register(&mut self, user_id: UserId) -> RequestId {
        let request_id = RequestId(self.next_request);
        self.next_request += 1;
        self.pending.insert(request_id, user_id);
        request_id
    }
}

/// Booking desk actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingAction {
    /// Book a ticket for each user, concurrently
    BookAll {
        /// Users to book for; duplicates are booked twice
        user_ids: Vec<UserId>,
    },
    /// Book a ticket for one user
    Book {
        /// User to book for
        user_id: UserId,
    },
    /// A pipeline issued a ticket
    TicketIssued {
        /// Request the ticket answers
        request_id: RequestId,
        /// The ticket
        ticket: Ticket,
    },
    /// A pipeline produced no ticket
    BookingFailed {
        /// Request that failed
        request_id: RequestId,
        /// Who it was for
        user_id: UserId,
        /// Why it failed
        error: BookingError,
    },
    /// The batch budget elapsed
    BudgetElapsed,
}

/// Booking desk environment
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Runs the pipelines
    pub service: BookingService,
    /// Timestamps failures
    pub clock: Arc<dyn Clock>,
    /// Per-batch budget; `None` lets a batch run to completion
    pub budget: Option<Duration>,
}

impl BookingEnvironment {
    /// Create a new booking environment
    #[must_use]
    pub fn new(service: BookingService, clock: Arc<dyn Clock>, budget: Option<Duration>) -> Self {
        Self {
            service,
            clock,
            budget,
        }
    }
}

/// Booking desk reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Create a new booking desk reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn book_all(
        state: &mut BookingState,
        user_ids: Vec<UserId>,
        env: &BookingEnvironment,
    ) -> SmallVec<[Effect<BookingAction>; 4]> {
        if user_ids.is_empty() {
            return SmallVec::new();
        }

        let bookings: Vec<_> = user_ids
            .into_iter()
            .map(|user_id| {
                let request_id = state.register(user_id);
                let service = env.service.clone();
                Effect::Future(Box::pin(async move {
                    let action = match service.book_random_ticket_for(user_id).await {
                        Ok(ticket) => BookingAction::TicketIssued { request_id, ticket },
                        Err(error) => BookingAction::BookingFailed {
                            request_id,
                            user_id,
                            error,
                        },
                    };
                    Some(action)
                }))
            })
            .collect();

        tracing::info!(requests = bookings.len(), pending = state.pending.len(), "Batch accepted");
        state.budget_elapsed = false;

        let mut effects: SmallVec<[Effect<BookingAction>; 4]> =
            smallvec![Effect::merge(bookings).cancellable(EffectId::new(BOOKINGS_GROUP))];

        if let Some(budget) = env.budget {
            // The newest batch owns the budget timer
            effects.push(Effect::Cancel(EffectId::new(BUDGET_GROUP)));
            effects.push(
                Effect::Delay {
                    duration: budget,
                    action: Box::new(BookingAction::BudgetElapsed),
                }
                .cancellable(EffectId::new(BUDGET_GROUP)),
            );
        }

        effects
    }

    /// Effects once a request has resolved
    fn settled(state: &BookingState) -> SmallVec<[Effect<BookingAction>; 4]> {
        if state.is_settled() {
            tracing::info!(
                tickets = state.tickets.len(),
                failures = state.failures.len(),
                "All requests resolved"
            );
            smallvec![Effect::Cancel(EffectId::new(BUDGET_GROUP))]
        } else {
            SmallVec::new()
        }
    }
}

impl Reducer for BookingReducer {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            BookingAction::BookAll { user_ids } => Self::book_all(state, user_ids, env),
            BookingAction::Book { user_id } => Self::book_all(state, vec![user_id], env),

            BookingAction::TicketIssued { request_id, ticket } => {
                if state.pending.remove(&request_id).is_none() {
                    tracing::debug!(%request_id, "Late ticket ignored");
                    DeskMetrics::record_late_arrival();
                    return SmallVec::new();
                }
                tracing::debug!(%request_id, for_name = %ticket.for_name, "Ticket received");
                state.tickets.push(ticket);
                Self::settled(state)
            },

            BookingAction::BookingFailed {
                request_id,
                user_id,
                error,
            } => {
                if state.pending.remove(&request_id).is_none() {
                    tracing::debug!(%request_id, "Late failure ignored");
                    DeskMetrics::record_late_arrival();
                    return SmallVec::new();
                }
                tracing::debug!(%request_id, %user_id, reason = error.reason(), "Booking failed");
                state.failures.push(BookingFailure {
                    request_id,
                    user_id,
                    error,
                    at: env.clock.now(),
                });
                Self::settled(state)
            },

            BookingAction::BudgetElapsed => {
                if state.is_settled() {
                    return SmallVec::new();
                }

                let at = env.clock.now();
                let cancelled = std::mem::take(&mut state.pending);
                tracing::warn!(cancelled = cancelled.len(), "Budget elapsed, cancelling outstanding bookings");
                DeskMetrics::record_budget_elapsed(cancelled.len());

                state.failures.extend(cancelled.into_iter().map(|(request_id, user_id)| {
                    BookingFailure {
                        request_id,
                        user_id,
                        error: BookingError::Cancelled,
                        at,
                    }
                }));
                state.budget_elapsed = true;

                smallvec![Effect::Cancel(EffectId::new(BOOKINGS_GROUP))]
            },
        }
    }
}
