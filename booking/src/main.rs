//! Airfare booking driver.
//!
//! Books a random ticket for each seed user plus one unknown user, waits for
//! the batch (or its budget), then prints the tickets and the failures.
//!
//! Configuration comes from `AIRFARE_*` environment variables, with a `.env`
//! file in the working directory loaded first when present; see
//! [`BookingConfig::from_env`].

use airfare_booking::config::{BookingConfig, OutputFormat};
use airfare_booking::data;
use airfare_booking::desk::BookingFailure;
use airfare_booking::{
    BookingAction, BookingEnvironment, BookingReducer, BookingService, BookingState, Ticket,
};
use airfare_runtime::metrics::MetricsRecorder;
use airfare_runtime::{Store, SystemClock, TokioScheduler};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// What the driver prints at the end of a run
#[derive(Debug, Serialize)]
struct Report {
    tickets: Vec<Ticket>,
    failures: Vec<BookingFailure>,
    budget_elapsed: bool,
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("airfare={level},airfare_booking={level},airfare_runtime=warn").into()),
        )
        .with(
            fmt::layer()
                .with_timer(fmt::time::uptime())
                .with_thread_names(true)
                .with_target(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let config = BookingConfig::from_env().context("loading configuration")?;
    init_tracing(&config.log_level);

    let mut recorder = MetricsRecorder::new();
    if config.metrics_enabled {
        recorder.install().context("installing metrics recorder")?;
    }

    info!(
        budget = ?config.budget,
        max_latency = ?config.max_latency,
        seed = ?config.seed,
        policy = ?config.candidate_policy,
        "Configuration loaded"
    );

    let user_ids = config.user_ids.clone().unwrap_or_else(|| {
        let mut ids = data::user_ids();
        ids.push(data::UNKNOWN_USER);
        ids
    });

    let service = BookingService::simulated(&config, Arc::new(TokioScheduler));
    let environment = BookingEnvironment::new(service, Arc::new(SystemClock), Some(config.budget));
    let store = Store::new(BookingState::default(), BookingReducer::new(), environment);

    let mut actions = store.subscribe_actions();
    let observer = tokio::spawn(async move {
        loop {
            match actions.recv().await {
                Ok(BookingAction::TicketIssued { ticket, .. }) => {
                    info!("Received: for {}", ticket.for_name);
                },
                Ok(_) => {},
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Observer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut batch = store
        .send(BookingAction::BookAll { user_ids })
        .await
        .context("submitting bookings")?;
    batch.wait().await;
    info!("Batch completed");

    let report = store
        .state(|state| Report {
            tickets: state.tickets.clone(),
            failures: state.failures.clone(),
            budget_elapsed: state.budget_elapsed,
        })
        .await;

    if let Err(error) = store.shutdown(Duration::from_secs(1)).await {
        warn!(%error, "Store did not shut down cleanly");
    }
    observer.abort();

    match config.output {
        OutputFormat::Text => print_text(&report),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report).context("rendering report")?);
        },
    }

    if let Some(metrics) = recorder.render() {
        println!("\n{metrics}");
    }

    Ok(())
}

fn print_text(report: &Report) {
    println!("\nTickets:");
    for ticket in &report.tickets {
        println!("{ticket}\n");
    }

    if !report.failures.is_empty() {
        println!("Failures:");
        for failure in &report.failures {
            println!(
                "{} {}: {} ({})",
                failure.request_id,
                failure.user_id,
                failure.error.reason(),
                failure.error
            );
        }
    }

    if report.budget_elapsed {
        println!("\nBudget elapsed before every booking finished.");
    }
}
