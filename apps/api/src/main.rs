use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use catalog_cell::services::catalog::CatalogService;
use patient_cell::services::patient::PatientService;
use scheduling_cell::services::booking::AppointmentBookingService;
use scheduling_cell::services::ledger::{AppointmentLedger, InMemoryLedger};
use scheduling_cell::services::lifecycle::CompletedEventBus;
use shared_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AyurSutra scheduling API server");

    let config = AppConfig::from_env();

    // Wire up the collaborators; the booking engine receives them by
    // constructor injection, no process-wide singletons.
    let catalog = Arc::new(CatalogService::new());
    if config.seed_catalog {
        catalog
            .seed_defaults()
            .await
            .context("failed to seed therapy catalog")?;
    }
    let patients = Arc::new(PatientService::new());
    let ledger: Arc<dyn AppointmentLedger> = Arc::new(InMemoryLedger::new());
    let events = Arc::new(CompletedEventBus::new(config.completed_event_capacity));
    let booking = Arc::new(AppointmentBookingService::new(
        Arc::clone(&ledger),
        Arc::clone(&catalog),
        Arc::clone(&patients),
        Arc::clone(&events),
    ));

    // Stand-in subscriber for the downstream collaborators (progress
    // notes, billing, inventory decrement) that react to completions.
    let mut completions = events.subscribe();
    tokio::spawn(async move {
        loop {
            match completions.recv().await {
                Ok(event) => info!(
                    "Appointment {} completed for patient {} (therapy {})",
                    event.appointment_id, event.patient_id, event.therapy_id
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Completion subscriber lagged, skipped {} events", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(booking, catalog, patients)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    info!("Listening on {}", config.bind_addr);
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .context("failed to bind listen address")?;
    axum::serve(listener, app)
        .await
        .context("server terminated unexpectedly")?;

    Ok(())
}
