use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;

use catalog_cell::router::catalog_routes;
use catalog_cell::services::catalog::CatalogService;
use patient_cell::router::patient_routes;
use patient_cell::services::patient::PatientService;
use scheduling_cell::router::scheduling_routes;
use scheduling_cell::services::booking::AppointmentBookingService;

pub fn create_router(
    booking: Arc<AppointmentBookingService>,
    catalog: Arc<CatalogService>,
    patients: Arc<PatientService>,
) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/appointments", scheduling_routes(booking))
        .nest("/api/catalog", catalog_routes(catalog))
        .nest("/api/patients", patient_routes(patients))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "ayursutra-api"
    }))
}
