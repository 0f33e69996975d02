// libs/patient-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::patient::PatientService;

pub fn patient_routes(patients: Arc<PatientService>) -> Router {
    Router::new()
        .route("/", post(handlers::register_patient))
        .route("/", get(handlers::list_patients))
        .route("/{patient_id}", get(handlers::get_patient))
        .with_state(patients)
}
