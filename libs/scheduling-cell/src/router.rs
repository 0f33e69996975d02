// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers;
use crate::services::booking::AppointmentBookingService;

pub fn scheduling_routes(booking: Arc<AppointmentBookingService>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route(
            "/{appointment_id}/reschedule",
            patch(handlers::reschedule_appointment),
        )
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route(
            "/{appointment_id}/complete",
            post(handlers::complete_appointment),
        )
        .route(
            "/therapists/{therapist_id}",
            get(handlers::get_therapist_schedule),
        )
        .with_state(booking)
}
