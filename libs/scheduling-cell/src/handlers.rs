// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    BookAppointmentRequest, RescheduleRequest, ScheduleQuery, SchedulingError,
};
use crate::services::booking::AppointmentBookingService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct ScheduleRangeParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

// ==============================================================================
// ERROR MAPPING
// ==============================================================================

fn map_scheduling_error(e: SchedulingError) -> AppError {
    match e {
        SchedulingError::TherapyNotFound
        | SchedulingError::TherapistNotFound
        | SchedulingError::PatientNotFound
        | SchedulingError::AppointmentNotFound => AppError::NotFound(e.to_string()),
        SchedulingError::TherapistInactive => AppError::BadRequest(e.to_string()),
        SchedulingError::InvalidInterval(_) => AppError::BadRequest(e.to_string()),
        SchedulingError::CapacityExceeded { .. } => AppError::Conflict(e.to_string()),
        SchedulingError::SlotConflict { .. } => AppError::Conflict(e.to_string()),
        SchedulingError::IllegalTransition { .. } => AppError::Conflict(e.to_string()),
        SchedulingError::StorageUnavailable(msg) => AppError::StorageUnavailable(msg),
    }
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

pub async fn book_appointment(
    State(booking): State<Arc<AppointmentBookingService>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let confirmation = booking
        .book_appointment(request)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": confirmation
    })))
}

pub async fn get_appointment(
    State(booking): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = booking
        .get_appointment(&appointment_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({ "appointment": appointment })))
}

pub async fn reschedule_appointment(
    State(booking): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let confirmation = booking
        .reschedule_appointment(&appointment_id, request)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": confirmation
    })))
}

pub async fn cancel_appointment(
    State(booking): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    booking
        .cancel_appointment(&appointment_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({ "success": true })))
}

pub async fn complete_appointment(
    State(booking): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    booking
        .mark_completed(&appointment_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({ "success": true })))
}

pub async fn get_therapist_schedule(
    State(booking): State<Arc<AppointmentBookingService>>,
    Path(therapist_id): Path<Uuid>,
    Query(params): Query<ScheduleRangeParams>,
) -> Result<Json<Value>, AppError> {
    let appointments = booking
        .list_for_therapist(
            therapist_id,
            ScheduleQuery {
                start_date: params.start_date,
                end_date: params.end_date,
            },
        )
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}
