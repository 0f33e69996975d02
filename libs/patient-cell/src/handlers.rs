// libs/patient-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{PatientError, RegisterPatientRequest};
use crate::services::patient::PatientService;

#[derive(Debug, Deserialize)]
pub struct PatientSearchParams {
    pub search: Option<String>,
}

fn map_patient_error(e: PatientError) -> AppError {
    match e {
        PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
        PatientError::Validation(msg) => AppError::ValidationError(msg),
    }
}

pub async fn register_patient(
    State(patients): State<Arc<PatientService>>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = patients
        .register_patient(request)
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({
        "success": true,
        "patient": patient
    })))
}

pub async fn get_patient(
    State(patients): State<Arc<PatientService>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient = patients
        .get_patient(patient_id)
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({ "patient": patient })))
}

pub async fn list_patients(
    State(patients): State<Arc<PatientService>>,
    Query(params): Query<PatientSearchParams>,
) -> Result<Json<Value>, AppError> {
    let results = patients.list_patients(params.search.as_deref()).await;
    Ok(Json(json!({ "patients": results })))
}
