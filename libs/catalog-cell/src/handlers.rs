// libs/catalog-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{CatalogError, CreateTherapistRequest, CreateTherapyRequest};
use crate::services::catalog::CatalogService;

fn map_catalog_error(e: CatalogError) -> AppError {
    match e {
        CatalogError::TherapyNotFound => AppError::NotFound("Therapy not found".to_string()),
        CatalogError::TherapistNotFound => AppError::NotFound("Therapist not found".to_string()),
        CatalogError::Validation(msg) => AppError::ValidationError(msg),
    }
}

pub async fn create_therapy(
    State(catalog): State<Arc<CatalogService>>,
    Json(request): Json<CreateTherapyRequest>,
) -> Result<Json<Value>, AppError> {
    let therapy = catalog
        .create_therapy(request)
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({
        "success": true,
        "therapy": therapy
    })))
}

pub async fn get_therapy(
    State(catalog): State<Arc<CatalogService>>,
    Path(therapy_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let therapy = catalog
        .get_therapy(therapy_id)
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({ "therapy": therapy })))
}

pub async fn list_therapies(
    State(catalog): State<Arc<CatalogService>>,
) -> Result<Json<Value>, AppError> {
    let therapies = catalog.list_therapies().await;
    Ok(Json(json!({ "therapies": therapies })))
}

pub async fn create_therapist(
    State(catalog): State<Arc<CatalogService>>,
    Json(request): Json<CreateTherapistRequest>,
) -> Result<Json<Value>, AppError> {
    let therapist = catalog
        .create_therapist(request)
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({
        "success": true,
        "therapist": therapist
    })))
}

pub async fn get_therapist(
    State(catalog): State<Arc<CatalogService>>,
    Path(therapist_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let therapist = catalog
        .get_therapist(therapist_id)
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({ "therapist": therapist })))
}

pub async fn deactivate_therapist(
    State(catalog): State<Arc<CatalogService>>,
    Path(therapist_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let therapist = catalog
        .deactivate_therapist(therapist_id)
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({
        "success": true,
        "therapist": therapist
    })))
}

pub async fn list_active_therapists(
    State(catalog): State<Arc<CatalogService>>,
) -> Result<Json<Value>, AppError> {
    let therapists = catalog.list_active_therapists().await;
    Ok(Json(json!({ "therapists": therapists })))
}
