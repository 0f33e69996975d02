// libs/catalog-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// REFERENCE DATA MODELS
// ==============================================================================

/// A therapy offering. Immutable after creation in normal operation;
/// rows are created by administrative setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Therapy {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub cost: f64,
    pub requires_resource: bool,
    /// Amount of consumable (oil, in ml) used per session when
    /// `requires_resource` is set.
    pub resource_quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Therapist {
    pub id: Uuid,
    pub full_name: String,
    pub specialization: Option<String>,
    pub max_sessions_per_day: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTherapyRequest {
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub cost: f64,
    #[serde(default)]
    pub requires_resource: bool,
    #[serde(default)]
    pub resource_quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTherapistRequest {
    pub full_name: String,
    pub specialization: Option<String>,
    pub max_sessions_per_day: i32,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("Therapy not found")]
    TherapyNotFound,

    #[error("Therapist not found")]
    TherapistNotFound,

    #[error("Validation error: {0}")]
    Validation(String),
}
