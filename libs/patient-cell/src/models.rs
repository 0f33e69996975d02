// libs/patient-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    /// Human-readable registration code, e.g. `AYU202608301234`.
    pub patient_code: String,
    pub full_name: String,
    pub age: i32,
    pub gender: Gender,
    pub phone: String,
    pub email: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub contraindications: Option<String>,
    pub dosha_profile: DoshaProfile,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Constitutional (prakriti) and current-imbalance (vikriti) dosha scores
/// captured at intake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoshaProfile {
    pub prakriti_vata: i32,
    pub prakriti_pitta: i32,
    pub prakriti_kapha: i32,
    pub vikriti_vata: i32,
    pub vikriti_pitta: i32,
    pub vikriti_kapha: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPatientRequest {
    pub full_name: String,
    pub age: i32,
    pub gender: Gender,
    pub phone: String,
    pub email: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub contraindications: Option<String>,
    #[serde(default)]
    pub dosha_profile: DoshaProfile,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),
}
