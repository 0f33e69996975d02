// libs/patient-cell/src/services/patient.rs
use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::models::{Patient, PatientError, RegisterPatientRequest};

/// Plain keyed record store for patient registrations. The scheduling
/// engine only consumes `exists`.
pub struct PatientService {
    patients: RwLock<HashMap<Uuid, Patient>>,
}

impl PatientService {
    pub fn new() -> Self {
        Self {
            patients: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register_patient(
        &self,
        request: RegisterPatientRequest,
    ) -> Result<Patient, PatientError> {
        if request.full_name.trim().is_empty() {
            return Err(PatientError::Validation(
                "Patient name must not be empty".to_string(),
            ));
        }
        if request.age <= 0 {
            return Err(PatientError::Validation(
                "Patient age must be positive".to_string(),
            ));
        }
        if request.phone.trim().is_empty() {
            return Err(PatientError::Validation(
                "Phone number must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let patient = Patient {
            id: Uuid::new_v4(),
            patient_code: generate_patient_code(&request.phone),
            full_name: request.full_name,
            age: request.age,
            gender: request.gender,
            phone: request.phone,
            email: request.email,
            medical_history: request.medical_history,
            allergies: request.allergies,
            contraindications: request.contraindications,
            dosha_profile: request.dosha_profile,
            created_at: now,
        };

        self.patients
            .write()
            .await
            .insert(patient.id, patient.clone());

        info!(
            "Registered patient {} ({})",
            patient.patient_code, patient.id
        );
        Ok(patient)
    }

    pub async fn get_patient(&self, patient_id: Uuid) -> Result<Patient, PatientError> {
        self.patients
            .read()
            .await
            .get(&patient_id)
            .cloned()
            .ok_or(PatientError::NotFound)
    }

    pub async fn exists(&self, patient_id: Uuid) -> bool {
        self.patients.read().await.contains_key(&patient_id)
    }

    /// List patients, optionally filtered by a case-insensitive match on
    /// name, registration code, or phone.
    pub async fn list_patients(&self, search: Option<&str>) -> Vec<Patient> {
        let patients = self.patients.read().await;
        let mut matched: Vec<Patient> = match search {
            Some(query) if !query.trim().is_empty() => {
                let needle = query.trim().to_lowercase();
                patients
                    .values()
                    .filter(|p| {
                        p.full_name.to_lowercase().contains(&needle)
                            || p.patient_code.to_lowercase().contains(&needle)
                            || p.phone.contains(query.trim())
                    })
                    .cloned()
                    .collect()
            }
            _ => patients.values().cloned().collect(),
        };
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched
    }
}

impl Default for PatientService {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration codes combine the intake date with the phone tail, e.g.
/// `AYU202608301234`.
fn generate_patient_code(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
    format!("AYU{}{}", Utc::now().format("%Y%m%d"), tail)
}
