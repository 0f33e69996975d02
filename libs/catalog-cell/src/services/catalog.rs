// libs/catalog-cell/src/services/catalog.rs
use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    CatalogError, CreateTherapistRequest, CreateTherapyRequest, Therapist, Therapy,
};

/// Read-mostly reference store for therapy definitions and therapist records.
/// The scheduling engine only ever reads from it; writes happen at
/// administrative setup and staff onboarding.
pub struct CatalogService {
    therapies: RwLock<HashMap<Uuid, Therapy>>,
    therapists: RwLock<HashMap<Uuid, Therapist>>,
}

impl CatalogService {
    pub fn new() -> Self {
        Self {
            therapies: RwLock::new(HashMap::new()),
            therapists: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_therapy(
        &self,
        request: CreateTherapyRequest,
    ) -> Result<Therapy, CatalogError> {
        if request.name.trim().is_empty() {
            return Err(CatalogError::Validation(
                "Therapy name must not be empty".to_string(),
            ));
        }
        if request.duration_minutes <= 0 {
            return Err(CatalogError::Validation(
                "Therapy duration must be a positive number of minutes".to_string(),
            ));
        }
        if request.cost < 0.0 {
            return Err(CatalogError::Validation(
                "Therapy cost must not be negative".to_string(),
            ));
        }
        if request.resource_quantity < 0 {
            return Err(CatalogError::Validation(
                "Resource quantity must not be negative".to_string(),
            ));
        }

        let therapy = Therapy {
            id: Uuid::new_v4(),
            name: request.name,
            description: request.description,
            duration_minutes: request.duration_minutes,
            cost: request.cost,
            requires_resource: request.requires_resource,
            resource_quantity: request.resource_quantity,
            created_at: Utc::now(),
        };

        self.therapies
            .write()
            .await
            .insert(therapy.id, therapy.clone());

        info!("Created therapy {} ({})", therapy.name, therapy.id);
        Ok(therapy)
    }

    pub async fn get_therapy(&self, therapy_id: Uuid) -> Result<Therapy, CatalogError> {
        self.therapies
            .read()
            .await
            .get(&therapy_id)
            .cloned()
            .ok_or(CatalogError::TherapyNotFound)
    }

    pub async fn list_therapies(&self) -> Vec<Therapy> {
        let mut therapies: Vec<Therapy> = self.therapies.read().await.values().cloned().collect();
        therapies.sort_by(|a, b| a.name.cmp(&b.name));
        therapies
    }

    pub async fn create_therapist(
        &self,
        request: CreateTherapistRequest,
    ) -> Result<Therapist, CatalogError> {
        if request.full_name.trim().is_empty() {
            return Err(CatalogError::Validation(
                "Therapist name must not be empty".to_string(),
            ));
        }
        if request.max_sessions_per_day <= 0 {
            return Err(CatalogError::Validation(
                "Daily session capacity must be positive".to_string(),
            ));
        }

        let therapist = Therapist {
            id: Uuid::new_v4(),
            full_name: request.full_name,
            specialization: request.specialization,
            max_sessions_per_day: request.max_sessions_per_day,
            is_active: true,
            created_at: Utc::now(),
        };

        self.therapists
            .write()
            .await
            .insert(therapist.id, therapist.clone());

        info!("Onboarded therapist {} ({})", therapist.full_name, therapist.id);
        Ok(therapist)
    }

    pub async fn get_therapist(&self, therapist_id: Uuid) -> Result<Therapist, CatalogError> {
        self.therapists
            .read()
            .await
            .get(&therapist_id)
            .cloned()
            .ok_or(CatalogError::TherapistNotFound)
    }

    /// Soft-deactivate a therapist. Records are never deleted because
    /// appointments keep referencing them.
    pub async fn deactivate_therapist(&self, therapist_id: Uuid) -> Result<Therapist, CatalogError> {
        let mut therapists = self.therapists.write().await;
        let therapist = therapists
            .get_mut(&therapist_id)
            .ok_or(CatalogError::TherapistNotFound)?;

        therapist.is_active = false;
        info!("Deactivated therapist {}", therapist_id);
        Ok(therapist.clone())
    }

    pub async fn list_active_therapists(&self) -> Vec<Therapist> {
        let mut active: Vec<Therapist> = self
            .therapists
            .read()
            .await
            .values()
            .filter(|t| t.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        active
    }

    /// Insert the stock Panchakarma therapy catalog used for a fresh
    /// installation. Skipped when any therapy already exists.
    pub async fn seed_defaults(&self) -> Result<usize, CatalogError> {
        if !self.therapies.read().await.is_empty() {
            debug!("Therapy catalog already populated, skipping seed");
            return Ok(0);
        }

        let defaults: [(&str, &str, i32, f64, bool, i32); 7] = [
            ("Abhyanga", "Full body oil massage with warm herbal oils", 90, 2500.00, true, 200),
            ("Shirodhara", "Continuous pouring of oil on forehead", 60, 3000.00, true, 500),
            ("Pizhichil", "Oil bath therapy with warm medicated oils", 75, 4000.00, true, 1000),
            ("Udvartana", "Herbal powder massage for weight reduction", 45, 2000.00, false, 0),
            ("Nasya", "Nasal administration of medicated oils", 30, 1500.00, true, 50),
            ("Karna Purana", "Ear treatment with medicated oils", 20, 1000.00, true, 30),
            ("Akshi Tarpana", "Eye treatment with medicated ghee", 30, 2500.00, true, 100),
        ];

        for (name, description, duration, cost, requires_resource, quantity) in defaults {
            self.create_therapy(CreateTherapyRequest {
                name: name.to_string(),
                description: Some(description.to_string()),
                duration_minutes: duration,
                cost,
                requires_resource,
                resource_quantity: quantity,
            })
            .await?;
        }

        info!("Seeded default therapy catalog");
        Ok(7)
    }
}

impl Default for CatalogService {
    fn default() -> Self {
        Self::new()
    }
}
