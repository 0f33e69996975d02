// libs/scheduling-cell/src/services/ledger.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, SchedulingError};

/// The authoritative appointment store. Every mutation goes through this
/// trait so the status state machine is enforced at a single choke point
/// instead of being trusted to callers. A persistence-backed
/// implementation surfaces transient failures as `StorageUnavailable`.
#[async_trait]
pub trait AppointmentLedger: Send + Sync {
    async fn insert(&self, appointment: Appointment) -> Result<(), SchedulingError>;

    async fn get(&self, appointment_id: &str) -> Result<Appointment, SchedulingError>;

    /// All appointments for a therapist on a date, regardless of status.
    /// Callers filter by status themselves.
    async fn list_by_therapist_and_date(
        &self,
        therapist_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, SchedulingError>;

    async fn list_by_therapist_in_range(
        &self,
        therapist_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Appointment>, SchedulingError>;

    /// Apply a status transition and refresh `updated_at`. Rejects
    /// transitions the state machine does not allow.
    async fn update_status(
        &self,
        appointment_id: &str,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError>;

    /// Mark `old_id` Rescheduled and insert its replacement as one atomic
    /// write. Either both apply or neither does: a rejected or failed
    /// replace leaves the old record untouched, so the caller can retry
    /// the same reschedule.
    async fn replace(
        &self,
        old_id: &str,
        replacement: Appointment,
    ) -> Result<(), SchedulingError>;
}

pub struct InMemoryLedger {
    appointments: RwLock<HashMap<String, Appointment>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            appointments: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppointmentLedger for InMemoryLedger {
    async fn insert(&self, appointment: Appointment) -> Result<(), SchedulingError> {
        let mut appointments = self.appointments.write().await;
        if appointments.contains_key(&appointment.id) {
            return Err(SchedulingError::StorageUnavailable(format!(
                "duplicate appointment id {}",
                appointment.id
            )));
        }
        debug!("Ledger insert: {}", appointment.id);
        appointments.insert(appointment.id.clone(), appointment);
        Ok(())
    }

    async fn get(&self, appointment_id: &str) -> Result<Appointment, SchedulingError> {
        self.appointments
            .read()
            .await
            .get(appointment_id)
            .cloned()
            .ok_or(SchedulingError::AppointmentNotFound)
    }

    async fn list_by_therapist_and_date(
        &self,
        therapist_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut matched: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|apt| apt.therapist_id == therapist_id && apt.date == date)
            .cloned()
            .collect();
        matched.sort_by_key(|apt| apt.start_time);
        Ok(matched)
    }

    async fn list_by_therapist_in_range(
        &self,
        therapist_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut matched: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|apt| {
                apt.therapist_id == therapist_id
                    && apt.date >= start_date
                    && apt.date <= end_date
            })
            .cloned()
            .collect();
        matched.sort_by_key(|apt| (apt.date, apt.start_time));
        Ok(matched)
    }

    async fn update_status(
        &self,
        appointment_id: &str,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments
            .get_mut(appointment_id)
            .ok_or(SchedulingError::AppointmentNotFound)?;

        if !appointment.status.can_transition_to(new_status) {
            return Err(SchedulingError::IllegalTransition {
                from: appointment.status,
                attempted: new_status,
            });
        }

        debug!(
            "Ledger status update: {} {} -> {}",
            appointment_id, appointment.status, new_status
        );
        appointment.status = new_status;
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }

    async fn replace(
        &self,
        old_id: &str,
        replacement: Appointment,
    ) -> Result<(), SchedulingError> {
        let mut appointments = self.appointments.write().await;

        let old_status = appointments
            .get(old_id)
            .map(|apt| apt.status)
            .ok_or(SchedulingError::AppointmentNotFound)?;
        if !old_status.can_transition_to(AppointmentStatus::Rescheduled) {
            return Err(SchedulingError::IllegalTransition {
                from: old_status,
                attempted: AppointmentStatus::Rescheduled,
            });
        }
        if appointments.contains_key(&replacement.id) {
            return Err(SchedulingError::StorageUnavailable(format!(
                "duplicate appointment id {}",
                replacement.id
            )));
        }

        debug!("Ledger replace: {} -> {}", old_id, replacement.id);
        if let Some(old) = appointments.get_mut(old_id) {
            old.status = AppointmentStatus::Rescheduled;
            old.updated_at = Utc::now();
        }
        appointments.insert(replacement.id.clone(), replacement);
        Ok(())
    }
}

/// Hands out one async mutex per (therapist, date) so the capacity check,
/// conflict check and insert of a booking run as a single serialized unit
/// for that key, while bookings for other therapists or dates proceed in
/// parallel.
pub struct SlotLockManager {
    locks: Mutex<HashMap<(Uuid, NaiveDate), Arc<Mutex<()>>>>,
}

impl SlotLockManager {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn lock_for(&self, therapist_id: Uuid, date: NaiveDate) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry((therapist_id, date))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for SlotLockManager {
    fn default() -> Self {
        Self::new()
    }
}
