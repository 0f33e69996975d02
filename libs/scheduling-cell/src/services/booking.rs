// libs/scheduling-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use catalog_cell::models::CatalogError;
use catalog_cell::services::catalog::CatalogService;
use patient_cell::services::patient::PatientService;

use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, BookingConfirmation,
    RescheduleRequest, ScheduleQuery, SchedulingError,
};
use crate::services::conflict::ConflictDetector;
use crate::services::ledger::{AppointmentLedger, SlotLockManager};
use crate::services::lifecycle::{AppointmentLifecycleService, CompletedEventBus};

/// The scheduling engine: validates booking requests against the catalog
/// and patient registry, derives the appointment interval, and commits or
/// rejects under a per-(therapist, date) lock so the capacity check, the
/// conflict check and the insert observe and mutate the ledger as one
/// serialized unit.
pub struct AppointmentBookingService {
    ledger: Arc<dyn AppointmentLedger>,
    catalog: Arc<CatalogService>,
    patients: Arc<PatientService>,
    lifecycle_service: AppointmentLifecycleService,
    slot_locks: SlotLockManager,
}

impl AppointmentBookingService {
    pub fn new(
        ledger: Arc<dyn AppointmentLedger>,
        catalog: Arc<CatalogService>,
        patients: Arc<PatientService>,
        events: Arc<CompletedEventBus>,
    ) -> Self {
        let lifecycle_service = AppointmentLifecycleService::new(Arc::clone(&ledger), events);
        Self {
            ledger,
            catalog,
            patients,
            lifecycle_service,
            slot_locks: SlotLockManager::new(),
        }
    }

    /// Book a new appointment. On success the record is persisted with
    /// status Scheduled; on any failure nothing is written.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<BookingConfirmation, SchedulingError> {
        info!(
            "Booking appointment for patient {} with therapist {} on {}",
            request.patient_id, request.therapist_id, request.date
        );

        let therapy = self
            .catalog
            .get_therapy(request.therapy_id)
            .await
            .map_err(map_catalog_error)?;

        let end_time = compute_end_time(request.start_time, therapy.duration_minutes)?;

        if !self.patients.exists(request.patient_id).await {
            return Err(SchedulingError::PatientNotFound);
        }

        let therapist = self
            .catalog
            .get_therapist(request.therapist_id)
            .await
            .map_err(map_catalog_error)?;
        if !therapist.is_active {
            return Err(SchedulingError::TherapistInactive);
        }

        // Serialize against every other booking for this therapist/date.
        let slot_lock = self
            .slot_locks
            .lock_for(request.therapist_id, request.date)
            .await;
        let _guard = slot_lock.lock().await;

        let existing = self
            .ledger
            .list_by_therapist_and_date(request.therapist_id, request.date)
            .await?;

        self.check_capacity(&existing, therapist.max_sessions_per_day, None)?;
        self.check_slot_free(&existing, request.start_time, end_time, None)?;

        let now = Utc::now();
        let appointment = Appointment {
            id: generate_appointment_id(request.date),
            patient_id: request.patient_id,
            therapist_id: request.therapist_id,
            therapy_id: request.therapy_id,
            date: request.date,
            start_time: request.start_time,
            end_time,
            status: AppointmentStatus::Scheduled,
            notes: request.notes,
            created_by: request.requested_by,
            created_at: now,
            updated_at: now,
        };

        self.ledger.insert(appointment.clone()).await?;

        info!(
            "Appointment {} booked: {} [{} - {})",
            appointment.id, appointment.date, appointment.start_time, appointment.end_time
        );
        Ok(BookingConfirmation::from(&appointment))
    }

    /// Release an appointment's slot and allocate a replacement interval,
    /// subject to the same capacity and conflict checks as a fresh
    /// booking. A rejected reschedule leaves the original untouched.
    pub async fn reschedule_appointment(
        &self,
        appointment_id: &str,
        request: RescheduleRequest,
    ) -> Result<BookingConfirmation, SchedulingError> {
        debug!("Rescheduling appointment {}", appointment_id);

        let current = self.ledger.get(appointment_id).await?;
        self.lifecycle_service
            .validate_status_transition(current.status, AppointmentStatus::Rescheduled)?;

        let therapy = self
            .catalog
            .get_therapy(current.therapy_id)
            .await
            .map_err(map_catalog_error)?;
        let new_end_time = compute_end_time(request.new_start_time, therapy.duration_minutes)?;

        let therapist = self
            .catalog
            .get_therapist(current.therapist_id)
            .await
            .map_err(map_catalog_error)?;

        let slot_lock = self
            .slot_locks
            .lock_for(current.therapist_id, request.new_date)
            .await;
        let _guard = slot_lock.lock().await;

        let existing = self
            .ledger
            .list_by_therapist_and_date(current.therapist_id, request.new_date)
            .await?;

        // The record being moved must not count against its own new slot.
        self.check_capacity(
            &existing,
            therapist.max_sessions_per_day,
            Some(appointment_id),
        )?;
        self.check_slot_free(
            &existing,
            request.new_start_time,
            new_end_time,
            Some(appointment_id),
        )?;

        let now = Utc::now();
        let replacement = Appointment {
            id: generate_appointment_id(request.new_date),
            patient_id: current.patient_id,
            therapist_id: current.therapist_id,
            therapy_id: current.therapy_id,
            date: request.new_date,
            start_time: request.new_start_time,
            end_time: new_end_time,
            status: AppointmentStatus::Scheduled,
            notes: current.notes.clone(),
            created_by: current.created_by.clone(),
            created_at: now,
            updated_at: now,
        };

        // Release the old interval and commit the replacement as one
        // ledger write. A storage failure, or a concurrent status change
        // on the old record, rejects the whole operation with nothing
        // applied, leaving the reschedule safe to retry.
        self.ledger
            .replace(appointment_id, replacement.clone())
            .await?;

        info!(
            "Appointment {} rescheduled to {} as {}",
            appointment_id, replacement.date, replacement.id
        );
        Ok(BookingConfirmation::from(&replacement))
    }

    /// Cancel an appointment, releasing its slot. Idempotent for records
    /// whose slot is already released.
    pub async fn cancel_appointment(&self, appointment_id: &str) -> Result<(), SchedulingError> {
        debug!("Cancelling appointment {}", appointment_id);

        let current = self.ledger.get(appointment_id).await?;
        match current.status {
            AppointmentStatus::Completed => Err(SchedulingError::IllegalTransition {
                from: current.status,
                attempted: AppointmentStatus::Cancelled,
            }),
            AppointmentStatus::Cancelled | AppointmentStatus::Rescheduled => {
                debug!("Appointment {} already released", appointment_id);
                Ok(())
            }
            AppointmentStatus::Scheduled => {
                self.ledger
                    .update_status(appointment_id, AppointmentStatus::Cancelled)
                    .await?;
                info!("Appointment {} cancelled", appointment_id);
                Ok(())
            }
        }
    }

    /// Mark an appointment completed in response to clinical note
    /// submission. Delegated to the lifecycle controller.
    pub async fn mark_completed(&self, appointment_id: &str) -> Result<(), SchedulingError> {
        self.lifecycle_service.mark_completed(appointment_id).await
    }

    pub async fn get_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Appointment, SchedulingError> {
        self.ledger.get(appointment_id).await
    }

    /// Read-only schedule view over a date range. Runs outside the booking
    /// lock; a slightly stale view is acceptable for listings.
    pub async fn list_for_therapist(
        &self,
        therapist_id: Uuid,
        query: ScheduleQuery,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        if query.start_date > query.end_date {
            return Err(SchedulingError::InvalidInterval(
                "start_date must not be after end_date".to_string(),
            ));
        }

        self.catalog
            .get_therapist(therapist_id)
            .await
            .map_err(map_catalog_error)?;

        self.ledger
            .list_by_therapist_in_range(therapist_id, query.start_date, query.end_date)
            .await
    }

    fn check_capacity(
        &self,
        existing: &[Appointment],
        max_sessions_per_day: i32,
        exclude_appointment_id: Option<&str>,
    ) -> Result<(), SchedulingError> {
        let booked = ConflictDetector::blocking_count(existing, exclude_appointment_id);
        if booked as i32 >= max_sessions_per_day {
            warn!(
                "Capacity ceiling reached: {} of {} sessions booked",
                booked, max_sessions_per_day
            );
            return Err(SchedulingError::CapacityExceeded {
                limit: max_sessions_per_day,
            });
        }
        Ok(())
    }

    fn check_slot_free(
        &self,
        existing: &[Appointment],
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_appointment_id: Option<&str>,
    ) -> Result<(), SchedulingError> {
        if let Some(blocking) = ConflictDetector::find_conflict(
            existing,
            start_time,
            end_time,
            exclude_appointment_id,
        ) {
            warn!(
                "Slot conflict: [{} - {}) blocked by {}",
                start_time, end_time, blocking.id
            );
            return Err(SchedulingError::SlotConflict {
                blocking_appointment_id: blocking.id.clone(),
            });
        }
        Ok(())
    }
}

/// Derive the end of the interval from the requested start and the
/// therapy duration. Appointments are single-day: an interval that would
/// wrap past midnight is rejected rather than silently producing an
/// invalid same-day record.
fn compute_end_time(
    start_time: NaiveTime,
    duration_minutes: i32,
) -> Result<NaiveTime, SchedulingError> {
    if duration_minutes <= 0 {
        return Err(SchedulingError::InvalidInterval(
            "therapy duration must be positive".to_string(),
        ));
    }

    let (end_time, wrapped_seconds) =
        start_time.overflowing_add_signed(ChronoDuration::minutes(duration_minutes as i64));
    if wrapped_seconds != 0 {
        return Err(SchedulingError::InvalidInterval(format!(
            "appointment starting at {} with {} minute duration would cross midnight",
            start_time, duration_minutes
        )));
    }

    Ok(end_time)
}

/// Human-readable unique code, e.g. `APT-20260830-9F2A1C`. The date makes
/// codes sortable at a glance; the uuid fragment keeps them unique.
fn generate_appointment_id(date: NaiveDate) -> String {
    let fragment = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("APT-{}-{}", date.format("%Y%m%d"), fragment)
}

fn map_catalog_error(e: CatalogError) -> SchedulingError {
    match e {
        CatalogError::TherapyNotFound => SchedulingError::TherapyNotFound,
        CatalogError::TherapistNotFound => SchedulingError::TherapistNotFound,
        CatalogError::Validation(msg) => SchedulingError::InvalidInterval(msg),
    }
}
