// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    /// Human-readable unique code, e.g. `APT-20260830-9F2A1C`.
    pub id: String,
    pub patient_id: Uuid,
    pub therapist_id: Uuid,
    pub therapy_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// Always derived as `start_time + therapy.duration`; never supplied by
    /// callers and never mutated without recomputation.
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// The half-open `[start_time, end_time)` interval this appointment
    /// occupies on its date.
    pub fn interval(&self) -> (NaiveTime, NaiveTime) {
        (self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

impl AppointmentStatus {
    /// Whether an appointment in this status still occupies its time slot
    /// and counts toward the therapist's daily capacity. Cancelled and
    /// Rescheduled records have released their interval.
    pub fn blocks_slot(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Completed)
    }

    /// Statuses this one may legally move to. Everything except Scheduled
    /// is terminal: a Rescheduled record is a released husk replaced by a
    /// fresh appointment.
    pub fn valid_transitions(&self) -> &'static [AppointmentStatus] {
        match self {
            AppointmentStatus::Scheduled => &[
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Rescheduled,
            ],
            AppointmentStatus::Completed => &[],
            AppointmentStatus::Cancelled => &[],
            AppointmentStatus::Rescheduled => &[],
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub therapist_id: Uuid,
    pub therapy_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub notes: Option<String>,
    pub requested_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub new_date: NaiveDate,
    pub new_start_time: NaiveTime,
}

/// What the caller gets back from a successful booking or reschedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub appointment_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl From<&Appointment> for BookingConfirmation {
    fn from(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.id.clone(),
            date: appointment.date,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Broadcast once per Scheduled -> Completed transition. Downstream
/// consumers (progress notes, billing, inventory decrement) react
/// independently and must be idempotent on `appointment_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentCompleted {
    pub appointment_id: String,
    pub patient_id: Uuid,
    pub therapy_id: Uuid,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulingError {
    #[error("Therapy not found")]
    TherapyNotFound,

    #[error("Therapist not found")]
    TherapistNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Therapist is not active")]
    TherapistInactive,

    #[error("Invalid appointment interval: {0}")]
    InvalidInterval(String),

    #[error("Therapist has reached the daily limit of {limit} sessions")]
    CapacityExceeded { limit: i32 },

    #[error("Time slot conflicts with appointment {blocking_appointment_id}")]
    SlotConflict { blocking_appointment_id: String },

    #[error("Appointment in status {from} cannot move to {attempted}")]
    IllegalTransition {
        from: AppointmentStatus,
        attempted: AppointmentStatus,
    },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}
