// libs/scheduling-cell/src/services/lifecycle.rs
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::models::{AppointmentCompleted, AppointmentStatus, SchedulingError};
use crate::services::ledger::AppointmentLedger;

/// Fan-out channel for completed-appointment notifications. Progress
/// notes, billing and inventory decrement subscribe independently; the
/// scheduling engine has no further obligation once an event is published.
pub struct CompletedEventBus {
    sender: broadcast::Sender<AppointmentCompleted>,
}

impl CompletedEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppointmentCompleted> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: AppointmentCompleted) {
        // A send error only means no subscriber is currently listening.
        if self.sender.send(event.clone()).is_err() {
            debug!(
                "No subscribers for completion event {}",
                event.appointment_id
            );
        }
    }
}

/// Drives appointments through their status state machine in response to
/// clinical events. The sole path by which an appointment becomes
/// Completed.
pub struct AppointmentLifecycleService {
    ledger: Arc<dyn AppointmentLedger>,
    events: Arc<CompletedEventBus>,
}

impl AppointmentLifecycleService {
    pub fn new(ledger: Arc<dyn AppointmentLedger>, events: Arc<CompletedEventBus>) -> Self {
        Self { ledger, events }
    }

    /// Validate that a status transition is allowed.
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), SchedulingError> {
        if !current_status.can_transition_to(new_status) {
            warn!(
                "Invalid status transition attempted: {} -> {}",
                current_status, new_status
            );
            return Err(SchedulingError::IllegalTransition {
                from: current_status,
                attempted: new_status,
            });
        }
        Ok(())
    }

    /// Mark an appointment completed, triggered by clinical note
    /// submission. Idempotent: completing an already-completed appointment
    /// succeeds without a second transition or a second event.
    pub async fn mark_completed(&self, appointment_id: &str) -> Result<(), SchedulingError> {
        let appointment = self.ledger.get(appointment_id).await?;

        match appointment.status {
            AppointmentStatus::Completed => {
                debug!("Appointment {} already completed", appointment_id);
                Ok(())
            }
            AppointmentStatus::Cancelled | AppointmentStatus::Rescheduled => {
                Err(SchedulingError::IllegalTransition {
                    from: appointment.status,
                    attempted: AppointmentStatus::Completed,
                })
            }
            AppointmentStatus::Scheduled => {
                let updated = self
                    .ledger
                    .update_status(appointment_id, AppointmentStatus::Completed)
                    .await?;

                self.events.publish(AppointmentCompleted {
                    appointment_id: updated.id.clone(),
                    patient_id: updated.patient_id,
                    therapy_id: updated.therapy_id,
                });

                info!("Appointment {} marked completed", appointment_id);
                Ok(())
            }
        }
    }
}
