use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use catalog_cell::models::{CreateTherapistRequest, CreateTherapyRequest};
use catalog_cell::services::catalog::CatalogService;
use patient_cell::models::{DoshaProfile, Gender, RegisterPatientRequest};
use patient_cell::services::patient::PatientService;
use scheduling_cell::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, RescheduleRequest, SchedulingError,
};
use scheduling_cell::services::booking::AppointmentBookingService;
use scheduling_cell::services::ledger::{AppointmentLedger, InMemoryLedger};
use scheduling_cell::services::lifecycle::CompletedEventBus;

/// Ledger wrapper whose next `replace` calls fail as a transient storage
/// outage, without touching the underlying store.
struct UnreliableLedger {
    inner: InMemoryLedger,
    replace_outages: AtomicUsize,
}

impl UnreliableLedger {
    fn failing_replaces(count: usize) -> Self {
        Self {
            inner: InMemoryLedger::new(),
            replace_outages: AtomicUsize::new(count),
        }
    }
}

#[async_trait]
impl AppointmentLedger for UnreliableLedger {
    async fn insert(&self, appointment: Appointment) -> Result<(), SchedulingError> {
        self.inner.insert(appointment).await
    }

    async fn get(&self, appointment_id: &str) -> Result<Appointment, SchedulingError> {
        self.inner.get(appointment_id).await
    }

    async fn list_by_therapist_and_date(
        &self,
        therapist_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.inner.list_by_therapist_and_date(therapist_id, date).await
    }

    async fn list_by_therapist_in_range(
        &self,
        therapist_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.inner
            .list_by_therapist_in_range(therapist_id, start_date, end_date)
            .await
    }

    async fn update_status(
        &self,
        appointment_id: &str,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        self.inner.update_status(appointment_id, new_status).await
    }

    async fn replace(
        &self,
        old_id: &str,
        replacement: Appointment,
    ) -> Result<(), SchedulingError> {
        if self.replace_outages.load(Ordering::SeqCst) > 0 {
            self.replace_outages.fetch_sub(1, Ordering::SeqCst);
            return Err(SchedulingError::StorageUnavailable(
                "connection reset".to_string(),
            ));
        }
        self.inner.replace(old_id, replacement).await
    }
}

struct TestContext {
    booking: Arc<AppointmentBookingService>,
    events: Arc<CompletedEventBus>,
    patient_id: Uuid,
    therapist_id: Uuid,
    therapy_id: Uuid,
}

async fn setup() -> TestContext {
    setup_with_ledger(Arc::new(InMemoryLedger::new())).await
}

async fn setup_with_ledger(ledger: Arc<dyn AppointmentLedger>) -> TestContext {
    let catalog = Arc::new(CatalogService::new());
    let patients = Arc::new(PatientService::new());
    let events = Arc::new(CompletedEventBus::new(16));

    let therapy = catalog
        .create_therapy(CreateTherapyRequest {
            name: "Shirodhara".to_string(),
            description: None,
            duration_minutes: 60,
            cost: 3000.0,
            requires_resource: true,
            resource_quantity: 500,
        })
        .await
        .unwrap();

    let therapist = catalog
        .create_therapist(CreateTherapistRequest {
            full_name: "Meera Sharma".to_string(),
            specialization: None,
            max_sessions_per_day: 8,
        })
        .await
        .unwrap();

    let patient = patients
        .register_patient(RegisterPatientRequest {
            full_name: "Ravi Kumar".to_string(),
            age: 42,
            gender: Gender::Male,
            phone: "9876543210".to_string(),
            email: None,
            medical_history: None,
            allergies: None,
            contraindications: None,
            dosha_profile: DoshaProfile::default(),
        })
        .await
        .unwrap();

    let booking = Arc::new(AppointmentBookingService::new(
        ledger,
        catalog,
        patients,
        Arc::clone(&events),
    ));

    TestContext {
        booking,
        events,
        patient_id: patient.id,
        therapist_id: therapist.id,
        therapy_id: therapy.id,
    }
}

fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
}

fn request_at(ctx: &TestContext, date: NaiveDate, hour: u32) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient_id: ctx.patient_id,
        therapist_id: ctx.therapist_id,
        therapy_id: ctx.therapy_id,
        date,
        start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        notes: None,
        requested_by: "reception".to_string(),
    }
}

async fn book_at(ctx: &TestContext, hour: u32) -> String {
    ctx.booking
        .book_appointment(request_at(ctx, test_date(), hour))
        .await
        .unwrap()
        .appointment_id
}

#[tokio::test]
async fn mark_completed_is_idempotent() {
    let ctx = setup().await;
    let id = book_at(&ctx, 9).await;

    let mut completions = ctx.events.subscribe();

    ctx.booking.mark_completed(&id).await.unwrap();
    ctx.booking.mark_completed(&id).await.unwrap();

    let appointment = ctx.booking.get_appointment(&id).await.unwrap();
    assert_eq!(appointment.status, AppointmentStatus::Completed);

    // Exactly one transition means exactly one event.
    let event = completions.recv().await.unwrap();
    assert_eq!(event.appointment_id, id);
    assert_eq!(event.patient_id, ctx.patient_id);
    assert_eq!(event.therapy_id, ctx.therapy_id);
    assert_matches!(completions.try_recv(), Err(_));
}

#[tokio::test]
async fn completed_is_terminal() {
    let ctx = setup().await;
    let id = book_at(&ctx, 9).await;
    ctx.booking.mark_completed(&id).await.unwrap();

    let cancel_err = ctx.booking.cancel_appointment(&id).await.unwrap_err();
    assert_matches!(
        cancel_err,
        SchedulingError::IllegalTransition {
            from: AppointmentStatus::Completed,
            ..
        }
    );

    let reschedule_err = ctx
        .booking
        .reschedule_appointment(
            &id,
            RescheduleRequest {
                new_date: test_date(),
                new_start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(
        reschedule_err,
        SchedulingError::IllegalTransition {
            from: AppointmentStatus::Completed,
            ..
        }
    );
}

#[tokio::test]
async fn cancelled_appointment_cannot_be_completed() {
    let ctx = setup().await;
    let id = book_at(&ctx, 9).await;
    ctx.booking.cancel_appointment(&id).await.unwrap();

    let err = ctx.booking.mark_completed(&id).await.unwrap_err();
    assert_matches!(
        err,
        SchedulingError::IllegalTransition {
            from: AppointmentStatus::Cancelled,
            attempted: AppointmentStatus::Completed,
        }
    );
}

#[tokio::test]
async fn cancel_is_idempotent_and_fires_no_event() {
    let ctx = setup().await;
    let id = book_at(&ctx, 9).await;

    let mut completions = ctx.events.subscribe();

    ctx.booking.cancel_appointment(&id).await.unwrap();
    ctx.booking.cancel_appointment(&id).await.unwrap();

    let appointment = ctx.booking.get_appointment(&id).await.unwrap();
    assert_eq!(appointment.status, AppointmentStatus::Cancelled);
    assert_matches!(completions.try_recv(), Err(_));
}

#[tokio::test]
async fn completing_an_unknown_appointment_fails() {
    let ctx = setup().await;

    let err = ctx.booking.mark_completed("APT-MISSING").await.unwrap_err();
    assert_matches!(err, SchedulingError::AppointmentNotFound);
}

#[tokio::test]
async fn reschedule_releases_the_old_slot() {
    let ctx = setup().await;
    let id = book_at(&ctx, 9).await;

    let moved = ctx
        .booking
        .reschedule_appointment(
            &id,
            RescheduleRequest {
                new_date: test_date(),
                new_start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            },
        )
        .await
        .unwrap();
    assert_ne!(moved.appointment_id, id);

    let old = ctx.booking.get_appointment(&id).await.unwrap();
    assert_eq!(old.status, AppointmentStatus::Rescheduled);

    // The vacated 09:00 slot is bookable again.
    ctx.booking
        .book_appointment(request_at(&ctx, test_date(), 9))
        .await
        .unwrap();
}

#[tokio::test]
async fn reschedule_into_its_own_slot_is_allowed() {
    let ctx = setup().await;
    let id = book_at(&ctx, 9).await;

    // Moving by less than the duration overlaps the record's own old
    // interval, which must not count against it.
    let moved = ctx
        .booking
        .reschedule_appointment(
            &id,
            RescheduleRequest {
                new_date: test_date(),
                new_start_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            },
        )
        .await
        .unwrap();

    assert_eq!(moved.start_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    assert_eq!(moved.end_time, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
}

#[tokio::test]
async fn rejected_reschedule_leaves_the_original_untouched() {
    let ctx = setup().await;
    let id = book_at(&ctx, 9).await;
    let other = book_at(&ctx, 11).await;

    let err = ctx
        .booking
        .reschedule_appointment(
            &id,
            RescheduleRequest {
                new_date: test_date(),
                new_start_time: NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(
        err,
        SchedulingError::SlotConflict { blocking_appointment_id } if blocking_appointment_id == other
    );

    // The original still holds its slot.
    let original = ctx.booking.get_appointment(&id).await.unwrap();
    assert_eq!(original.status, AppointmentStatus::Scheduled);

    let overlap_err = ctx
        .booking
        .book_appointment(request_at(&ctx, test_date(), 9))
        .await
        .unwrap_err();
    assert_matches!(overlap_err, SchedulingError::SlotConflict { .. });
}

#[tokio::test]
async fn rescheduled_record_is_a_released_husk() {
    let ctx = setup().await;
    let id = book_at(&ctx, 9).await;

    ctx.booking
        .reschedule_appointment(
            &id,
            RescheduleRequest {
                new_date: test_date(),
                new_start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            },
        )
        .await
        .unwrap();

    // The husk cannot be completed or moved again; cancelling it is a
    // no-op because its slot is already released.
    let complete_err = ctx.booking.mark_completed(&id).await.unwrap_err();
    assert_matches!(
        complete_err,
        SchedulingError::IllegalTransition {
            from: AppointmentStatus::Rescheduled,
            ..
        }
    );

    let reschedule_err = ctx
        .booking
        .reschedule_appointment(
            &id,
            RescheduleRequest {
                new_date: test_date(),
                new_start_time: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(
        reschedule_err,
        SchedulingError::IllegalTransition {
            from: AppointmentStatus::Rescheduled,
            ..
        }
    );

    ctx.booking.cancel_appointment(&id).await.unwrap();
}

#[tokio::test]
async fn storage_failure_during_reschedule_leaves_the_original_intact() {
    let ctx = setup_with_ledger(Arc::new(UnreliableLedger::failing_replaces(1))).await;
    let id = book_at(&ctx, 9).await;

    let move_to_afternoon = RescheduleRequest {
        new_date: test_date(),
        new_start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
    };

    let err = ctx
        .booking
        .reschedule_appointment(&id, move_to_afternoon.clone())
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::StorageUnavailable(_));

    // Nothing was applied: the original still holds its slot.
    let original = ctx.booking.get_appointment(&id).await.unwrap();
    assert_eq!(original.status, AppointmentStatus::Scheduled);

    let overlap_err = ctx
        .booking
        .book_appointment(request_at(&ctx, test_date(), 9))
        .await
        .unwrap_err();
    assert_matches!(overlap_err, SchedulingError::SlotConflict { .. });

    // The same logical request succeeds on retry.
    let moved = ctx
        .booking
        .reschedule_appointment(&id, move_to_afternoon)
        .await
        .unwrap();
    assert_eq!(moved.start_time, NaiveTime::from_hms_opt(14, 0, 0).unwrap());

    let released = ctx.booking.get_appointment(&id).await.unwrap();
    assert_eq!(released.status, AppointmentStatus::Rescheduled);
}

#[tokio::test]
async fn reschedule_honours_capacity_on_the_target_date() {
    let catalog = Arc::new(CatalogService::new());
    let patients = Arc::new(PatientService::new());
    let ledger: Arc<dyn AppointmentLedger> = Arc::new(InMemoryLedger::new());
    let events = Arc::new(CompletedEventBus::new(16));

    let therapy = catalog
        .create_therapy(CreateTherapyRequest {
            name: "Nasya".to_string(),
            description: None,
            duration_minutes: 30,
            cost: 1500.0,
            requires_resource: true,
            resource_quantity: 50,
        })
        .await
        .unwrap();
    let therapist = catalog
        .create_therapist(CreateTherapistRequest {
            full_name: "Anil Nair".to_string(),
            specialization: None,
            max_sessions_per_day: 1,
        })
        .await
        .unwrap();
    let patient = patients
        .register_patient(RegisterPatientRequest {
            full_name: "Sita Devi".to_string(),
            age: 35,
            gender: Gender::Female,
            phone: "9123456780".to_string(),
            email: None,
            medical_history: None,
            allergies: None,
            contraindications: None,
            dosha_profile: DoshaProfile::default(),
        })
        .await
        .unwrap();

    let booking = AppointmentBookingService::new(ledger, catalog, patients, events);

    let date_a = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
    let date_b = NaiveDate::from_ymd_opt(2026, 9, 2).unwrap();
    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();

    let request = |date: NaiveDate, start: NaiveTime| BookAppointmentRequest {
        patient_id: patient.id,
        therapist_id: therapist.id,
        therapy_id: therapy.id,
        date,
        start_time: start,
        notes: None,
        requested_by: "reception".to_string(),
    };

    let first = booking.book_appointment(request(date_a, nine)).await.unwrap();
    booking.book_appointment(request(date_b, nine)).await.unwrap();

    // Moving day A's appointment onto the fully-booked day B must fail,
    // even into a non-overlapping slot.
    let err = booking
        .reschedule_appointment(
            &first.appointment_id,
            RescheduleRequest {
                new_date: date_b,
                new_start_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::CapacityExceeded { limit: 1 });

    // Moving it within its own day excludes the record itself from the
    // capacity count.
    booking
        .reschedule_appointment(
            &first.appointment_id,
            RescheduleRequest {
                new_date: date_a,
                new_start_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            },
        )
        .await
        .unwrap();
}
