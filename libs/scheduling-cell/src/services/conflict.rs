// libs/scheduling-cell/src/services/conflict.rs
use chrono::NaiveTime;

use crate::models::Appointment;

/// Pure overlap detection over one therapist's appointments for one date.
/// The caller supplies the candidate day's appointments (already scoped by
/// therapist and date) so no ledger-wide scan ever happens here.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Find the first existing appointment whose interval overlaps the
    /// candidate. Cancelled and Rescheduled records never block, and
    /// `exclude_appointment_id` lets a reschedule ignore the record it is
    /// replacing.
    pub fn find_conflict<'a>(
        existing: &'a [Appointment],
        candidate_start: NaiveTime,
        candidate_end: NaiveTime,
        exclude_appointment_id: Option<&str>,
    ) -> Option<&'a Appointment> {
        existing.iter().find(|apt| {
            if !apt.status.blocks_slot() {
                return false;
            }
            if exclude_appointment_id == Some(apt.id.as_str()) {
                return false;
            }
            let (start, end) = apt.interval();
            intervals_overlap(start, end, candidate_start, candidate_end)
        })
    }

    /// How many appointments still hold a slot on this day, for the
    /// capacity ceiling. Back-to-back bookings each count even though they
    /// never overlap.
    pub fn blocking_count(existing: &[Appointment], exclude_appointment_id: Option<&str>) -> usize {
        existing
            .iter()
            .filter(|apt| {
                apt.status.blocks_slot() && exclude_appointment_id != Some(apt.id.as_str())
            })
            .count()
    }
}

/// Half-open interval overlap: `[s, e)` and `[candidate_start,
/// candidate_end)` overlap iff `s < candidate_end && candidate_start < e`.
/// Touching endpoints are not an overlap, so back-to-back slots are legal.
fn intervals_overlap(
    s: NaiveTime,
    e: NaiveTime,
    candidate_start: NaiveTime,
    candidate_end: NaiveTime,
) -> bool {
    s < candidate_end && candidate_start < e
}
