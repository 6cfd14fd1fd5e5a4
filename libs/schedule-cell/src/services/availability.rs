use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::ScheduleError;
use crate::models::{ClinicId, DayOfWeek, DoctorSchedule, SlotAvailability};
use crate::services::snapshot::BranchSnapshot;

/// Classifies every bookable slot of `clinic_id` as free or taken on `day`,
/// using the schedules in effect on `reference_date`.
///
/// When several schedules claim the same slot the lowest schedule id wins and
/// the collision is logged. A claim by a deleted doctor does not count.
pub fn resolve_availability(
    snapshot: &BranchSnapshot,
    clinic_id: ClinicId,
    day: DayOfWeek,
    reference_date: NaiveDate,
) -> Result<Vec<SlotAvailability>, ScheduleError> {
    let clinic = snapshot.clinic(clinic_id)?;

    let candidates: Vec<&DoctorSchedule> = snapshot
        .schedules()
        .filter(|schedule| schedule.clinic_id == clinic_id)
        .filter(|schedule| schedule.day == day)
        .filter(|schedule| schedule.in_effect_on(reference_date))
        .collect();

    debug!(
        "Resolving availability for clinic {} on {} ({}): {} schedule(s) in effect",
        clinic_id, day, reference_date, candidates.len()
    );

    let availability = snapshot
        .clinic_slots(clinic_id)
        .into_iter()
        .filter(|slot| slot.is_bookable())
        .map(|slot| {
            let mut claims = candidates.iter().filter(|schedule| schedule.claims(slot.id()));
            let first = claims.next();

            let extra: Vec<i64> = claims.map(|schedule| schedule.id).collect();
            if let Some(winner) = first {
                if !extra.is_empty() {
                    warn!(
                        "Slot {} of clinic {} on {} is claimed by schedule {} and also by {:?}",
                        slot.id(), clinic_id, day, winner.id, extra
                    );
                }
            }

            let occupant = first.and_then(|schedule| snapshot.doctor(schedule.doctor_id));

            SlotAvailability {
                slot_id: slot.id(),
                clinic: clinic.name.clone(),
                range: slot.range(),
                is_available: occupant.is_none(),
                doctor_id: occupant.map(|doctor| doctor.id),
                doctor_name: occupant.map(|doctor| doctor.full_name.clone()),
            }
        })
        .collect();

    Ok(availability)
}
