use chrono::NaiveDate;
use tracing::debug;

use shared_models::SoftDelete;

use crate::error::ScheduleError;
use crate::models::{ClinicId, DaySchedules, DoctorId, DoctorSchedule, ScheduleView};
use crate::services::merge::merge_contiguous;
use crate::services::snapshot::BranchSnapshot;

/// Merged weekly schedule of one doctor, ordered by day then schedule id.
pub fn doctor_schedule(
    snapshot: &BranchSnapshot,
    doctor_id: DoctorId,
    reference_date: NaiveDate,
) -> Result<Vec<ScheduleView>, ScheduleError> {
    if snapshot.doctor(doctor_id).is_none() {
        return Err(ScheduleError::DoctorNotFound(doctor_id));
    }

    let views = collect_views(snapshot, reference_date, |schedule| schedule.doctor_id == doctor_id);
    debug!("Doctor {} has {} schedule(s) in effect on {}", doctor_id, views.len(), reference_date);
    Ok(views)
}

/// Merged weekly schedule of every doctor working at a clinic. Schedules of
/// deleted doctors are left out.
pub fn clinic_schedule(
    snapshot: &BranchSnapshot,
    clinic_id: ClinicId,
    reference_date: NaiveDate,
) -> Result<Vec<ScheduleView>, ScheduleError> {
    snapshot.clinic(clinic_id)?;

    let views = collect_views(snapshot, reference_date, |schedule| schedule.clinic_id == clinic_id);
    debug!("Clinic {} has {} schedule(s) in effect on {}", clinic_id, views.len(), reference_date);
    Ok(views)
}

/// Buckets views by day, keeping only days that have something.
pub fn group_by_day(views: Vec<ScheduleView>) -> Vec<DaySchedules> {
    let mut groups: Vec<DaySchedules> = Vec::new();
    for view in views {
        match groups.last_mut() {
            Some(group) if group.day == view.day => group.schedules.push(view),
            _ => groups.push(DaySchedules {
                day: view.day,
                schedules: vec![view],
            }),
        }
    }
    groups
}

fn collect_views<F>(snapshot: &BranchSnapshot, reference_date: NaiveDate, keep: F) -> Vec<ScheduleView>
where
    F: Fn(&DoctorSchedule) -> bool,
{
    let mut views: Vec<ScheduleView> = snapshot
        .schedules()
        .filter(|schedule| keep(schedule))
        .filter(|schedule| schedule.in_effect_on(reference_date))
        .filter_map(|schedule| view_of(snapshot, schedule))
        .collect();

    views.sort_by_key(|view| (view.day, view.schedule_id));
    views
}

/// Merges one schedule's own slots. Slots are never merged across schedules.
fn view_of(snapshot: &BranchSnapshot, schedule: &DoctorSchedule) -> Option<ScheduleView> {
    let doctor = snapshot.doctor(schedule.doctor_id)?;
    let clinic = snapshot.clinic(schedule.clinic_id).ok()?;

    let ranges = merge_contiguous(
        schedule
            .slot_ids
            .iter()
            .filter_map(|id| snapshot.slot(*id))
            .filter(|slot| slot.clinic_id() == schedule.clinic_id)
            .filter(|slot| slot.is_visible())
            .map(|slot| slot.range()),
    );

    Some(ScheduleView {
        schedule_id: schedule.id,
        clinic_id: clinic.id,
        clinic_name: clinic.name.clone(),
        doctor_id: doctor.id,
        doctor_name: doctor.full_name.clone(),
        day: schedule.day,
        ranges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use chrono::{NaiveTime, Utc};
    use shared_models::{BranchScope, RecordStatus};

    use crate::models::{Clinic, ClinicSlot, DayOfWeek, Doctor, TimeRange, Validity};

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn schedule(id: i64, doctor_id: i64, day: DayOfWeek, slots: &[i64]) -> DoctorSchedule {
        DoctorSchedule {
            id,
            doctor_id,
            clinic_id: 1,
            day,
            validity: Validity::open_ended(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            is_active: true,
            branch_id: Some(1),
            status: RecordStatus::Active,
            slot_ids: slots.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn snapshot() -> BranchSnapshot {
        let clinic = Clinic::new(1, "Dental", t(9), t(17), Some(1)).unwrap();
        let mut snapshot = BranchSnapshot::new(BranchScope::new(1));
        snapshot.insert_clinic(clinic.clone());
        for (id, hour) in [(1, 9), (2, 10), (3, 11), (4, 13), (5, 14)] {
            snapshot.insert_slot(ClinicSlot::new(&clinic, id, t(hour), t(hour + 1)).unwrap());
        }
        snapshot.insert_doctor(Doctor::new(7, "Dr. Salma", Some(1)));
        snapshot.insert_doctor(Doctor::new(8, "Dr. Omar", Some(1)));
        snapshot
    }

    #[test]
    fn test_doctor_schedule_merges_per_schedule_and_orders_by_day() {
        let mut snapshot = snapshot();
        snapshot.insert_schedule(schedule(1, 7, DayOfWeek::Wednesday, &[4, 5]));
        snapshot.insert_schedule(schedule(2, 7, DayOfWeek::Monday, &[1, 2, 4]));
        snapshot.insert_schedule(schedule(3, 8, DayOfWeek::Monday, &[3]));

        let views = doctor_schedule(&snapshot, 7, today()).unwrap();
        assert_eq!(views.len(), 2);

        assert_eq!(views[0].day, DayOfWeek::Monday);
        assert_eq!(
            views[0].ranges,
            vec![TimeRange::new(t(9), t(11)).unwrap(), TimeRange::new(t(13), t(14)).unwrap()]
        );
        assert_eq!(views[1].day, DayOfWeek::Wednesday);
        assert_eq!(views[1].ranges, vec![TimeRange::new(t(13), t(15)).unwrap()]);
    }

    #[test]
    fn test_adjacent_slots_of_different_schedules_do_not_merge() {
        let mut snapshot = snapshot();
        snapshot.insert_schedule(schedule(1, 7, DayOfWeek::Monday, &[1]));
        snapshot.insert_schedule(schedule(2, 8, DayOfWeek::Monday, &[2]));

        let views = clinic_schedule(&snapshot, 1, today()).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].ranges, vec![TimeRange::new(t(9), t(10)).unwrap()]);
        assert_eq!(views[1].ranges, vec![TimeRange::new(t(10), t(11)).unwrap()]);
    }

    #[test]
    fn test_slot_of_another_clinic_is_left_out_of_ranges() {
        let mut snapshot = snapshot();
        let derma = Clinic::new(2, "Derma", t(9), t(17), Some(1)).unwrap();
        snapshot.insert_clinic(derma.clone());
        snapshot.insert_slot(ClinicSlot::new(&derma, 6, t(10), t(11)).unwrap());
        snapshot.insert_schedule(schedule(1, 7, DayOfWeek::Monday, &[1, 6]));

        let views = doctor_schedule(&snapshot, 7, today()).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].clinic_id, 1);
        assert_eq!(views[0].ranges, vec![TimeRange::new(t(9), t(10)).unwrap()]);
    }

    #[test]
    fn test_deleted_doctor_not_found_and_hidden_from_clinic() {
        let mut snapshot = snapshot();
        let mut gone = Doctor::new(7, "Dr. Salma", Some(1));
        gone.status = RecordStatus::Deleted { at: Utc::now() };
        snapshot.insert_doctor(gone);
        snapshot.insert_schedule(schedule(1, 7, DayOfWeek::Monday, &[1]));
        snapshot.insert_schedule(schedule(2, 8, DayOfWeek::Monday, &[2]));

        assert!(matches!(doctor_schedule(&snapshot, 7, today()), Err(ScheduleError::DoctorNotFound(7))));
        let views = clinic_schedule(&snapshot, 1, today()).unwrap();
        assert_eq!(views.iter().map(|v| v.doctor_id).collect::<Vec<_>>(), vec![8]);
    }

    #[test]
    fn test_schedules_not_in_effect_are_skipped() {
        let mut snapshot = snapshot();
        let mut future = schedule(1, 7, DayOfWeek::Monday, &[1]);
        future.validity = Validity::open_ended(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        snapshot.insert_schedule(future);

        assert!(doctor_schedule(&snapshot, 7, today()).unwrap().is_empty());
    }

    #[test]
    fn test_group_by_day() {
        let mut snapshot = snapshot();
        snapshot.insert_schedule(schedule(1, 7, DayOfWeek::Monday, &[1]));
        snapshot.insert_schedule(schedule(2, 7, DayOfWeek::Monday, &[4]));
        snapshot.insert_schedule(schedule(3, 7, DayOfWeek::Friday, &[2]));

        let groups = group_by_day(doctor_schedule(&snapshot, 7, today()).unwrap());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].day, DayOfWeek::Monday);
        assert_eq!(groups[0].schedules.len(), 2);
        assert_eq!(groups[1].day, DayOfWeek::Friday);
    }
}
