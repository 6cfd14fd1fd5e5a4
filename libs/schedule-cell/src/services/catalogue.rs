use std::collections::BTreeSet;

use shared_models::SoftDelete;

use crate::error::ScheduleError;
use crate::models::{ClinicId, ClinicSlot, TimeRange};
use crate::services::snapshot::BranchSnapshot;

/// The clinic's time grid: visible slots, one per distinct time range,
/// earliest first. Of two slots with the same bounds the lower id is kept.
pub fn distinct_clinic_slots(
    snapshot: &BranchSnapshot,
    clinic_id: ClinicId,
) -> Result<Vec<&ClinicSlot>, ScheduleError> {
    snapshot.clinic(clinic_id)?;

    let mut seen: BTreeSet<TimeRange> = BTreeSet::new();
    Ok(snapshot
        .clinic_slots(clinic_id)
        .into_iter()
        .filter(|slot| slot.is_visible())
        .filter(|slot| seen.insert(slot.range()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};
    use shared_models::{BranchScope, RecordStatus};

    use crate::models::Clinic;

    #[test]
    fn test_distinct_slots_skip_duplicates_and_deleted() {
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let clinic = Clinic::new(1, "Dental", t(9), t(17), Some(1)).unwrap();
        let mut snapshot = BranchSnapshot::new(BranchScope::new(1));
        snapshot.insert_clinic(clinic.clone());
        snapshot.insert_slot(ClinicSlot::new(&clinic, 5, t(9), t(10)).unwrap());
        snapshot.insert_slot(ClinicSlot::new(&clinic, 2, t(9), t(10)).unwrap());
        snapshot.insert_slot(ClinicSlot::new(&clinic, 3, t(10), t(11)).unwrap());
        snapshot.insert_slot(
            ClinicSlot::new(&clinic, 4, t(11), t(12))
                .unwrap()
                .with_status(RecordStatus::Deleted { at: Utc::now() }),
        );

        let ids: Vec<i64> = distinct_clinic_slots(&snapshot, 1).unwrap().iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_foreign_clinic_is_not_found() {
        let snapshot = BranchSnapshot::new(BranchScope::new(1));
        assert!(matches!(distinct_clinic_slots(&snapshot, 3), Err(ScheduleError::ClinicNotFound(3))));
    }
}
