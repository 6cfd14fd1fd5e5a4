use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::debug;

use shared_config::AppConfig;
use shared_models::BranchScope;

use crate::error::ScheduleError;
use crate::models::{
    ClinicId, ClinicSlot, DayOfWeek, DaySchedules, Doctor, DoctorId, ScheduleView,
    SlotAvailability, SnapshotRows, SpecializationId,
};
use crate::services::availability::resolve_availability;
use crate::services::catalogue::distinct_clinic_slots;
use crate::services::snapshot::BranchSnapshot;
use crate::services::store::{DoctorFilter, ScheduleFilter, ScheduleStore, SupabaseScheduleStore};
use crate::services::weekly;

/// Fetches the branch's scheduling rows and runs the pure resolvers on them.
pub struct ScheduleService<S: ScheduleStore = SupabaseScheduleStore> {
    store: S,
}

impl ScheduleService<SupabaseScheduleStore> {
    pub fn new(config: &AppConfig, auth_token: &str) -> Self {
        Self {
            store: SupabaseScheduleStore::new(config, auth_token),
        }
    }
}

impl<S: ScheduleStore> ScheduleService<S> {
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    /// Free/taken state of every bookable slot of a clinic on a weekday.
    pub async fn slot_availability(
        &self,
        scope: BranchScope,
        clinic_id: ClinicId,
        day_of_week_id: i64,
        reference_date: NaiveDate,
    ) -> Result<Vec<SlotAvailability>, ScheduleError> {
        let day = DayOfWeek::from_id(day_of_week_id)?;
        debug!("Slot availability for clinic {} on {} (branch {})", clinic_id, day, scope.branch_id());

        let clinics = self.store.clinics(&scope, &[clinic_id]).await?;
        if clinics.is_empty() {
            return Err(ScheduleError::ClinicNotFound(clinic_id));
        }

        let slots = self.store.clinic_slots(&scope, &[clinic_id]).await?;
        let schedules = self
            .store
            .schedules(&scope, &ScheduleFilter {
                clinic_id: Some(clinic_id),
                day: Some(day),
                ..Default::default()
            })
            .await?;
        let doctors = self.doctors_for(&scope, schedules.iter().map(|s| s.doctor_id)).await?;

        let snapshot = BranchSnapshot::from_rows(scope, SnapshotRows {
            clinics,
            slots,
            schedules,
            doctors,
        })?;

        resolve_availability(&snapshot, clinic_id, day, reference_date)
    }

    /// A doctor's in-effect schedules with merged slot ranges.
    pub async fn doctor_schedule(
        &self,
        scope: BranchScope,
        doctor_id: DoctorId,
        reference_date: NaiveDate,
    ) -> Result<Vec<ScheduleView>, ScheduleError> {
        debug!("Weekly schedule of doctor {} (branch {})", doctor_id, scope.branch_id());

        let doctors = self.doctors_for(&scope, std::iter::once(doctor_id)).await?;
        if doctors.is_empty() {
            return Err(ScheduleError::DoctorNotFound(doctor_id));
        }

        let schedules = self
            .store
            .schedules(&scope, &ScheduleFilter {
                doctor_id: Some(doctor_id),
                ..Default::default()
            })
            .await?;

        let clinic_ids: Vec<ClinicId> = schedules
            .iter()
            .map(|s| s.clinic_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let clinics = self.store.clinics(&scope, &clinic_ids).await?;
        let slots = self.store.clinic_slots(&scope, &clinic_ids).await?;

        let snapshot = BranchSnapshot::from_rows(scope, SnapshotRows {
            clinics,
            slots,
            schedules,
            doctors,
        })?;

        weekly::doctor_schedule(&snapshot, doctor_id, reference_date)
    }

    /// Same as [`Self::doctor_schedule`], bucketed by weekday.
    pub async fn doctor_week(
        &self,
        scope: BranchScope,
        doctor_id: DoctorId,
        reference_date: NaiveDate,
    ) -> Result<Vec<DaySchedules>, ScheduleError> {
        let views = self.doctor_schedule(scope, doctor_id, reference_date).await?;
        Ok(weekly::group_by_day(views))
    }

    pub async fn clinic_schedule(
        &self,
        scope: BranchScope,
        clinic_id: ClinicId,
        reference_date: NaiveDate,
    ) -> Result<Vec<ScheduleView>, ScheduleError> {
        debug!("Weekly schedule of clinic {} (branch {})", clinic_id, scope.branch_id());

        let clinics = self.store.clinics(&scope, &[clinic_id]).await?;
        if clinics.is_empty() {
            return Err(ScheduleError::ClinicNotFound(clinic_id));
        }

        let slots = self.store.clinic_slots(&scope, &[clinic_id]).await?;
        let schedules = self
            .store
            .schedules(&scope, &ScheduleFilter {
                clinic_id: Some(clinic_id),
                ..Default::default()
            })
            .await?;
        let doctors = self.doctors_for(&scope, schedules.iter().map(|s| s.doctor_id)).await?;

        let snapshot = BranchSnapshot::from_rows(scope, SnapshotRows {
            clinics,
            slots,
            schedules,
            doctors,
        })?;

        weekly::clinic_schedule(&snapshot, clinic_id, reference_date)
    }

    pub async fn clinic_time_slots(
        &self,
        scope: BranchScope,
        clinic_id: ClinicId,
    ) -> Result<Vec<ClinicSlot>, ScheduleError> {
        let clinics = self.store.clinics(&scope, &[clinic_id]).await?;
        let slots = self.store.clinic_slots(&scope, &[clinic_id]).await?;

        let snapshot = BranchSnapshot::from_rows(scope, SnapshotRows {
            clinics,
            slots,
            ..Default::default()
        })?;

        Ok(distinct_clinic_slots(&snapshot, clinic_id)?
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn doctors_by_specialization(
        &self,
        scope: BranchScope,
        specialization_id: SpecializationId,
    ) -> Result<Vec<Doctor>, ScheduleError> {
        let doctors = self
            .store
            .doctors(&scope, &DoctorFilter {
                specialization_id: Some(specialization_id),
                ..Default::default()
            })
            .await?;

        let snapshot = BranchSnapshot::from_rows(scope, SnapshotRows {
            doctors,
            ..Default::default()
        })?;

        Ok(snapshot
            .doctors_with_specialization(specialization_id)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn doctors_for(
        &self,
        scope: &BranchScope,
        ids: impl Iterator<Item = DoctorId>,
    ) -> Result<Vec<crate::models::DoctorRow>, ScheduleError> {
        let ids: Vec<DoctorId> = ids.collect::<BTreeSet<_>>().into_iter().collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .store
            .doctors(scope, &DoctorFilter {
                ids: Some(ids),
                ..Default::default()
            })
            .await?)
    }
}
