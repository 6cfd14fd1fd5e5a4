use std::collections::BTreeMap;

use tracing::warn;

use shared_models::{BranchScope, SoftDelete};

use crate::error::ScheduleError;
use crate::models::{
    Clinic, ClinicId, ClinicSlot, Doctor, DoctorId, DoctorSchedule, SlotId, SnapshotRows,
    SpecializationId,
};

/// Read-only, branch-scoped view of the scheduling tables for one request.
///
/// Slots live in a single arena keyed by id; schedules refer to them through
/// their `slot_ids` set. Nothing from another branch can be inserted.
#[derive(Debug, Clone)]
pub struct BranchSnapshot {
    scope: BranchScope,
    clinics: BTreeMap<ClinicId, Clinic>,
    slots: BTreeMap<SlotId, ClinicSlot>,
    schedules: BTreeMap<i64, DoctorSchedule>,
    doctors: BTreeMap<DoctorId, Doctor>,
}

impl BranchSnapshot {
    pub fn new(scope: BranchScope) -> Self {
        Self {
            scope,
            clinics: BTreeMap::new(),
            slots: BTreeMap::new(),
            schedules: BTreeMap::new(),
            doctors: BTreeMap::new(),
        }
    }

    /// Scopes and validates raw store rows. Foreign rows are dropped; an
    /// invalid row of this branch fails the whole snapshot.
    pub fn from_rows(scope: BranchScope, rows: SnapshotRows) -> Result<Self, ScheduleError> {
        let mut snapshot = Self::new(scope);

        for row in scope.retain(rows.clinics, "clinic") {
            snapshot.insert_clinic(Clinic::try_from(row)?);
        }

        for row in scope.retain(rows.slots, "clinic slot") {
            let Some(clinic) = snapshot.clinics.get(&row.clinic_id) else {
                warn!("Dropped slot {} of clinic {} outside branch {}", row.id, row.clinic_id, scope.branch_id());
                continue;
            };
            let slot = row.into_slot(clinic)?;
            snapshot.insert_slot(slot);
        }

        for row in scope.retain(rows.schedules, "doctor schedule") {
            snapshot.insert_schedule(DoctorSchedule::try_from(row)?);
        }

        for row in scope.retain(rows.doctors, "doctor") {
            snapshot.insert_doctor(Doctor::from(row));
        }

        Ok(snapshot)
    }

    pub fn insert_clinic(&mut self, clinic: Clinic) -> bool {
        if !self.scope.admits(&clinic) {
            warn!("Rejected clinic {} outside branch {}", clinic.id, self.scope.branch_id());
            return false;
        }
        self.clinics.insert(clinic.id, clinic);
        true
    }

    /// A slot belongs to the branch of its clinic, which must already be in
    /// the snapshot.
    pub fn insert_slot(&mut self, slot: ClinicSlot) -> bool {
        if !self.clinics.contains_key(&slot.clinic_id()) {
            warn!("Rejected slot {} of unknown clinic {}", slot.id(), slot.clinic_id());
            return false;
        }
        self.slots.insert(slot.id(), slot);
        true
    }

    pub fn insert_schedule(&mut self, schedule: DoctorSchedule) -> bool {
        if !self.scope.admits(&schedule) {
            warn!("Rejected doctor schedule {} outside branch {}", schedule.id, self.scope.branch_id());
            return false;
        }
        self.schedules.insert(schedule.id, schedule);
        true
    }

    pub fn insert_doctor(&mut self, doctor: Doctor) -> bool {
        if !self.scope.admits(&doctor) {
            warn!("Rejected doctor {} outside branch {}", doctor.id, self.scope.branch_id());
            return false;
        }
        self.doctors.insert(doctor.id, doctor);
        true
    }

    /// Visible clinic by id.
    pub fn clinic(&self, id: ClinicId) -> Result<&Clinic, ScheduleError> {
        self.clinics
            .get(&id)
            .filter(|clinic| clinic.is_visible())
            .ok_or(ScheduleError::ClinicNotFound(id))
    }

    /// Visible doctor by id.
    pub fn doctor(&self, id: DoctorId) -> Option<&Doctor> {
        self.doctors.get(&id).filter(|doctor| doctor.is_visible())
    }

    pub fn slot(&self, id: SlotId) -> Option<&ClinicSlot> {
        self.slots.get(&id)
    }

    /// All slots of a clinic ordered by start time, then id.
    pub fn clinic_slots(&self, clinic_id: ClinicId) -> Vec<&ClinicSlot> {
        let mut slots: Vec<&ClinicSlot> = self
            .slots
            .values()
            .filter(|slot| slot.clinic_id() == clinic_id)
            .collect();
        slots.sort_by_key(|slot| (slot.range(), slot.id()));
        slots
    }

    /// Schedules in ascending id order.
    pub fn schedules(&self) -> impl Iterator<Item = &DoctorSchedule> {
        self.schedules.values()
    }

    pub fn doctors_with_specialization(&self, specialization_id: SpecializationId) -> Vec<&Doctor> {
        self.doctors
            .values()
            .filter(|doctor| doctor.is_visible())
            .filter(|doctor| doctor.specialization_id == Some(specialization_id))
            .collect()
    }
}
