// libs/schedule-cell/tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use schedule_cell::models::{ClinicId, ClinicRow, DoctorRow, ScheduleRow, SlotRow};
use schedule_cell::services::{DoctorFilter, ScheduleFilter, ScheduleStore};
use shared_models::{BranchOwned, BranchScope};

/// Store backed by plain row vectors. With `ignore_branch` set it hands back
/// every row regardless of the caller's branch, like a misconfigured query.
#[derive(Default)]
pub struct InMemoryScheduleStore {
    pub clinics: Vec<ClinicRow>,
    pub slots: Vec<SlotRow>,
    pub schedules: Vec<ScheduleRow>,
    pub doctors: Vec<DoctorRow>,
    pub ignore_branch: bool,
    pub calls: Mutex<Vec<String>>,
}

fn rows<T: serde::de::DeserializeOwned>(values: Vec<Value>) -> Vec<T> {
    values
        .into_iter()
        .map(|value| serde_json::from_value(value).unwrap())
        .collect()
}

impl InMemoryScheduleStore {
    pub fn new(clinics: Vec<Value>, slots: Vec<Value>, schedules: Vec<Value>, doctors: Vec<Value>) -> Self {
        Self {
            clinics: rows(clinics),
            slots: rows(slots),
            schedules: rows(schedules),
            doctors: rows(doctors),
            ..Default::default()
        }
    }

    pub fn leaky(mut self) -> Self {
        self.ignore_branch = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn in_branch(&self, scope: &BranchScope, branch_id: Option<i64>) -> bool {
        self.ignore_branch || branch_id == Some(scope.branch_id())
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn clinics(&self, scope: &BranchScope, ids: &[ClinicId]) -> Result<Vec<ClinicRow>> {
        self.record("clinics");
        Ok(self
            .clinics
            .iter()
            .filter(|row| ids.contains(&row.id))
            .filter(|row| self.in_branch(scope, row.branch_id))
            .cloned()
            .collect())
    }

    async fn clinic_slots(&self, scope: &BranchScope, clinic_ids: &[ClinicId]) -> Result<Vec<SlotRow>> {
        self.record("clinic_slots");
        Ok(self
            .slots
            .iter()
            .filter(|row| clinic_ids.contains(&row.clinic_id))
            .filter(|row| self.in_branch(scope, row.branch_id()))
            .cloned()
            .collect())
    }

    async fn schedules(&self, scope: &BranchScope, filter: &ScheduleFilter) -> Result<Vec<ScheduleRow>> {
        self.record("schedules");
        Ok(self
            .schedules
            .iter()
            .filter(|row| self.in_branch(scope, row.branch_id))
            .filter(|row| filter.clinic_id.map_or(true, |id| row.clinic_id == id))
            .filter(|row| filter.doctor_id.map_or(true, |id| row.doctor_id == id))
            .filter(|row| filter.day.map_or(true, |day| row.day_of_week == day.id()))
            .cloned()
            .collect())
    }

    async fn doctors(&self, scope: &BranchScope, filter: &DoctorFilter) -> Result<Vec<DoctorRow>> {
        self.record("doctors");
        Ok(self
            .doctors
            .iter()
            .filter(|row| self.in_branch(scope, row.branch_id))
            .filter(|row| filter.ids.as_ref().map_or(true, |ids| ids.contains(&row.id)))
            .filter(|row| {
                filter
                    .specialization_id
                    .map_or(true, |id| row.specialization_id == Some(id))
            })
            .cloned()
            .collect())
    }
}
