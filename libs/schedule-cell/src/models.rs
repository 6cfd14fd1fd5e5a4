use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::{BranchOwned, RecordStatus, SoftDelete};

use crate::error::ScheduleError;

pub type ClinicId = i64;
pub type SlotId = i64;
pub type ScheduleId = i64;
pub type DoctorId = i64;
pub type SpecializationId = i64;

const DISPLAY_TIME_FORMAT: &str = "%I:%M %p";
const SLOT_TIME_FORMAT: &str = "%H:%M";

// ==============================================================================
// DOMAIN MODEL
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
    Sunday = 7,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn from_id(id: i64) -> Result<Self, ScheduleError> {
        Self::ALL
            .iter()
            .copied()
            .find(|day| day.id() == id)
            .ok_or(ScheduleError::DayNotFound(id))
    }

    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn name(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Half-open `[start, end)` interval within a single day.
///
/// Ordering is by start, then end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ScheduleError> {
        if start >= end {
            return Err(ScheduleError::InvalidSlot(format!(
                "start time {} must be before end time {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Extends the range to a new end. Only the merge routine calls this, and
    /// only with `end > self.end`.
    pub(crate) fn extend_to(&mut self, end: NaiveTime) {
        debug_assert!(end > self.end);
        self.end = end;
    }

    pub fn label(&self) -> RangeLabel {
        RangeLabel {
            start_time: self.start.format(DISPLAY_TIME_FORMAT).to_string(),
            end_time: self.end.format(DISPLAY_TIME_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Clinic {
    pub id: ClinicId,
    pub name: String,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub slot_duration_hours: i32,
    pub is_active: bool,
    pub branch_id: Option<i64>,
    pub status: RecordStatus,
}

impl Clinic {
    pub fn new(
        id: ClinicId,
        name: impl Into<String>,
        open_time: NaiveTime,
        close_time: NaiveTime,
        branch_id: Option<i64>,
    ) -> Result<Self, ScheduleError> {
        if open_time >= close_time {
            return Err(ScheduleError::InvalidClinic(format!(
                "clinic {} opens at {} but closes at {}",
                id, open_time, close_time
            )));
        }
        Ok(Self {
            id,
            name: name.into(),
            open_time,
            close_time,
            slot_duration_hours: 1,
            is_active: true,
            branch_id,
            status: RecordStatus::Active,
        })
    }

    pub fn contains(&self, range: &TimeRange) -> bool {
        self.open_time <= range.start() && range.end() <= self.close_time
    }
}

impl BranchOwned for Clinic {
    fn branch_id(&self) -> Option<i64> {
        self.branch_id
    }
}

impl SoftDelete for Clinic {
    fn record_status(&self) -> RecordStatus {
        self.status
    }
}

/// A bookable cell of a clinic's day. Can only be built against its clinic,
/// so a slot outside operating hours never exists.
#[derive(Debug, Clone)]
pub struct ClinicSlot {
    id: SlotId,
    clinic_id: ClinicId,
    range: TimeRange,
    is_active: bool,
    status: RecordStatus,
}

impl ClinicSlot {
    pub fn new(
        clinic: &Clinic,
        id: SlotId,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Self, ScheduleError> {
        let range = TimeRange::new(start_time, end_time)?;
        if !clinic.contains(&range) {
            return Err(ScheduleError::InvalidSlot(format!(
                "slot {} ({} - {}) must be within clinic hours: {} - {}",
                id, start_time, end_time, clinic.open_time, clinic.close_time
            )));
        }
        Ok(Self {
            id,
            clinic_id: clinic.id,
            range,
            is_active: true,
            status: RecordStatus::Active,
        })
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn clinic_id(&self) -> ClinicId {
        self.clinic_id
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Visible and switched on: the slots availability is computed for.
    pub fn is_bookable(&self) -> bool {
        self.is_active && self.is_visible()
    }
}

impl SoftDelete for ClinicSlot {
    fn record_status(&self) -> RecordStatus {
        self.status
    }
}

#[derive(Debug, Clone)]
pub struct Doctor {
    pub id: DoctorId,
    pub full_name: String,
    pub specialization_id: Option<SpecializationId>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub examination_price: f64,
    pub consultation_price: f64,
    pub is_active: bool,
    pub branch_id: Option<i64>,
    pub status: RecordStatus,
}

impl Doctor {
    pub fn new(id: DoctorId, full_name: impl Into<String>, branch_id: Option<i64>) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            specialization_id: None,
            phone_number: None,
            email: None,
            examination_price: 0.0,
            consultation_price: 0.0,
            is_active: true,
            branch_id,
            status: RecordStatus::Active,
        }
    }
}

impl BranchOwned for Doctor {
    fn branch_id(&self) -> Option<i64> {
        self.branch_id
    }
}

impl SoftDelete for Doctor {
    fn record_status(&self) -> RecordStatus {
        self.status
    }
}

/// Inclusive date range a schedule applies to; `to` of `None` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
    from: NaiveDate,
    to: Option<NaiveDate>,
}

impl Validity {
    pub fn new(from: NaiveDate, to: Option<NaiveDate>) -> Result<Self, ScheduleError> {
        if let Some(to) = to {
            if from > to {
                return Err(ScheduleError::InvalidSchedule(format!(
                    "valid_from {} must not be after valid_to {}",
                    from, to
                )));
            }
        }
        Ok(Self { from, to })
    }

    pub fn open_ended(from: NaiveDate) -> Self {
        Self { from, to: None }
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.from <= date && self.to.map_or(true, |to| date <= to)
    }
}

/// A doctor's recurring claim on clinic slots. Slots are referenced by id
/// only; they live in the snapshot arena.
#[derive(Debug, Clone)]
pub struct DoctorSchedule {
    pub id: ScheduleId,
    pub doctor_id: DoctorId,
    pub clinic_id: ClinicId,
    pub day: DayOfWeek,
    pub validity: Validity,
    pub is_active: bool,
    pub branch_id: Option<i64>,
    pub status: RecordStatus,
    pub slot_ids: BTreeSet<SlotId>,
}

impl DoctorSchedule {
    /// Active, not deleted, and valid on `date`.
    pub fn in_effect_on(&self, date: NaiveDate) -> bool {
        self.is_active && self.is_visible() && self.validity.covers(date)
    }

    pub fn claims(&self, slot_id: SlotId) -> bool {
        self.slot_ids.contains(&slot_id)
    }
}

impl BranchOwned for DoctorSchedule {
    fn branch_id(&self) -> Option<i64> {
        self.branch_id
    }
}

impl SoftDelete for DoctorSchedule {
    fn record_status(&self) -> RecordStatus {
        self.status
    }
}

// ==============================================================================
// DERIVED VIEWS
// ==============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SlotAvailability {
    pub slot_id: SlotId,
    pub clinic: String,
    pub range: TimeRange,
    pub is_available: bool,
    pub doctor_id: Option<DoctorId>,
    pub doctor_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleView {
    pub schedule_id: ScheduleId,
    pub clinic_id: ClinicId,
    pub clinic_name: String,
    pub doctor_id: DoctorId,
    pub doctor_name: String,
    pub day: DayOfWeek,
    pub ranges: Vec<TimeRange>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DaySchedules {
    pub day: DayOfWeek,
    pub schedules: Vec<ScheduleView>,
}

// ==============================================================================
// STORE ROWS (PostgREST)
// ==============================================================================

fn default_true() -> bool {
    true
}

fn default_slot_duration() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicRow {
    pub id: ClinicId,
    pub name: String,
    pub default_open_time: NaiveTime,
    pub default_close_time: NaiveTime,
    #[serde(default = "default_slot_duration")]
    pub slot_duration_hours: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub branch_id: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl BranchOwned for ClinicRow {
    fn branch_id(&self) -> Option<i64> {
        self.branch_id
    }
}

impl TryFrom<ClinicRow> for Clinic {
    type Error = ScheduleError;

    fn try_from(row: ClinicRow) -> Result<Self, Self::Error> {
        let mut clinic = Clinic::new(
            row.id,
            row.name,
            row.default_open_time,
            row.default_close_time,
            row.branch_id,
        )?;
        clinic.slot_duration_hours = row.slot_duration_hours;
        clinic.is_active = row.is_active;
        clinic.status = row.deleted_at.into();
        Ok(clinic)
    }
}

/// Branch of the owning clinic, embedded by `clinics!inner(branch_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicBranch {
    pub branch_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRow {
    pub id: SlotId,
    pub clinic_id: ClinicId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub clinics: Option<ClinicBranch>,
}

/// A slot row without the clinic embed belongs to no branch.
impl BranchOwned for SlotRow {
    fn branch_id(&self) -> Option<i64> {
        self.clinics.as_ref().and_then(|clinic| clinic.branch_id)
    }
}

impl SlotRow {
    pub fn into_slot(self, clinic: &Clinic) -> Result<ClinicSlot, ScheduleError> {
        let mut slot = ClinicSlot::new(clinic, self.id, self.start_time, self.end_time)?
            .with_status(self.deleted_at.into());
        if !self.is_active {
            slot = slot.deactivated();
        }
        Ok(slot)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotLink {
    pub clinic_slot_id: SlotId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub id: ScheduleId,
    pub doctor_id: DoctorId,
    pub clinic_id: ClinicId,
    pub day_of_week: i64,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub branch_id: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub doctor_schedule_slots: Vec<SlotLink>,
}

impl BranchOwned for ScheduleRow {
    fn branch_id(&self) -> Option<i64> {
        self.branch_id
    }
}

impl TryFrom<ScheduleRow> for DoctorSchedule {
    type Error = ScheduleError;

    fn try_from(row: ScheduleRow) -> Result<Self, Self::Error> {
        Ok(DoctorSchedule {
            id: row.id,
            doctor_id: row.doctor_id,
            clinic_id: row.clinic_id,
            day: DayOfWeek::from_id(row.day_of_week)?,
            validity: Validity::new(row.valid_from, row.valid_to)?,
            is_active: row.is_active,
            branch_id: row.branch_id,
            status: row.deleted_at.into(),
            slot_ids: row
                .doctor_schedule_slots
                .into_iter()
                .map(|link| link.clinic_slot_id)
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorRow {
    pub id: DoctorId,
    pub full_name: String,
    pub specialization_id: Option<SpecializationId>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub examination_price: f64,
    #[serde(default)]
    pub consultation_price: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub branch_id: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl BranchOwned for DoctorRow {
    fn branch_id(&self) -> Option<i64> {
        self.branch_id
    }
}

impl From<DoctorRow> for Doctor {
    fn from(row: DoctorRow) -> Self {
        Doctor {
            id: row.id,
            full_name: row.full_name,
            specialization_id: row.specialization_id,
            phone_number: row.phone_number,
            email: row.email,
            examination_price: row.examination_price,
            consultation_price: row.consultation_price,
            is_active: row.is_active,
            branch_id: row.branch_id,
            status: row.deleted_at.into(),
        }
    }
}

/// Everything one request fetched from the store, before scoping.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRows {
    pub clinics: Vec<ClinicRow>,
    pub slots: Vec<SlotRow>,
    pub schedules: Vec<ScheduleRow>,
    pub doctors: Vec<DoctorRow>,
}

// ==============================================================================
// RESPONSE DTOs
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeLabel {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotAvailabilityResponse {
    pub id: SlotId,
    pub clinic: String,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
    pub doctor_name: Option<String>,
}

impl From<&SlotAvailability> for SlotAvailabilityResponse {
    fn from(slot: &SlotAvailability) -> Self {
        Self {
            id: slot.slot_id,
            clinic: slot.clinic.clone(),
            start_time: slot.range.start().format(SLOT_TIME_FORMAT).to_string(),
            end_time: slot.range.end().format(SLOT_TIME_FORMAT).to_string(),
            is_available: slot.is_available,
            doctor_name: slot.doctor_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntryResponse {
    pub id: ScheduleId,
    pub clinic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<String>,
    pub day: String,
    pub day_id: i64,
    pub slots: Vec<RangeLabel>,
}

impl ScheduleEntryResponse {
    pub fn for_doctor(view: &ScheduleView) -> Self {
        Self {
            id: view.schedule_id,
            clinic: view.clinic_name.clone(),
            doctor: None,
            day: view.day.name().to_string(),
            day_id: view.day.id(),
            slots: view.ranges.iter().map(TimeRange::label).collect(),
        }
    }

    pub fn for_clinic(view: &ScheduleView) -> Self {
        Self {
            doctor: Some(view.doctor_name.clone()),
            ..Self::for_doctor(view)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedulesResponse {
    pub day_id: i64,
    pub day: String,
    pub schedules: Vec<ScheduleEntryResponse>,
}

impl From<&DaySchedules> for DaySchedulesResponse {
    fn from(group: &DaySchedules) -> Self {
        Self {
            day_id: group.day.id(),
            day: group.day.name().to_string(),
            schedules: group.schedules.iter().map(ScheduleEntryResponse::for_doctor).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicSlotResponse {
    pub id: SlotId,
    pub start_time: String,
    pub end_time: String,
}

impl From<&ClinicSlot> for ClinicSlotResponse {
    fn from(slot: &ClinicSlot) -> Self {
        Self {
            id: slot.id(),
            start_time: slot.range().start().format(SLOT_TIME_FORMAT).to_string(),
            end_time: slot.range().end().format(SLOT_TIME_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSummaryResponse {
    pub id: DoctorId,
    pub name: String,
    pub consultation_price: f64,
    pub examination_price: f64,
}

impl From<&Doctor> for DoctorSummaryResponse {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.full_name.clone(),
            consultation_price: doctor.consultation_price,
            examination_price: doctor.examination_price,
        }
    }
}
