use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;
use shared_models::{BranchOwned, RecordStatus, SoftDelete};

pub type DoctorId = i64;

pub const COMPLETED_STATUS: &str = "Completed";

fn default_true() -> bool {
    true
}

// ==============================================================================
// STORE ROWS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRow {
    pub id: i64,
    pub branch_id: Option<i64>,
    pub added_date: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl PatientRow {
    /// Calendar day (UTC) the patient was registered on.
    pub fn added_on(&self) -> Option<NaiveDate> {
        self.added_date.map(|at| at.date_naive())
    }
}

/// Embedded by `status:statuses(name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusName {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRow {
    pub id: i64,
    pub branch_id: Option<i64>,
    pub patient_id: i64,
    pub doctor_id: DoctorId,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub status: Option<StatusName>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AppointmentRow {
    pub fn status_name(&self) -> Option<&str> {
        self.status.as_ref().map(|status| status.name.as_str())
    }

    pub fn is_completed(&self) -> bool {
        self.status_name() == Some(COMPLETED_STATUS)
    }
}

/// Branch of the invoiced appointment, embedded by `appointments!inner(branch_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentBranch {
    pub branch_id: Option<i64>,
}

/// Invoices have no branch column; they belong to the branch of their
/// appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRow {
    pub id: i64,
    pub appointment_id: Option<i64>,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub appointments: Option<AppointmentBranch>,
}

impl BranchOwned for InvoiceRow {
    fn branch_id(&self) -> Option<i64> {
        self.appointments.as_ref().and_then(|appointment| appointment.branch_id)
    }
}

/// Just enough of a doctor row to count and scope it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorStatusRow {
    pub id: DoctorId,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub branch_id: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
}

macro_rules! soft_delete_row {
    ($($row:ty),+) => {
        $(
            impl SoftDelete for $row {
                fn record_status(&self) -> RecordStatus {
                    self.deleted_at.into()
                }
            }
        )+
    };
}

macro_rules! branch_row {
    ($($row:ty),+) => {
        $(
            impl BranchOwned for $row {
                fn branch_id(&self) -> Option<i64> {
                    self.branch_id
                }
            }
        )+
        soft_delete_row!($($row),+);
    };
}

branch_row!(PatientRow, AppointmentRow, DoctorStatusRow);
soft_delete_row!(InvoiceRow);

/// Everything the branch dashboard reads, before scoping.
#[derive(Debug, Clone, Default)]
pub struct DashboardRows {
    pub patients: Vec<PatientRow>,
    pub appointments: Vec<AppointmentRow>,
    pub invoices: Vec<InvoiceRow>,
    pub doctors: Vec<DoctorStatusRow>,
}

// ==============================================================================
// RESPONSES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_patients_count: usize,
    pub patients_this_month: usize,
    pub patients_last_month: usize,
    pub patients_growth_rate: f64,

    pub appointments_this_week: usize,
    pub appointments_today: usize,
    pub active_doctors_count: usize,

    pub total_income: f64,
    pub income_this_week: f64,
    pub income_last_week: f64,
    pub income_growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorStats {
    pub doctor_id: DoctorId,
    pub total_patients: usize,
    pub total_appointments: usize,
    pub completed_appointments: usize,
    pub total_revenue: f64,
}

/// One entry of a doctor's appointment history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentSummary {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: DoctorId,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub status: Option<String>,
}

impl From<&AppointmentRow> for AppointmentSummary {
    fn from(row: &AppointmentRow) -> Self {
        Self {
            id: row.id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            date: row.date,
            time: row.time,
            status: row.status_name().map(str::to_string),
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Doctor {0} not found")]
    DoctorNotFound(DoctorId),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::DoctorNotFound(_) => AppError::NotFound(err.to_string()),
            DashboardError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}
