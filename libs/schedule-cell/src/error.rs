use thiserror::Error;

use shared_models::error::AppError;

use crate::models::{ClinicId, DoctorId};

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Clinic {0} not found")]
    ClinicNotFound(ClinicId),

    #[error("Day of week {0} not found")]
    DayNotFound(i64),

    #[error("Doctor {0} not found")]
    DoctorNotFound(DoctorId),

    #[error("Invalid clinic: {0}")]
    InvalidClinic(String),

    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::ClinicNotFound(_)
            | ScheduleError::DayNotFound(_)
            | ScheduleError::DoctorNotFound(_) => AppError::NotFound(err.to_string()),
            ScheduleError::InvalidClinic(_)
            | ScheduleError::InvalidSlot(_)
            | ScheduleError::InvalidSchedule(_) => AppError::ValidationError(err.to_string()),
            ScheduleError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}
