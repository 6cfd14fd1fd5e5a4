use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Soft-delete state of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Active,
    Deleted { at: DateTime<Utc> },
}

impl RecordStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, RecordStatus::Active)
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordStatus::Active => None,
            RecordStatus::Deleted { at } => Some(*at),
        }
    }
}

/// Rows arrive with a nullable `deleted_at` column.
impl From<Option<DateTime<Utc>>> for RecordStatus {
    fn from(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(at) => RecordStatus::Deleted { at },
            None => RecordStatus::Active,
        }
    }
}

/// Shared visibility predicate for every soft-deletable entity.
pub trait SoftDelete {
    fn record_status(&self) -> RecordStatus;

    fn is_visible(&self) -> bool {
        self.record_status().is_active()
    }
}
