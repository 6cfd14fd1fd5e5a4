use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::BranchScope;

use crate::models::{
    ClinicId, ClinicRow, DayOfWeek, DoctorId, DoctorRow, ScheduleRow, SlotRow, SpecializationId,
};

#[derive(Debug, Clone, Default)]
pub struct ScheduleFilter {
    pub clinic_id: Option<ClinicId>,
    pub doctor_id: Option<DoctorId>,
    pub day: Option<DayOfWeek>,
}

#[derive(Debug, Clone, Default)]
pub struct DoctorFilter {
    pub ids: Option<Vec<DoctorId>>,
    pub specialization_id: Option<SpecializationId>,
}

/// Read side of the scheduling tables. Every method takes the caller's branch;
/// implementations must apply it to the query itself.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn clinics(&self, scope: &BranchScope, ids: &[ClinicId]) -> Result<Vec<ClinicRow>>;

    async fn clinic_slots(&self, scope: &BranchScope, clinic_ids: &[ClinicId]) -> Result<Vec<SlotRow>>;

    async fn schedules(&self, scope: &BranchScope, filter: &ScheduleFilter) -> Result<Vec<ScheduleRow>>;

    async fn doctors(&self, scope: &BranchScope, filter: &DoctorFilter) -> Result<Vec<DoctorRow>>;
}

fn id_list<T: ToString>(ids: &[T]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

pub struct SupabaseScheduleStore {
    supabase: SupabaseClient,
    auth_token: String,
}

impl SupabaseScheduleStore {
    pub fn new(config: &AppConfig, auth_token: &str) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            auth_token: auth_token.to_string(),
        }
    }
}

#[async_trait]
impl ScheduleStore for SupabaseScheduleStore {
    async fn clinics(&self, scope: &BranchScope, ids: &[ClinicId]) -> Result<Vec<ClinicRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let path = format!("/rest/v1/clinics?{}&id=in.({})", scope.filter(), id_list(ids));
        debug!("Fetching clinics {:?} for branch {}", ids, scope.branch_id());

        self.supabase.request(Method::GET, &path, Some(&self.auth_token), None).await
    }

    async fn clinic_slots(&self, scope: &BranchScope, clinic_ids: &[ClinicId]) -> Result<Vec<SlotRow>> {
        if clinic_ids.is_empty() {
            return Ok(Vec::new());
        }
        // Slots have no branch column; scope through the owning clinic.
        let path = format!(
            "/rest/v1/clinic_slots?select=*,clinics!inner(branch_id)&clinics.branch_id=eq.{}&clinic_id=in.({})&order=start_time.asc",
            scope.branch_id(),
            id_list(clinic_ids)
        );
        debug!("Fetching slots of clinics {:?} for branch {}", clinic_ids, scope.branch_id());

        self.supabase.request(Method::GET, &path, Some(&self.auth_token), None).await
    }

    async fn schedules(&self, scope: &BranchScope, filter: &ScheduleFilter) -> Result<Vec<ScheduleRow>> {
        let mut path = format!(
            "/rest/v1/doctor_schedules?select=*,doctor_schedule_slots(clinic_slot_id)&{}",
            scope.filter()
        );
        if let Some(clinic_id) = filter.clinic_id {
            path.push_str(&format!("&clinic_id=eq.{}", clinic_id));
        }
        if let Some(doctor_id) = filter.doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", doctor_id));
        }
        if let Some(day) = filter.day {
            path.push_str(&format!("&day_of_week=eq.{}", day.id()));
        }
        path.push_str("&order=id.asc");
        debug!("Fetching doctor schedules for branch {} with {:?}", scope.branch_id(), filter);

        self.supabase.request(Method::GET, &path, Some(&self.auth_token), None).await
    }

    async fn doctors(&self, scope: &BranchScope, filter: &DoctorFilter) -> Result<Vec<DoctorRow>> {
        let mut path = format!("/rest/v1/doctors?{}", scope.filter());
        if let Some(ids) = &filter.ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            path.push_str(&format!("&id=in.({})", id_list(ids)));
        }
        if let Some(specialization_id) = filter.specialization_id {
            path.push_str(&format!("&specialization_id=eq.{}", specialization_id));
        }
        path.push_str("&order=id.asc");
        debug!("Fetching doctors for branch {} with {:?}", scope.branch_id(), filter);

        self.supabase.request(Method::GET, &path, Some(&self.auth_token), None).await
    }
}
