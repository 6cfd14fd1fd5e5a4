use anyhow::Result;
use chrono::NaiveDate;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::{BranchOwned, BranchScope, SoftDelete};

use crate::models::{
    AppointmentRow, AppointmentSummary, DashboardError, DashboardRows, DashboardSummary, DoctorId,
    DoctorStats, DoctorStatusRow, InvoiceRow, PatientRow,
};
use crate::services::stats;

/// Embeds the status name in place of the `status_id` foreign key.
const APPOINTMENT_SELECT: &str = "&select=*,status:statuses(name)";

pub struct DashboardService {
    supabase: SupabaseClient,
}

impl DashboardService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Reads one table with `query` and re-checks branch ownership of every
    /// returned row.
    async fn fetch<T>(&self, table: &str, query: &str, scope: &BranchScope, auth_token: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + BranchOwned,
    {
        let path = format!("/rest/v1/{}?{}", table, query);
        debug!("Fetching {} for branch {}", table, scope.branch_id());

        let rows: Vec<T> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(scope.retain(rows, table))
    }

    /// Tables with their own `branch_id` column.
    async fn fetch_owned<T>(&self, table: &str, scope: &BranchScope, extra: &str, auth_token: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + BranchOwned,
    {
        self.fetch(table, &format!("{}{}", scope.filter(), extra), scope, auth_token)
            .await
    }

    /// Invoices are scoped through the branch of their appointment.
    async fn fetch_invoices(&self, scope: &BranchScope, extra: &str, auth_token: &str) -> Result<Vec<InvoiceRow>> {
        let query = format!(
            "select=*,appointments!inner(branch_id)&appointments.branch_id=eq.{}&deleted_at=is.null{}",
            scope.branch_id(),
            extra
        );
        self.fetch("invoices", &query, scope, auth_token).await
    }

    async fn require_doctor(&self, scope: &BranchScope, doctor_id: DoctorId, auth_token: &str) -> Result<(), DashboardError> {
        let doctors: Vec<DoctorStatusRow> = self
            .fetch_owned(
                "doctors",
                scope,
                &format!("&select=id,is_active,branch_id,deleted_at&id=eq.{}", doctor_id),
                auth_token,
            )
            .await?;
        if !doctors.iter().any(|doctor| doctor.id == doctor_id && doctor.is_visible()) {
            return Err(DashboardError::DoctorNotFound(doctor_id));
        }
        Ok(())
    }

    async fn doctor_appointments(
        &self,
        scope: &BranchScope,
        doctor_id: DoctorId,
        order: &str,
        auth_token: &str,
    ) -> Result<Vec<AppointmentRow>> {
        self.fetch_owned(
            "appointments",
            scope,
            &format!("{}&doctor_id=eq.{}&deleted_at=is.null{}", APPOINTMENT_SELECT, doctor_id, order),
            auth_token,
        )
        .await
    }

    pub async fn summary(
        &self,
        scope: BranchScope,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<DashboardSummary, DashboardError> {
        let rows = DashboardRows {
            patients: self
                .fetch_owned::<PatientRow>("patients", &scope, "&deleted_at=is.null", auth_token)
                .await?,
            appointments: self
                .fetch_owned::<AppointmentRow>(
                    "appointments",
                    &scope,
                    &format!("{}&deleted_at=is.null", APPOINTMENT_SELECT),
                    auth_token,
                )
                .await?,
            invoices: self.fetch_invoices(&scope, "", auth_token).await?,
            doctors: self
                .fetch_owned::<DoctorStatusRow>(
                    "doctors",
                    &scope,
                    "&select=id,is_active,branch_id,deleted_at&deleted_at=is.null",
                    auth_token,
                )
                .await?,
        };

        let summary = stats::summarize(&rows, today);
        info!(
            "Dashboard for branch {} on {}: {} patients, {} appointments today",
            scope.branch_id(),
            today,
            summary.total_patients_count,
            summary.appointments_today
        );
        Ok(summary)
    }

    pub async fn doctor_stats(
        &self,
        scope: BranchScope,
        doctor_id: DoctorId,
        auth_token: &str,
    ) -> Result<DoctorStats, DashboardError> {
        self.require_doctor(&scope, doctor_id, auth_token).await?;

        let appointments = self.doctor_appointments(&scope, doctor_id, "", auth_token).await?;

        let ids: Vec<String> = appointments.iter().map(|a| a.id.to_string()).collect();
        let invoices = if ids.is_empty() {
            Vec::new()
        } else {
            self.fetch_invoices(&scope, &format!("&appointment_id=in.({})", ids.join(",")), auth_token)
                .await?
        };

        Ok(stats::doctor_stats(doctor_id, &appointments, &invoices))
    }

    pub async fn latest_appointments(
        &self,
        scope: BranchScope,
        doctor_id: DoctorId,
        auth_token: &str,
    ) -> Result<Vec<AppointmentSummary>, DashboardError> {
        self.require_doctor(&scope, doctor_id, auth_token).await?;

        let appointments = self
            .doctor_appointments(&scope, doctor_id, "&order=date.desc,time.desc,id.desc", auth_token)
            .await?;
        debug!("Doctor {} has {} appointment(s) in branch {}", doctor_id, appointments.len(), scope.branch_id());

        Ok(stats::latest_appointments(doctor_id, &appointments))
    }
}
