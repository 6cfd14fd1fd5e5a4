use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{NaiveDate, Utc};
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::BranchScope;

use crate::models::{
    ClinicId, ClinicSlotResponse, DaySchedulesResponse, DoctorId, DoctorSummaryResponse,
    ScheduleEntryResponse, SlotAvailabilityResponse, SpecializationId,
};
use crate::services::ScheduleService;

#[derive(Debug, Deserialize)]
pub struct TimeSlotsQuery {
    pub clinic_id: ClinicId,
    pub day_of_week_id: i64,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DoctorScheduleQuery {
    pub doctor_id: DoctorId,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ReferenceDateQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SpecializationQuery {
    pub specialization: SpecializationId,
}

fn reference_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Utc::now().date_naive())
}

#[axum::debug_handler]
pub async fn get_time_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<TimeSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let scope = BranchScope::for_user(&user)?;
    let service = ScheduleService::new(&state, auth.token());

    let slots = service
        .slot_availability(scope, query.clinic_id, query.day_of_week_id, reference_date(query.date))
        .await?;

    let slots: Vec<SlotAvailabilityResponse> = slots.iter().map(Into::into).collect();
    Ok(Json(json!({
        "success": true,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<DoctorScheduleQuery>,
) -> Result<Json<Value>, AppError> {
    let scope = BranchScope::for_user(&user)?;
    let service = ScheduleService::new(&state, auth.token());

    let views = service
        .doctor_schedule(scope, query.doctor_id, reference_date(query.date))
        .await?;

    let schedules: Vec<ScheduleEntryResponse> = views.iter().map(ScheduleEntryResponse::for_doctor).collect();
    Ok(Json(json!({
        "success": true,
        "schedules": schedules
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_week(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<DoctorId>,
    Query(query): Query<ReferenceDateQuery>,
) -> Result<Json<Value>, AppError> {
    let scope = BranchScope::for_user(&user)?;
    let service = ScheduleService::new(&state, auth.token());

    let days = service
        .doctor_week(scope, doctor_id, reference_date(query.date))
        .await?;

    let days: Vec<DaySchedulesResponse> = days.iter().map(Into::into).collect();
    Ok(Json(json!({
        "success": true,
        "days": days
    })))
}

#[axum::debug_handler]
pub async fn get_clinic_time_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(clinic_id): Path<ClinicId>,
) -> Result<Json<Value>, AppError> {
    let scope = BranchScope::for_user(&user)?;
    let service = ScheduleService::new(&state, auth.token());

    let slots = service.clinic_time_slots(scope, clinic_id).await?;

    let slots: Vec<ClinicSlotResponse> = slots.iter().map(Into::into).collect();
    Ok(Json(json!({
        "success": true,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn get_clinic_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(clinic_id): Path<ClinicId>,
    Query(query): Query<ReferenceDateQuery>,
) -> Result<Json<Value>, AppError> {
    let scope = BranchScope::for_user(&user)?;
    let service = ScheduleService::new(&state, auth.token());

    let views = service
        .clinic_schedule(scope, clinic_id, reference_date(query.date))
        .await?;

    let schedules: Vec<ScheduleEntryResponse> = views.iter().map(ScheduleEntryResponse::for_clinic).collect();
    Ok(Json(json!({
        "success": true,
        "schedules": schedules
    })))
}

#[axum::debug_handler]
pub async fn get_doctors_by_specialization(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<SpecializationQuery>,
) -> Result<Json<Value>, AppError> {
    let scope = BranchScope::for_user(&user)?;
    let service = ScheduleService::new(&state, auth.token());

    let doctors = service
        .doctors_by_specialization(scope, query.specialization)
        .await?;

    let doctors: Vec<DoctorSummaryResponse> = doctors.iter().map(Into::into).collect();
    Ok(Json(json!({
        "success": true,
        "doctors": doctors
    })))
}
