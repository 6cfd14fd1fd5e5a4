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

use crate::models::DoctorId;
use crate::services::DashboardService;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub date: Option<NaiveDate>,
}

#[axum::debug_handler]
pub async fn get_dashboard(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Value>, AppError> {
    let scope = BranchScope::for_user(&user)?;
    let today = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let summary = DashboardService::new(&state)
        .summary(scope, today, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "dashboard": summary
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_stats(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<DoctorId>,
) -> Result<Json<Value>, AppError> {
    let scope = BranchScope::for_user(&user)?;

    let stats = DashboardService::new(&state)
        .doctor_stats(scope, doctor_id, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "stats": stats
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<DoctorId>,
) -> Result<Json<Value>, AppError> {
    let scope = BranchScope::for_user(&user)?;

    let appointments = DashboardService::new(&state)
        .latest_appointments(scope, doctor_id, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}
