use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        // Booking grid
        .route("/time-slots", get(handlers::get_time_slots))
        .route("/doctor-schedule", get(handlers::get_doctor_schedule))
        .route("/doctors-by-specialization", get(handlers::get_doctors_by_specialization))

        .route("/doctors/{doctor_id}/weekly", get(handlers::get_doctor_week))
        .route("/clinics/{clinic_id}/time-slots", get(handlers::get_clinic_time_slots))
        .route("/clinics/{clinic_id}/schedule", get(handlers::get_clinic_schedule))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
