use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use dashboard_cell::router::dashboard_routes;
use schedule_cell::router::schedule_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .nest("/schedule", schedule_routes(state.clone()))
        .nest("/dashboard", dashboard_routes(state))
}
