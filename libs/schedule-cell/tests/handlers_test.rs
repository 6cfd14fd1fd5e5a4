// libs/schedule-cell/tests/handlers_test.rs

use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    extract::{Extension, Path, Query, State},
    http::{Request, StatusCode},
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use schedule_cell::handlers::*;
use schedule_cell::schedule_routes;
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses as Rows, TestConfig, TestUser};

const TOKEN: &str = "test-token";

fn config_for(mock_server: &MockServer) -> Arc<AppConfig> {
    TestConfig::with_supabase_url(mock_server.uri()).to_arc()
}

fn auth_header() -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer(TOKEN).unwrap())
}

fn secretary() -> Extension<shared_models::auth::User> {
    Extension(TestUser::in_branch("front-desk@clinic.test", 1).to_user())
}

async fn mount_branch_one(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/clinics"))
        .and(query_param("branch_id", "eq.1"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            Rows::clinic_row(1, 1, "Dental")
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/clinic_slots"))
        .and(query_param("clinics.branch_id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            Rows::slot_row(10, 1, 1, "09:00:00", "10:00:00"),
            Rows::slot_row(11, 1, 1, "10:00:00", "11:00:00"),
            Rows::slot_row(12, 1, 1, "13:00:00", "14:00:00"),
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_schedules"))
        .and(query_param("branch_id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            Rows::schedule_row(1, 1, 7, 1, 1, &[10, 11, 12])
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("branch_id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            Rows::doctor_row(7, 1, "Dr. Salma")
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_get_time_slots_marks_claimed_slots() {
    let mock_server = MockServer::start().await;
    mount_branch_one(&mock_server).await;

    let result = get_time_slots(
        State(config_for(&mock_server)),
        auth_header(),
        secretary(),
        Query(TimeSlotsQuery {
            clinic_id: 1,
            day_of_week_id: 1,
            date: Some(chrono::NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()),
        }),
    )
    .await
    .unwrap();

    let body = result.0;
    assert_eq!(body["success"], true);
    assert_eq!(body["slots"].as_array().unwrap().len(), 3);
    assert_eq!(body["slots"][0]["start_time"], "09:00");
    assert_eq!(body["slots"][0]["is_available"], false);
    assert_eq!(body["slots"][0]["doctor_name"], "Dr. Salma");
    assert_eq!(body["slots"][0]["clinic"], "Dental");
}

#[tokio::test]
async fn test_get_time_slots_rejects_unknown_day() {
    let mock_server = MockServer::start().await;

    let result = get_time_slots(
        State(config_for(&mock_server)),
        auth_header(),
        secretary(),
        Query(TimeSlotsQuery {
            clinic_id: 1,
            day_of_week_id: 0,
            date: None,
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_get_doctor_schedule_merges_and_formats() {
    let mock_server = MockServer::start().await;
    mount_branch_one(&mock_server).await;

    let result = get_doctor_schedule(
        State(config_for(&mock_server)),
        auth_header(),
        secretary(),
        Query(DoctorScheduleQuery {
            doctor_id: 7,
            date: Some(chrono::NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()),
        }),
    )
    .await
    .unwrap();

    let body = result.0;
    let schedule = &body["schedules"][0];
    assert_eq!(schedule["clinic"], "Dental");
    assert_eq!(schedule["day"], "Monday");
    assert_eq!(schedule["day_id"], 1);
    assert!(schedule.get("doctor").is_none());
    assert_eq!(
        schedule["slots"],
        json!([
            {"start_time": "09:00 AM", "end_time": "11:00 AM"},
            {"start_time": "01:00 PM", "end_time": "02:00 PM"}
        ])
    );
}

#[tokio::test]
async fn test_get_clinic_schedule_names_doctor() {
    let mock_server = MockServer::start().await;
    mount_branch_one(&mock_server).await;

    let result = get_clinic_schedule(
        State(config_for(&mock_server)),
        auth_header(),
        secretary(),
        Path(1),
        Query(ReferenceDateQuery { date: None }),
    )
    .await
    .unwrap();

    assert_eq!(result.0["schedules"][0]["doctor"], "Dr. Salma");
}

#[tokio::test]
async fn test_get_clinic_time_slots() {
    let mock_server = MockServer::start().await;
    mount_branch_one(&mock_server).await;

    let result = get_clinic_time_slots(State(config_for(&mock_server)), auth_header(), secretary(), Path(1))
        .await
        .unwrap();

    assert_eq!(
        result.0["slots"],
        json!([
            {"id": 10, "start_time": "09:00", "end_time": "10:00"},
            {"id": 11, "start_time": "10:00", "end_time": "11:00"},
            {"id": 12, "start_time": "13:00", "end_time": "14:00"}
        ])
    );
}

#[tokio::test]
async fn test_store_failure_is_database_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(Rows::error_response("boom", "XX000")),
        )
        .mount(&mock_server)
        .await;

    let result = get_clinic_time_slots(State(config_for(&mock_server)), auth_header(), secretary(), Path(1)).await;
    assert_matches!(result, Err(AppError::Database(_)));
}

#[tokio::test]
async fn test_user_without_branch_is_forbidden() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let user = TestUser::unassigned("nobody@clinic.test");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, None);

    let response = schedule_routes(config)
        .oneshot(
            Request::builder()
                .uri("/clinics/1/time-slots")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let mock_server = MockServer::start().await;

    let response = schedule_routes(config_for(&mock_server))
        .oneshot(Request::builder().uri("/time-slots?clinic_id=1&day_of_week_id=1").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_router_serves_doctor_week_for_signed_token() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let user = TestUser::in_branch("manager@clinic.test", 1);
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("branch_id", "eq.1"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            Rows::doctor_row(7, 1, "Dr. Salma")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_schedules"))
        .and(query_param("doctor_id", "eq.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let response = schedule_routes(config)
        .oneshot(
            Request::builder()
                .uri("/doctors/7/weekly")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"success": true, "days": []}));
}
