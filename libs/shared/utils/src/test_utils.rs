use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            server_port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub branch_id: Option<i64>,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "authenticated".to_string(),
            branch_id: Some(1),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, branch_id: Option<i64>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: "authenticated".to_string(),
            branch_id,
        }
    }

    pub fn in_branch(email: &str, branch_id: i64) -> Self {
        Self::new(email, Some(branch_id))
    }

    /// A staff account the identity provider never assigned to a branch.
    pub fn unassigned(email: &str) -> Self {
        Self::new(email, None)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            branch_id: self.branch_id,
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "app_metadata": {
                "branch_id": user.branch_id,
            },
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// PostgREST row shapes for the clinic tables.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn clinic_row(id: i64, branch_id: i64, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "default_open_time": "09:00:00",
            "default_close_time": "17:00:00",
            "slot_duration_hours": 1,
            "is_active": true,
            "branch_id": branch_id,
            "deleted_at": null
        })
    }

    pub fn slot_row(id: i64, branch_id: i64, clinic_id: i64, start: &str, end: &str) -> serde_json::Value {
        json!({
            "id": id,
            "clinic_id": clinic_id,
            "start_time": start,
            "end_time": end,
            "is_active": true,
            "deleted_at": null,
            "clinics": { "branch_id": branch_id }
        })
    }

    pub fn schedule_row(
        id: i64,
        branch_id: i64,
        doctor_id: i64,
        clinic_id: i64,
        day_of_week: i64,
        slot_ids: &[i64],
    ) -> serde_json::Value {
        let slots: Vec<serde_json::Value> = slot_ids
            .iter()
            .map(|slot_id| json!({ "clinic_slot_id": slot_id }))
            .collect();
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "clinic_id": clinic_id,
            "day_of_week": day_of_week,
            "valid_from": "2020-01-01",
            "valid_to": null,
            "is_active": true,
            "branch_id": branch_id,
            "deleted_at": null,
            "doctor_schedule_slots": slots
        })
    }

    pub fn doctor_row(id: i64, branch_id: i64, full_name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "full_name": full_name,
            "specialization_id": 1,
            "phone_number": null,
            "email": null,
            "examination_price": 200.0,
            "consultation_price": 100.0,
            "is_active": true,
            "branch_id": branch_id,
            "deleted_at": null
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::in_branch("desk@example.com", 2);
        assert_eq!(user.email, "desk@example.com");
        assert_eq!(user.branch_id, Some(2));

        let user_model = user.to_user();
        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.branch_id, Some(2));
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let secret = "test-secret";
        let token = JwtTestUtils::create_test_token(&user, secret, Some(1));

        assert!(token.contains('.'));
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_schedule_row_embeds_slot_links() {
        let row = MockSupabaseResponses::schedule_row(1, 1, 2, 3, 1, &[10, 11]);
        assert_eq!(row["doctor_schedule_slots"][1]["clinic_slot_id"], 11);
    }
}
