use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

impl JwtClaims {
    /// Branch assignment is issued by the identity provider in `app_metadata`,
    /// which the user cannot edit themselves.
    pub fn branch_id(&self) -> Option<i64> {
        self.app_metadata
            .as_ref()
            .and_then(|meta| meta.get("branch_id"))
            .and_then(|value| value.as_i64())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub branch_id: Option<i64>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(app_metadata: Option<serde_json::Value>) -> JwtClaims {
        JwtClaims {
            sub: "user-1".to_string(),
            exp: None,
            email: None,
            role: Some("authenticated".to_string()),
            app_metadata,
            user_metadata: None,
            aud: None,
            iat: None,
        }
    }

    #[test]
    fn test_branch_id_read_from_app_metadata() {
        let claims = claims(Some(json!({"branch_id": 4, "provider": "email"})));
        assert_eq!(claims.branch_id(), Some(4));
    }

    #[test]
    fn test_branch_id_in_user_metadata_is_ignored() {
        let mut claims = claims(Some(json!({"provider": "email"})));
        claims.user_metadata = Some(json!({"branch_id": 4}));
        assert_eq!(claims.branch_id(), None);
    }

    #[test]
    fn test_branch_id_missing_or_malformed() {
        assert_eq!(claims(None).branch_id(), None);
        assert_eq!(claims(Some(json!({"branch_id": "4"}))).branch_id(), None);
    }
}
