use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Public part of a user record returned to clients. The password hash never
/// leaves the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub phone: Option<String>,
}

/// Uniform response wrapper used by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<PublicUser>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl Envelope {
    pub fn ok_user(user: PublicUser) -> Self {
        Self {
            result: "ok".into(),
            message: None,
            user: Some(user),
            users: None,
            details: None,
        }
    }

    pub fn ok_users(users: Vec<PublicUser>) -> Self {
        Self {
            result: "ok".into(),
            message: None,
            user: None,
            users: Some(users),
            details: None,
        }
    }

    pub fn ok_message(message: impl Into<String>) -> Self {
        Self {
            result: "ok".into(),
            message: Some(message.into()),
            user: None,
            users: None,
            details: None,
        }
    }
}

/// Request body for user creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Partial update of the caller's own profile. Absent fields stay untouched.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Request body for changing one's own password.
#[derive(Debug, Serialize, Deserialize)]
pub struct PasswordChangeRequest {
    pub new_password: String,
    pub new_password_repeat: String,
}

/// Request body for the administrative password change.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminPasswordChangeRequest {
    pub new_password: String,
}
