use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Profile fields returned by GET /user/profile
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[schema(example = "Ana Souza")]
    pub name: String,
    #[schema(example = "ana@example.com")]
    pub email: String,
    /// Avatar URL, if one was uploaded
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for PUT /user/profile
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileDto {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    #[schema(example = "Ana Souza")]
    pub name: String,

    /// Email address (must not be in use by another user)
    #[validate(email(message = "A valid email is required"))]
    #[schema(example = "ana@example.com")]
    pub email: String,

    /// Avatar URL
    pub image: Option<String>,
}

/// Fields echoed back after a profile update
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedProfile {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

fn default_currency() -> String {
    "BRL".to_string()
}

fn default_date_format() -> String {
    "dd/mm/yyyy".to_string()
}

fn default_true() -> bool {
    true
}

/// Per-user preferences, persisted as an opaque serialized blob on the
/// user row. Each field falls back to its default when missing from the
/// stored blob, so older blobs gain new settings transparently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "default_currency")]
    #[schema(example = "BRL")]
    pub currency: String,
    #[serde(default = "default_date_format")]
    #[schema(example = "dd/mm/yyyy")]
    pub date_format: String,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default = "default_true")]
    pub budget_alerts: bool,
    #[serde(default)]
    pub weekly_report: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            currency: default_currency(),
            date_format: default_date_format(),
            notifications: true,
            budget_alerts: true,
            weekly_report: false,
        }
    }
}

/// Request body for PUT /user/settings. Booleans absent from the request
/// are coerced to false, string fields to their defaults.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsDto {
    #[serde(default)]
    pub dark_mode: bool,
    pub currency: Option<String>,
    pub date_format: Option<String>,
    #[serde(default)]
    pub notifications: bool,
    #[serde(default)]
    pub budget_alerts: bool,
    #[serde(default)]
    pub weekly_report: bool,
}

impl UpdateSettingsDto {
    /// Coerce the request into the stored settings shape.
    pub fn into_settings(self) -> UserSettings {
        UserSettings {
            dark_mode: self.dark_mode,
            currency: self
                .currency
                .filter(|c| !c.is_empty())
                .unwrap_or_else(default_currency),
            date_format: self
                .date_format
                .filter(|f| !f.is_empty())
                .unwrap_or_else(default_date_format),
            notifications: self.notifications,
            budget_alerts: self.budget_alerts,
            weekly_report: self.weekly_report,
        }
    }
}

/// Request body for PUT /user/password
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordDto {
    /// The password currently on the account
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    /// Replacement password (at least 8 characters)
    #[validate(length(min = 8, message = "New password must be at least 8 characters"))]
    pub new_password: String,
}

/// Confirmation message for a password change
#[derive(Debug, Serialize, ToSchema)]
pub struct PasswordChangedResponse {
    #[schema(example = "Password changed")]
    pub message: String,
}

/// Credential row from the auth provider's account table
#[derive(Debug, FromRow)]
pub struct AccountCredentials {
    pub id: Uuid,
    pub password: Option<String>,
}

/// Raw settings blob column
#[derive(Debug, FromRow)]
pub struct SettingsRow {
    pub settings: Option<String>,
}
