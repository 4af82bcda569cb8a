use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    AccountCredentials, ProfileResponse, SettingsRow, UpdateProfileDto, UpdatedProfile,
    UserSettings,
};
use super::password::{hash_password, verify_password};
use crate::errors::AppError;

/// Service layer for profile, settings, and password operations. User rows
/// are created by the external auth provider; this service only mutates
/// the fields the profile screens own.
pub struct UserService;

impl UserService {
    /// Fetch the authenticated user's profile fields.
    pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<ProfileResponse, AppError> {
        sqlx::query_as::<_, ProfileResponse>(
            "SELECT name, email, image, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Update name/email/image. Email uniqueness is enforced against every
    /// other user; keeping one's own email is always allowed.
    pub async fn update_profile(
        pool: &PgPool,
        user_id: Uuid,
        dto: &UpdateProfileDto,
    ) -> Result<UpdatedProfile, AppError> {
        let name = dto.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }
        let email = dto.email.trim().to_string();
        let image = dto.image.as_deref().map(|i| i.trim().to_string());

        let email_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id != $2)",
        )
        .bind(&email)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        if email_taken {
            return Err(AppError::Conflict(
                "This email is already in use by another user".to_string(),
            ));
        }

        sqlx::query_as::<_, UpdatedProfile>(
            r#"
            UPDATE users
            SET name = $2, email = $3, image = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING name, email, image
            "#,
        )
        .bind(user_id)
        .bind(&name)
        .bind(&email)
        .bind(&image)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Read the settings blob, overlaying stored values on the defaults.
    /// An unparsable blob falls back to defaults rather than failing.
    pub async fn get_settings(pool: &PgPool, user_id: Uuid) -> Result<UserSettings, AppError> {
        let row = sqlx::query_as::<_, SettingsRow>("SELECT settings FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let settings = match row.settings.as_deref() {
            Some(blob) => serde_json::from_str(blob).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse stored settings, using defaults: {e}");
                UserSettings::default()
            }),
            None => UserSettings::default(),
        };

        Ok(settings)
    }

    /// Persist the settings blob and echo what was stored.
    pub async fn update_settings(
        pool: &PgPool,
        user_id: Uuid,
        settings: UserSettings,
    ) -> Result<UserSettings, AppError> {
        let blob = serde_json::to_string(&settings)
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        sqlx::query("UPDATE users SET settings = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(&blob)
            .execute(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(settings)
    }

    /// Change the account password. Accounts created through an external
    /// provider carry no password and cannot change one here.
    pub async fn change_password(
        pool: &PgPool,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let account = sqlx::query_as::<_, AccountCredentials>(
            "SELECT id, password FROM accounts WHERE user_id = $1 LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        let (account_id, stored_hash) = match account {
            Some(AccountCredentials {
                id,
                password: Some(hash),
            }) => (id, hash),
            _ => {
                return Err(AppError::NotFound(
                    "Account not found or signed in through an external provider".to_string(),
                ))
            }
        };

        if !verify_password(current_password, &stored_hash)? {
            return Err(AppError::ValidationError(
                "Current password is incorrect".to_string(),
            ));
        }

        if verify_password(new_password, &stored_hash)? {
            return Err(AppError::ValidationError(
                "New password must differ from the current password".to_string(),
            ));
        }

        let new_hash = hash_password(new_password)?;

        sqlx::query("UPDATE accounts SET password = $2, updated_at = NOW() WHERE id = $1")
            .bind(account_id)
            .bind(&new_hash)
            .execute(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(())
    }
}
