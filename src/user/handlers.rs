use actix_web::{get, put, web, HttpResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;

use super::models::{
    ChangePasswordDto, PasswordChangedResponse, ProfileResponse, UpdateProfileDto,
    UpdateSettingsDto, UpdatedProfile, UserSettings,
};
use super::service::UserService;

/// GET /user/profile - The authenticated user's profile
#[utoipa::path(
    get,
    path = "/user/profile",
    tag = "User",
    responses(
        (status = 200, description = "Profile fields", body = ProfileResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/user/profile")]
pub async fn get_profile(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let profile = UserService::get_profile(pool.get_ref(), auth.user_id).await?;

    Ok(HttpResponse::Ok().json(profile))
}

/// PUT /user/profile - Update name, email, and avatar URL
#[utoipa::path(
    put,
    path = "/user/profile",
    tag = "User",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = UpdatedProfile),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[put("/user/profile")]
pub async fn update_profile(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    body: web::Json<UpdateProfileDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let updated = UserService::update_profile(pool.get_ref(), auth.user_id, &body).await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// GET /user/settings - The user's preferences, with defaults applied
#[utoipa::path(
    get,
    path = "/user/settings",
    tag = "User",
    responses(
        (status = 200, description = "Settings object", body = UserSettings),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/user/settings")]
pub async fn get_settings(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let settings = UserService::get_settings(pool.get_ref(), auth.user_id).await?;

    Ok(HttpResponse::Ok().json(settings))
}

/// PUT /user/settings - Replace the user's preferences
#[utoipa::path(
    put,
    path = "/user/settings",
    tag = "User",
    request_body = UpdateSettingsDto,
    responses(
        (status = 200, description = "Stored settings", body = UserSettings),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[put("/user/settings")]
pub async fn update_settings(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    body: web::Json<UpdateSettingsDto>,
) -> Result<HttpResponse, AppError> {
    let settings =
        UserService::update_settings(pool.get_ref(), auth.user_id, body.into_inner().into_settings())
            .await?;

    Ok(HttpResponse::Ok().json(settings))
}

/// PUT /user/password - Change the account password
#[utoipa::path(
    put,
    path = "/user/password",
    tag = "User",
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed", body = PasswordChangedResponse),
        (status = 400, description = "Validation error or wrong current password", body = ErrorResponse),
        (status = 404, description = "No password-bearing account", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[put("/user/password")]
pub async fn change_password(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    body: web::Json<ChangePasswordDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    UserService::change_password(
        pool.get_ref(),
        auth.user_id,
        &body.current_password,
        &body.new_password,
    )
    .await?;

    Ok(HttpResponse::Ok().json(PasswordChangedResponse {
        message: "Password changed".to_string(),
    }))
}
