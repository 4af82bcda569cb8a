use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use actix_web::{delete, post, web, HttpResponse};
use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;

use super::models::{CloudinaryConfig, DeleteAvatarQuery, DeleteAvatarResponse, UploadResponse};
use super::service::UploadService;

/// Uploaded avatars are capped at 2 MiB before they are forwarded.
const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

lazy_static! {
    // Only ids this service itself issued (avatars folder) may be deleted
    static ref PUBLIC_ID_RE: Regex = Regex::new(r"^avatars/[A-Za-z0-9_\-\.]+$").unwrap();
}

/// Multipart payload for the avatar upload
#[derive(Debug, MultipartForm)]
pub struct AvatarUploadForm {
    #[multipart(limit = "10MB")]
    pub file: TempFile,
}

/// POST /upload/avatar - Store an avatar image with the media host
#[utoipa::path(
    post,
    path = "/upload/avatar",
    tag = "Upload",
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing, oversized, or non-image file", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/upload/avatar")]
pub async fn upload_avatar(
    http: web::Data<reqwest::Client>,
    config: web::Data<CloudinaryConfig>,
    auth: AuthenticatedUser,
    form: MultipartForm<AvatarUploadForm>,
) -> Result<HttpResponse, AppError> {
    let file = &form.file;

    if file.size == 0 {
        return Err(AppError::ValidationError("No file uploaded".to_string()));
    }
    if file.size > MAX_AVATAR_BYTES {
        return Err(AppError::ValidationError(
            "File too large. Maximum size is 2MB".to_string(),
        ));
    }

    let is_image = file
        .content_type
        .as_ref()
        .map(|mime| mime.essence_str().starts_with("image/"))
        .unwrap_or(false);
    if !is_image {
        return Err(AppError::ValidationError(
            "Only image files are accepted".to_string(),
        ));
    }

    let bytes = std::fs::read(file.file.path())
        .map_err(|e| AppError::InternalError(format!("Failed to read upload: {e}")))?;

    let response =
        UploadService::upload_avatar(http.get_ref(), config.get_ref(), auth.user_id, bytes).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// DELETE /upload/avatar?publicId= - Remove a previously stored avatar
#[utoipa::path(
    delete,
    path = "/upload/avatar",
    tag = "Upload",
    params(DeleteAvatarQuery),
    responses(
        (status = 200, description = "Image removed", body = DeleteAvatarResponse),
        (status = 400, description = "Missing or malformed publicId", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[delete("/upload/avatar")]
pub async fn delete_avatar(
    http: web::Data<reqwest::Client>,
    config: web::Data<CloudinaryConfig>,
    _auth: AuthenticatedUser,
    query: web::Query<DeleteAvatarQuery>,
) -> Result<HttpResponse, AppError> {
    let public_id = query
        .public_id
        .as_deref()
        .ok_or_else(|| AppError::ValidationError("publicId is required".to_string()))?;

    if !PUBLIC_ID_RE.is_match(public_id) {
        return Err(AppError::ValidationError(
            "publicId is not a valid avatar id".to_string(),
        ));
    }

    let result = UploadService::destroy_avatar(http.get_ref(), config.get_ref(), public_id).await?;

    Ok(HttpResponse::Ok().json(DeleteAvatarResponse {
        message: "Image removed".to_string(),
        result,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_id_pattern_accepts_issued_ids() {
        assert!(PUBLIC_ID_RE.is_match("avatars/user_550e8400-e29b-41d4-a716-446655440000"));
        assert!(PUBLIC_ID_RE.is_match("avatars/user_1"));
    }

    #[test]
    fn test_public_id_pattern_rejects_foreign_ids() {
        assert!(!PUBLIC_ID_RE.is_match("user_1"));
        assert!(!PUBLIC_ID_RE.is_match("avatars/"));
        assert!(!PUBLIC_ID_RE.is_match("other_folder/user_1"));
        assert!(!PUBLIC_ID_RE.is_match("avatars/../secret"));
    }
}
