use secrecy::Secret;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Credentials for the external media host. Missing environment variables
/// leave the fields empty and surface as upload failures at request time,
/// not at startup.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: Secret<String>,
}

impl CloudinaryConfig {
    pub fn from_env() -> Self {
        Self {
            cloud_name: std::env::var("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
            api_key: std::env::var("CLOUDINARY_API_KEY").unwrap_or_default(),
            api_secret: Secret::new(std::env::var("CLOUDINARY_API_SECRET").unwrap_or_default()),
        }
    }
}

/// Successful avatar upload
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// CDN URL of the stored image
    #[schema(example = "https://res.cloudinary.com/demo/image/upload/avatars/user_1.jpg")]
    pub url: String,
    /// Identifier to pass back when deleting the image
    #[schema(example = "avatars/user_1")]
    pub public_id: String,
    pub width: u32,
    pub height: u32,
}

/// Query parameters for avatar deletion
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAvatarQuery {
    /// The public id returned by the upload
    pub public_id: Option<String>,
}

/// Confirmation of an avatar deletion
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAvatarResponse {
    #[schema(example = "Image removed")]
    pub message: String,
    /// Media host's result code (e.g. "ok", "not found")
    #[schema(example = "ok")]
    pub result: String,
}

/// Subset of the media host's upload response we forward to the client
#[derive(Debug, Deserialize)]
pub struct CloudinaryUploadResult {
    pub secure_url: String,
    pub public_id: String,
    pub width: u32,
    pub height: u32,
}

/// Media host's destroy response
#[derive(Debug, Deserialize)]
pub struct CloudinaryDestroyResult {
    pub result: String,
}
