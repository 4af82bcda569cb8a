use chrono::Utc;
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::models::{
    CloudinaryConfig, CloudinaryDestroyResult, CloudinaryUploadResult, UploadResponse,
};
use crate::errors::AppError;

/// Avatar dimensions requested from the media host: square face crop with
/// automatic quality.
const AVATAR_TRANSFORMATION: &str = "c_fill,g_face,h_300,w_300/q_auto:good";

/// Thin client for the media host's signed REST API. All avatar storage is
/// delegated; this service only signs and forwards requests.
pub struct UploadService;

/// SHA-256 request signature: parameters sorted by name, joined as a query
/// string, with the API secret appended.
pub fn sign_request(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl UploadService {
    /// Upload an avatar image. The public id is deterministic per user so
    /// a new upload replaces the previous one, and the CDN copy is
    /// invalidated.
    pub async fn upload_avatar(
        http: &reqwest::Client,
        config: &CloudinaryConfig,
        user_id: Uuid,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, AppError> {
        let timestamp = Utc::now().timestamp().to_string();
        let public_id = format!("user_{user_id}");

        let signed_params = [
            ("folder", "avatars".to_string()),
            ("invalidate", "true".to_string()),
            ("overwrite", "true".to_string()),
            ("public_id", public_id.clone()),
            ("timestamp", timestamp.clone()),
            ("transformation", AVATAR_TRANSFORMATION.to_string()),
        ];
        let signature = sign_request(&signed_params, config.api_secret.expose_secret());

        let mut form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name("avatar"))
            .text("api_key", config.api_key.clone())
            .text("signature", signature);
        for (key, value) in signed_params {
            form = form.text(key, value);
        }

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            config.cloud_name
        );
        let response = http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::InternalError(format!("Avatar upload failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::InternalError(format!(
                "Avatar upload rejected ({status}): {body}"
            )));
        }

        let result: CloudinaryUploadResult = response
            .json()
            .await
            .map_err(|e| AppError::InternalError(format!("Invalid upload response: {e}")))?;

        Ok(UploadResponse {
            url: result.secure_url,
            public_id: result.public_id,
            width: result.width,
            height: result.height,
        })
    }

    /// Remove a previously uploaded avatar by its public id.
    pub async fn destroy_avatar(
        http: &reqwest::Client,
        config: &CloudinaryConfig,
        public_id: &str,
    ) -> Result<String, AppError> {
        let timestamp = Utc::now().timestamp().to_string();

        let signed_params = [
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.clone()),
        ];
        let signature = sign_request(&signed_params, config.api_secret.expose_secret());

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/destroy",
            config.cloud_name
        );
        let response = http
            .post(&url)
            .form(&[
                ("public_id", public_id),
                ("timestamp", &timestamp),
                ("api_key", &config.api_key),
                ("signature", &signature),
            ])
            .send()
            .await
            .map_err(|e| AppError::InternalError(format!("Avatar deletion failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::InternalError(format!(
                "Avatar deletion rejected ({status})"
            )));
        }

        let result: CloudinaryDestroyResult = response
            .json()
            .await
            .map_err(|e| AppError::InternalError(format!("Invalid destroy response: {e}")))?;

        Ok(result.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_hex_sha256() {
        let signature = sign_request(&[("timestamp", "1700000000".to_string())], "secret");

        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_is_order_independent() {
        let a = sign_request(
            &[
                ("folder", "avatars".to_string()),
                ("timestamp", "1700000000".to_string()),
            ],
            "secret",
        );
        let b = sign_request(
            &[
                ("timestamp", "1700000000".to_string()),
                ("folder", "avatars".to_string()),
            ],
            "secret",
        );

        assert_eq!(a, b, "Parameter order must not change the signature");
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let params = [("timestamp", "1700000000".to_string())];
        assert_ne!(sign_request(&params, "secret_a"), sign_request(&params, "secret_b"));
    }

    #[test]
    fn test_signature_depends_on_values() {
        let a = sign_request(&[("public_id", "avatars/user_1".to_string())], "secret");
        let b = sign_request(&[("public_id", "avatars/user_2".to_string())], "secret");
        assert_ne!(a, b);
    }
}
