use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;

/// Extractor that resolves the session token to the authenticated user's ID.
///
/// Sessions are minted by the external auth provider; this service only
/// reads the `sessions` table. A missing, unknown, or expired token yields
/// `Unauthorized` without touching any other state.
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

#[derive(FromRow)]
struct SessionRow {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
        .ok_or_else(|| {
            AppError::Unauthorized("Missing or invalid Authorization header".to_string())
        })
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let pool = req.app_data::<web::Data<PgPool>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let token = token?;
            let pool = pool.ok_or_else(|| {
                AppError::InternalError("Database pool not configured".to_string())
            })?;

            let session = sqlx::query_as::<_, SessionRow>(
                "SELECT user_id, expires_at FROM sessions WHERE token = $1",
            )
            .bind(&token)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?
            .ok_or_else(|| AppError::Unauthorized("Invalid session token".to_string()))?;

            if session.expires_at <= Utc::now() {
                return Err(AppError::Unauthorized("Session expired".to_string()));
            }

            Ok(AuthenticatedUser {
                user_id: session.user_id,
            })
        })
    }
}
