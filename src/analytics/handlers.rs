use actix_web::{get, web, HttpResponse};
use sqlx::PgPool;

use crate::errors::{AppError, ErrorResponse};

use super::models::{AnalyticsQuery, AnalyticsResponse, Period};
use super::service::AnalyticsService;

/// GET /analytics - Aggregated report for a period.
///
/// Unauthenticated and global: the report aggregates the whole store.
#[utoipa::path(
    get,
    path = "/analytics",
    tag = "Analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Aggregated analytics payload", body = AnalyticsResponse),
        (status = 500, description = "Aggregation failed", body = ErrorResponse)
    )
)]
#[get("/analytics")]
pub async fn get_analytics(
    pool: web::Data<PgPool>,
    query: web::Query<AnalyticsQuery>,
) -> Result<HttpResponse, AppError> {
    let period = query
        .period
        .as_deref()
        .map(Period::parse)
        .unwrap_or(Period::Monthly);

    let report = AnalyticsService::run(pool.get_ref(), period).await?;

    Ok(HttpResponse::Ok().json(report))
}
