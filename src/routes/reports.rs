//! Report listing API routes
//!
//! The JSON listing administrators filter before deciding what to
//! export, plus the status-count widget feeding the dashboard.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;

use crate::repos::report_repo::{self, ReportFilters};
use crate::services::attendance;
use crate::services::local_time;

/// Query parameters for the report listing (same filter semantics as
/// the export endpoint)
#[derive(Debug, Deserialize)]
pub struct ReportListQuery {
    pub employee_name: Option<String>,
    pub employee_code: Option<String>,
    pub store_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// One row of the report listing, dates already on the local calendar
#[derive(Debug, Serialize)]
pub struct ReportListItem {
    pub id: i32,
    pub employee_name: String,
    pub employee_code: String,
    pub store_name: String,
    pub store_code: String,
    pub area: String,
    pub report_date: String,
    pub created_at: String,
    pub status: String,
    pub is_read: bool,
}

/// Handler for GET /api/admin/reports
pub async fn list_reports(
    State(pool): State<Arc<PgPool>>,
    Query(params): Query<ReportListQuery>,
) -> Result<Json<Vec<ReportListItem>>, ReportsErrorResponse> {
    let filters = ReportFilters {
        employee_name: non_empty(params.employee_name),
        employee_code: non_empty(params.employee_code),
        store_name: non_empty(params.store_name),
        start: attendance::parse_date(params.start_date.as_deref())
            .map(local_time::day_start_utc),
        end: attendance::parse_date(params.end_date.as_deref()).map(local_time::day_end_utc),
    };

    let rows = report_repo::find_filtered(&pool, &filters)
        .await
        .map_err(internal_error)?;

    let items = rows
        .into_iter()
        .map(|r| ReportListItem {
            id: r.id,
            employee_name: r.employee_name,
            employee_code: r.employee_code,
            store_name: r.store_name,
            store_code: r.store_code,
            area: r.area_name,
            report_date: local_time::utc_to_local(r.report_date)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            created_at: local_time::utc_to_local(r.created_at)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            status: r.status,
            is_read: r.is_read,
        })
        .collect();

    Ok(Json(items))
}

/// Report counts by review status
#[derive(Debug, Serialize)]
pub struct ReportStatsResponse {
    pub total: i64,
    pub new: i64,
    pub under_review: i64,
    pub reviewed: i64,
    pub needs_revision: i64,
}

/// Handler for GET /api/admin/reports/stats
pub async fn get_reports_stats(
    State(pool): State<Arc<PgPool>>,
) -> Result<Json<ReportStatsResponse>, ReportsErrorResponse> {
    let counts = report_repo::count_by_status(&pool)
        .await
        .map_err(internal_error)?;

    Ok(Json(ReportStatsResponse {
        total: counts.total,
        new: counts.new,
        under_review: counts.under_review,
        reviewed: counts.reviewed,
        needs_revision: counts.needs_revision,
    }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn internal_error(e: impl std::fmt::Display) -> ReportsErrorResponse {
    tracing::error!(error = %e, "report query failed");
    ReportsErrorResponse {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: format!("Failed to fetch reports: {e}"),
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error response wrapper for proper HTTP error handling
#[derive(Debug)]
pub struct ReportsErrorResponse {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ReportsErrorResponse {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
