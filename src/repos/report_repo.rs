//! Repository for report read queries
//!
//! Returns reports joined with their employee, store, and area so the
//! export and listing paths never chase relations row by row.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use thiserror::Error;

/// Errors that can occur during report queries
#[derive(Debug, Error)]
pub enum ReportRepoError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Filters applied to the report listing and export queries.
///
/// Name/code/store filters are substring matches. Date bounds are
/// already resolved to UTC instants; `None` means no bound. An invalid
/// user-supplied date never reaches this struct, it is simply dropped.
#[derive(Debug, Clone, Default)]
pub struct ReportFilters {
    pub employee_name: Option<String>,
    pub employee_code: Option<String>,
    pub store_name: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// One report row with employee, store, and area metadata inlined
#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub id: i32,
    pub user_id: i32,
    pub report_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub is_read: bool,
    pub employee_code: String,
    pub employee_name: String,
    pub store_id: i32,
    pub store_code: String,
    pub store_name: String,
    pub store_governorate: Option<String>,
    pub area_name: String,
    pub area_governorate: Option<String>,
    pub samsung_sales: Option<String>,
    pub competitors_sales: Option<String>,
    pub tv_availability: Option<String>,
    pub ha_availability: Option<String>,
    pub sfo_pmt: Option<String>,
    pub display_activities: Option<String>,
    pub store_issues: Option<String>,
    pub complaints: Option<String>,
    pub actions_taken: Option<String>,
}

/// Query reports matching the given filters, newest first.
///
/// Ordered by created_at DESC to match the listing the administrators
/// see before exporting.
pub async fn find_filtered(
    pool: &PgPool,
    filters: &ReportFilters,
) -> Result<Vec<ReportRow>, ReportRepoError> {
    let rows = sqlx::query_as::<_, ReportRow>(
        r#"
        SELECT
            r.id,
            r.user_id,
            r.report_date,
            r.created_at,
            r.status,
            r.is_read,
            u.employee_code,
            u.employee_name,
            s.id as store_id,
            s.code as store_code,
            s.name as store_name,
            s.governorate as store_governorate,
            a.name as area_name,
            a.governorate as area_governorate,
            r.samsung_sales,
            r.competitors_sales,
            r.tv_availability,
            r.ha_availability,
            r.sfo_pmt,
            r.display_activities,
            r.store_issues,
            r.complaints,
            r.actions_taken
        FROM reports r
        INNER JOIN users u ON u.id = r.user_id
        INNER JOIN stores s ON s.id = r.store_id
        INNER JOIN areas a ON a.id = r.area_id
        WHERE ($1::text IS NULL OR u.employee_name LIKE '%' || $1 || '%')
          AND ($2::text IS NULL OR u.employee_code LIKE '%' || $2 || '%')
          AND ($3::text IS NULL OR s.name LIKE '%' || $3 || '%')
          AND ($4::timestamptz IS NULL OR r.report_date >= $4)
          AND ($5::timestamptz IS NULL OR r.report_date <= $5)
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(filters.employee_name.as_deref())
    .bind(filters.employee_code.as_deref())
    .bind(filters.store_name.as_deref())
    .bind(filters.start)
    .bind(filters.end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Report counts by review status
#[derive(Debug, Clone, FromRow)]
pub struct ReportStatusCounts {
    pub total: i64,
    pub new: i64,
    pub under_review: i64,
    pub reviewed: i64,
    pub needs_revision: i64,
}

/// Count reports grouped by review status in a single scan
pub async fn count_by_status(pool: &PgPool) -> Result<ReportStatusCounts, ReportRepoError> {
    let counts = sqlx::query_as::<_, ReportStatusCounts>(
        r#"
        SELECT
            COUNT(*) as total,
            COUNT(*) FILTER (WHERE status = 'new') as "new",
            COUNT(*) FILTER (WHERE status = 'under_review') as under_review,
            COUNT(*) FILTER (WHERE status = 'reviewed') as reviewed,
            COUNT(*) FILTER (WHERE status = 'needs_revision') as needs_revision
        FROM reports
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(counts)
}
