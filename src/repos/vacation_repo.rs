//! Repository for vacation queries
//!
//! Vacations are single calendar-day records, at most one per
//! (employee, date). The export path needs the global date bounds for
//! window fallback resolution and the window-scoped set for status
//! classification and the day-by-day grid.

use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use thiserror::Error;

/// Errors that can occur during vacation queries
#[derive(Debug, Error)]
pub enum VacationRepoError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One vacation day joined with its (non-admin) employee
#[derive(Debug, Clone, FromRow)]
pub struct VacationRow {
    pub user_id: i32,
    pub employee_code: String,
    pub employee_name: String,
    pub vacation_date: NaiveDate,
}

#[derive(Debug, Clone, FromRow)]
struct VacationBoundsRow {
    earliest: Option<NaiveDate>,
    latest: Option<NaiveDate>,
}

/// Earliest and latest vacation dates across the whole system.
///
/// Both are `None` when no vacation records exist at all; the window
/// resolution then falls back to "30 days before today" / "today".
pub async fn date_bounds(
    pool: &PgPool,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), VacationRepoError> {
    let row = sqlx::query_as::<_, VacationBoundsRow>(
        r#"
        SELECT MIN(vacation_date) as earliest, MAX(vacation_date) as latest
        FROM vacations
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok((row.earliest, row.latest))
}

/// Fetch all vacation days inside [start, end] (inclusive both ends)
/// for non-admin employees, ordered by employee then date.
pub async fn find_in_window(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<VacationRow>, VacationRepoError> {
    let rows = sqlx::query_as::<_, VacationRow>(
        r#"
        SELECT
            v.user_id,
            u.employee_code,
            u.employee_name,
            v.vacation_date
        FROM vacations v
        INNER JOIN users u ON u.id = v.user_id
        WHERE u.is_admin = FALSE
          AND v.vacation_date >= $1
          AND v.vacation_date <= $2
        ORDER BY v.user_id ASC, v.vacation_date ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
