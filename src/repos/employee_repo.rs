//! Repository for employee (non-admin user) queries

use sqlx::{FromRow, PgPool};
use thiserror::Error;

/// Errors that can occur during employee queries
#[derive(Debug, Error)]
pub enum EmployeeRepoError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A field supervisor as seen by the export path
#[derive(Debug, Clone, FromRow)]
pub struct EmployeeRow {
    pub id: i32,
    pub employee_code: String,
    pub employee_name: String,
}

/// Fetch every non-admin employee.
///
/// The attendance reconciliation needs the full roster so that
/// employees with zero submitted reports still show up in the summary.
pub async fn find_non_admin(pool: &PgPool) -> Result<Vec<EmployeeRow>, EmployeeRepoError> {
    let rows = sqlx::query_as::<_, EmployeeRow>(
        r#"
        SELECT id, employee_code, employee_name
        FROM users
        WHERE is_admin = FALSE
        ORDER BY employee_name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
