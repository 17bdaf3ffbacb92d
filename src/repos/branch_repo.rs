//! Repository for branch queries
//!
//! Only used by the governorate fallback chain: when neither the
//! report's store nor its area carries a governorate, the first branch
//! owned by the reporting employee that has one wins.

use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during branch queries
#[derive(Debug, Error)]
pub enum BranchRepoError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, FromRow)]
struct OwnerGovernorateRow {
    owner_user_id: i32,
    governorate: String,
}

/// For each given owner, the governorate of their first branch that has
/// one (first by branch id, matching insertion order).
pub async fn governorates_by_owner(
    pool: &PgPool,
    owner_user_ids: &[i32],
) -> Result<HashMap<i32, String>, BranchRepoError> {
    if owner_user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, OwnerGovernorateRow>(
        r#"
        SELECT DISTINCT ON (owner_user_id)
            owner_user_id,
            governorate
        FROM branches
        WHERE owner_user_id = ANY($1)
          AND governorate IS NOT NULL
        ORDER BY owner_user_id ASC, id ASC
        "#,
    )
    .bind(owner_user_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| (r.owner_user_id, r.governorate))
        .collect())
}
