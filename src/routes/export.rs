//! Export API route
//!
//! GET /api/admin/export streams back the generated workbook as an
//! attachment. "No matching reports" is not an error: the response is
//! still 200 with a valid (minimal) workbook.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;

use crate::services::export::{self, ExportRequest, XLSX_CONTENT_TYPE};

/// Query parameters for the export endpoint
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub employee_name: Option<String>,
    pub employee_code: Option<String>,
    pub store_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Error response body
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler for GET /api/admin/export
pub async fn export_reports(
    State(pool): State<Arc<PgPool>>,
    Query(params): Query<ExportQuery>,
) -> Result<Response, ExportErrorResponse> {
    let request = ExportRequest {
        employee_name: params.employee_name,
        employee_code: params.employee_code,
        store_name: params.store_name,
        start_date: params.start_date,
        end_date: params.end_date,
    };

    let artifact = export::generate_export(&pool, &request)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "export failed");
            ExportErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("Failed to generate export: {e}"),
            }
        })?;

    let headers = [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.filename),
        ),
    ];

    Ok((headers, artifact.bytes).into_response())
}

/// Error response wrapper for proper HTTP error handling
#[derive(Debug)]
pub struct ExportErrorResponse {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ExportErrorResponse {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
