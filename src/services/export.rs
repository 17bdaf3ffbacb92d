//! Export orchestration
//!
//! Builds the downloadable workbook for one request: resolves filters,
//! fetches reports and the employee/vacation universe, reconciles
//! attendance, then renders one summary sheet plus one detail sheet per
//! employee group (or a placeholder sheet when nothing matched).

use rust_xlsxwriter::{Workbook, XlsxError};
use sqlx::PgPool;
use std::collections::HashMap;
use thiserror::Error;

use crate::repos::branch_repo::{self, BranchRepoError};
use crate::repos::employee_repo::{self, EmployeeRepoError};
use crate::repos::report_repo::{self, ReportFilters, ReportRepoError, ReportRow};
use crate::repos::vacation_repo::{self, VacationRepoError};
use crate::services::attendance;
use crate::services::detail;
use crate::services::local_time;
use crate::services::sheet_names::{SheetNamer, NO_REPORTS_SHEET_NAME, SUMMARY_SHEET_NAME};
use crate::services::summary;

/// MIME type of the produced artifact
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Raw query parameters of the export entry point
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub employee_name: Option<String>,
    pub employee_code: Option<String>,
    pub store_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// The finished download: filename plus workbook bytes
#[derive(Debug)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Errors that abort an export request.
///
/// Only repository failures and workbook serialization reach here; all
/// per-record derivation problems (bad dates, missing names) are
/// recovered with documented fallbacks further down.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Report repository error: {0}")]
    Reports(#[from] ReportRepoError),

    #[error("Employee repository error: {0}")]
    Employees(#[from] EmployeeRepoError),

    #[error("Vacation repository error: {0}")]
    Vacations(#[from] VacationRepoError),

    #[error("Branch repository error: {0}")]
    Branches(#[from] BranchRepoError),

    #[error("Workbook error: {0}")]
    Workbook(#[from] XlsxError),
}

/// One employee's reports within one export run, in query order
#[derive(Debug)]
pub struct SheetGroup {
    pub employee_code: String,
    pub employee_name: String,
    pub reports: Vec<ReportRow>,
}

/// Partition reports by (employee_code, employee_name), preserving the
/// first-seen order of groups. Sheet creation order follows this; the
/// summary sheet sorts its own rows independently.
pub fn group_reports(reports: Vec<ReportRow>) -> Vec<SheetGroup> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut groups: Vec<SheetGroup> = Vec::new();

    for report in reports {
        let key = (report.employee_code.clone(), report.employee_name.clone());
        match index.get(&key) {
            Some(&i) => groups[i].reports.push(report),
            None => {
                index.insert(key, groups.len());
                groups.push(SheetGroup {
                    employee_code: report.employee_code.clone(),
                    employee_name: report.employee_name.clone(),
                    reports: vec![report],
                });
            }
        }
    }

    groups
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Translate raw query params into repository filters.
///
/// For report filtering an invalid date is simply ignored (no bound),
/// which is narrower than the window-resolution fallback below.
fn report_filters(request: &ExportRequest) -> ReportFilters {
    ReportFilters {
        employee_name: non_empty(&request.employee_name),
        employee_code: non_empty(&request.employee_code),
        store_name: non_empty(&request.store_name),
        start: attendance::parse_date(request.start_date.as_deref())
            .map(local_time::day_start_utc),
        end: attendance::parse_date(request.end_date.as_deref()).map(local_time::day_end_utc),
    }
}

/// Run the whole export synchronously and return the finished artifact.
pub async fn generate_export(
    pool: &PgPool,
    request: &ExportRequest,
) -> Result<ExportArtifact, ExportError> {
    let filters = report_filters(request);
    let reports = report_repo::find_filtered(pool, &filters).await?;

    let vacation_bounds = vacation_repo::date_bounds(pool).await?;
    let window = attendance::resolve_window(
        request.start_date.as_deref(),
        request.end_date.as_deref(),
        vacation_bounds,
        local_time::today_local(),
    );

    let employees = employee_repo::find_non_admin(pool).await?;
    let vacations = vacation_repo::find_in_window(pool, window.start, window.end).await?;

    tracing::debug!(
        reports = reports.len(),
        employees = employees.len(),
        vacations = vacations.len(),
        window_start = %window.start,
        window_end = %window.end,
        "export data loaded"
    );

    let records = attendance::reconcile(&reports, &employees, &vacations);
    let summary_data = summary::build_summary(
        records,
        &vacations,
        window,
        request.start_date.clone(),
        request.end_date.clone(),
    );

    let mut workbook = Workbook::new();

    let summary_ws = workbook.add_worksheet();
    summary_ws.set_name(SUMMARY_SHEET_NAME)?;
    summary::write_summary_sheet(summary_ws, &summary_data)?;

    if reports.is_empty() {
        let (display_start, display_end) = (
            non_empty(&request.start_date).unwrap_or_else(|| "All".to_string()),
            non_empty(&request.end_date).unwrap_or_else(|| "All".to_string()),
        );
        let ws = workbook.add_worksheet();
        ws.set_name(NO_REPORTS_SHEET_NAME)?;
        ws.write_string(0, 0, "No reports found for the selected criteria")?;
        ws.write_string(1, 0, format!("Date range: {display_start} to {display_end}"))?;
        ws.write_string(
            2,
            0,
            "Check the 'Reports Summary' sheet for employee vacation status",
        )?;
    } else {
        let groups = group_reports(reports);
        let multi = groups.len() > 1;

        let owner_ids: Vec<i32> = {
            let mut ids: Vec<i32> = groups
                .iter()
                .flat_map(|g| g.reports.iter())
                .filter(|r| {
                    r.store_governorate.as_deref().unwrap_or("").is_empty()
                        && r.area_governorate.as_deref().unwrap_or("").is_empty()
                })
                .map(|r| r.user_id)
                .collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };
        let branch_governorates = branch_repo::governorates_by_owner(pool, &owner_ids).await?;

        let mut namer = SheetNamer::new();
        for group in &groups {
            let sheet_name = namer.assign(&group.employee_code, &group.employee_name, multi);
            let ws = workbook.add_worksheet();
            ws.set_name(&sheet_name)?;
            detail::write_detail_sheet(ws, &group.reports, &branch_governorates)?;
        }
    }

    let bytes = workbook.save_to_buffer()?;
    let filename = export_filename(local_time::now_local());

    Ok(ExportArtifact { filename, bytes })
}

/// Download filename for an export generated at the given local time
fn export_filename(generated_at: chrono::DateTime<chrono_tz::Tz>) -> String {
    format!("Report_{}.xlsx", generated_at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn report(code: &str, name: &str, id: i32) -> ReportRow {
        ReportRow {
            id,
            user_id: 1,
            report_date: Utc.with_ymd_and_hms(2025, 8, 3, 10, 0, 0).unwrap(),
            created_at: Utc.with_ymd_and_hms(2025, 8, 3, 10, 5, 0).unwrap(),
            status: "new".to_string(),
            is_read: false,
            employee_code: code.to_string(),
            employee_name: name.to_string(),
            store_id: 1,
            store_code: "S1".to_string(),
            store_name: "Store".to_string(),
            store_governorate: None,
            area_name: "Area".to_string(),
            area_governorate: None,
            samsung_sales: None,
            competitors_sales: None,
            tv_availability: None,
            ha_availability: None,
            sfo_pmt: None,
            display_activities: None,
            store_issues: None,
            complaints: None,
            actions_taken: None,
        }
    }

    #[test]
    fn groups_preserve_first_seen_order() {
        let reports = vec![
            report("002", "Mona", 1),
            report("001", "Ali", 2),
            report("002", "Mona", 3),
        ];
        let groups = group_reports(reports);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].employee_code, "002");
        assert_eq!(groups[0].reports.len(), 2);
        assert_eq!(groups[1].employee_code, "001");
    }

    #[test]
    fn same_name_different_codes_are_distinct_groups() {
        let reports = vec![
            report("001", "Mohamed Ali", 1),
            report("002", "Mohamed Ali", 2),
        ];
        let groups = group_reports(reports);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn invalid_filter_dates_are_dropped() {
        let request = ExportRequest {
            start_date: Some("not-a-date".to_string()),
            end_date: Some("2025-08-05".to_string()),
            ..Default::default()
        };
        let filters = report_filters(&request);
        assert!(filters.start.is_none());
        assert!(filters.end.is_some());
    }

    #[test]
    fn filename_is_report_prefixed_local_timestamp() {
        let generated_at = local_time::LOCAL_TZ
            .with_ymd_and_hms(2025, 8, 5, 14, 30, 9)
            .unwrap();
        assert_eq!(export_filename(generated_at), "Report_20250805_143009.xlsx");
    }

    #[test]
    fn blank_filters_are_dropped() {
        let request = ExportRequest {
            employee_name: Some("  ".to_string()),
            store_name: Some("Mall".to_string()),
            ..Default::default()
        };
        let filters = report_filters(&request);
        assert!(filters.employee_name.is_none());
        assert_eq!(filters.store_name.as_deref(), Some("Mall"));
    }
}
