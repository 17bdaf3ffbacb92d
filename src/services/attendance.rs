//! Attendance reconciliation
//!
//! Classifies every non-admin employee for an export window as Active,
//! OnVacation, or NoReports. Vacation strictly overrides activity: an
//! employee with reports and a vacation day in the window is
//! OnVacation. This makes the summary counts a true partition, so the
//! "missing" figure is counted directly instead of derived by
//! subtraction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::repos::employee_repo::EmployeeRow;
use crate::repos::report_repo::ReportRow;
use crate::repos::vacation_repo::VacationRow;

/// Per-employee classification for one export window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttendanceStatus {
    Active,
    OnVacation,
    NoReports,
}

impl AttendanceStatus {
    /// Display label as it appears in the summary sheet
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Active => "Active",
            AttendanceStatus::OnVacation => "On Vacation",
            AttendanceStatus::NoReports => "No Reports",
        }
    }
}

/// Derived per-employee record, computed fresh on every export
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecord {
    pub employee_code: String,
    pub employee_name: String,
    pub reports_count: u32,
    pub stores_count: u32,
    pub last_report: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
}

/// The final [start, end] date pair used for vacation classification,
/// after fallback policy. Distinct from the raw filter strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Resolve the vacation window from the raw date filter strings.
///
/// A missing or unparseable start date falls back to the earliest
/// vacation date in the system, then to 30 days before today. The end
/// date symmetrically falls back to the latest vacation date, then to
/// today. Malformed input never surfaces as an error.
pub fn resolve_window(
    start_raw: Option<&str>,
    end_raw: Option<&str>,
    vacation_bounds: (Option<NaiveDate>, Option<NaiveDate>),
    today: NaiveDate,
) -> ResolvedWindow {
    let (earliest_vacation, latest_vacation) = vacation_bounds;

    let start = parse_date(start_raw).unwrap_or_else(|| {
        earliest_vacation.unwrap_or_else(|| today - chrono::Duration::days(30))
    });

    let end = parse_date(end_raw).unwrap_or_else(|| latest_vacation.unwrap_or(today));

    ResolvedWindow { start, end }
}

/// Parse a `YYYY-MM-DD` filter value; empty, absent, and malformed all
/// yield `None`.
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Reconcile filtered reports, the full employee roster, and the
/// window-scoped vacation set into one record per employee.
///
/// `vacations` must already be restricted to the resolved window.
/// Output is sorted by display name then employee code, so duplicate
/// names always land in the same row order.
pub fn reconcile(
    reports: &[ReportRow],
    employees: &[EmployeeRow],
    vacations: &[VacationRow],
) -> Vec<AttendanceRecord> {
    struct Stats {
        name: String,
        stores: HashSet<i32>,
        reports_count: u32,
        last_report: Option<DateTime<Utc>>,
    }

    let mut stats: HashMap<String, Stats> = HashMap::new();

    for report in reports {
        let entry = stats
            .entry(report.employee_code.clone())
            .or_insert_with(|| Stats {
                name: report.employee_name.clone(),
                stores: HashSet::new(),
                reports_count: 0,
                last_report: None,
            });
        entry.stores.insert(report.store_id);
        entry.reports_count += 1;
        if entry.last_report.map_or(true, |d| report.report_date > d) {
            entry.last_report = Some(report.report_date);
        }
    }

    // Employees with zero matching reports still get a record
    for employee in employees {
        stats
            .entry(employee.employee_code.clone())
            .or_insert_with(|| Stats {
                name: employee.employee_name.clone(),
                stores: HashSet::new(),
                reports_count: 0,
                last_report: None,
            });
    }

    let on_vacation: HashSet<&str> = vacations
        .iter()
        .map(|v| v.employee_code.as_str())
        .collect();

    let mut records: Vec<AttendanceRecord> = stats
        .into_iter()
        .map(|(code, s)| {
            let status = if on_vacation.contains(code.as_str()) {
                AttendanceStatus::OnVacation
            } else if s.reports_count > 0 {
                AttendanceStatus::Active
            } else {
                AttendanceStatus::NoReports
            };
            AttendanceRecord {
                employee_code: code,
                employee_name: s.name,
                reports_count: s.reports_count,
                stores_count: s.stores.len() as u32,
                last_report: s.last_report,
                status,
            }
        })
        .collect();

    records.sort_by(|a, b| {
        a.employee_name
            .cmp(&b.employee_name)
            .then_with(|| a.employee_code.cmp(&b.employee_code))
    });
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn employee(code: &str, name: &str) -> EmployeeRow {
        EmployeeRow {
            id: 0,
            employee_code: code.to_string(),
            employee_name: name.to_string(),
        }
    }

    fn vacation(code: &str, name: &str, date: NaiveDate) -> VacationRow {
        VacationRow {
            user_id: 0,
            employee_code: code.to_string(),
            employee_name: name.to_string(),
            vacation_date: date,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn report(code: &str, name: &str, store_id: i32, day: u32) -> ReportRow {
        ReportRow {
            id: 0,
            user_id: 0,
            report_date: Utc.with_ymd_and_hms(2025, 8, day, 9, 0, 0).unwrap(),
            created_at: Utc.with_ymd_and_hms(2025, 8, day, 9, 5, 0).unwrap(),
            status: "new".to_string(),
            is_read: false,
            employee_code: code.to_string(),
            employee_name: name.to_string(),
            store_id,
            store_code: format!("S{store_id}"),
            store_name: format!("Store {store_id}"),
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
    fn explicit_dates_win() {
        let window = resolve_window(
            Some("2025-08-01"),
            Some("2025-08-05"),
            (Some(date(2020, 1, 1)), Some(date(2030, 1, 1))),
            date(2025, 8, 20),
        );
        assert_eq!(window.start, date(2025, 8, 1));
        assert_eq!(window.end, date(2025, 8, 5));
    }

    #[test]
    fn malformed_dates_fall_back_to_vacation_bounds() {
        let window = resolve_window(
            Some("08/01/2025"),
            Some("not-a-date"),
            (Some(date(2025, 7, 10)), Some(date(2025, 8, 12))),
            date(2025, 8, 20),
        );
        assert_eq!(window.start, date(2025, 7, 10));
        assert_eq!(window.end, date(2025, 8, 12));
    }

    #[test]
    fn no_vacations_fall_back_to_thirty_day_window() {
        let window = resolve_window(None, None, (None, None), date(2025, 8, 20));
        assert_eq!(window.start, date(2025, 7, 21));
        assert_eq!(window.end, date(2025, 8, 20));
    }

    #[test]
    fn reconcile_counts_distinct_stores_and_latest_report() {
        let reports = vec![
            report("001", "Ali", 1, 1),
            report("001", "Ali", 1, 3),
            report("001", "Ali", 2, 2),
        ];
        let employees = vec![employee("001", "Ali")];
        let records = reconcile(&reports, &employees, &[]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reports_count, 3);
        assert_eq!(records[0].stores_count, 2);
        assert_eq!(
            records[0].last_report,
            Some(Utc.with_ymd_and_hms(2025, 8, 3, 9, 0, 0).unwrap())
        );
        assert_eq!(records[0].status, AttendanceStatus::Active);
    }

    #[test]
    fn vacation_overrides_active() {
        let reports = vec![report("001", "Ali", 1, 1)];
        let employees = vec![employee("001", "Ali")];
        let vacations = vec![vacation("001", "Ali", date(2025, 8, 2))];

        let records = reconcile(&reports, &employees, &vacations);
        assert_eq!(records[0].status, AttendanceStatus::OnVacation);
        // Activity stats are still reported alongside the status
        assert_eq!(records[0].reports_count, 1);
    }

    #[test]
    fn absent_employees_are_no_reports() {
        let employees = vec![employee("001", "Ali"), employee("002", "Mona")];
        let records = reconcile(&[], &employees, &[]);

        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .all(|r| r.status == AttendanceStatus::NoReports && r.reports_count == 0));
    }

    #[test]
    fn output_is_sorted_by_display_name() {
        let employees = vec![
            employee("003", "Ziad"),
            employee("001", "Ali"),
            employee("002", "Mona"),
        ];
        let records = reconcile(&[], &employees, &[]);
        let names: Vec<&str> = records.iter().map(|r| r.employee_name.as_str()).collect();
        assert_eq!(names, vec!["Ali", "Mona", "Ziad"]);
    }

    #[test]
    fn duplicate_names_keep_a_stable_code_order_across_reruns() {
        let employees: Vec<EmployeeRow> = (1..=20)
            .map(|i| employee(&format!("{i:03}"), "Mohamed Ali"))
            .collect();
        let expected: Vec<String> = (1..=20).map(|i| format!("{i:03}")).collect();

        for _ in 0..10 {
            let records = reconcile(&[], &employees, &[]);
            let codes: Vec<String> = records.iter().map(|r| r.employee_code.clone()).collect();
            assert_eq!(codes, expected);
        }
    }
}
