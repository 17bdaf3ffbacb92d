//! Summary sheet: per-employee statistics, aggregate counters, and the
//! day-by-day vacation grid
//!
//! The compute half ([`build_summary`]) is pure and fully testable; the
//! render half writes the computed data into a worksheet with the
//! status color coding administrators rely on (green active, red
//! missing, yellow/orange vacation).

use chrono::NaiveDate;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Worksheet, XlsxError};
use std::collections::{BTreeSet, HashMap};

use crate::repos::vacation_repo::VacationRow;
use crate::services::attendance::{AttendanceRecord, AttendanceStatus, ResolvedWindow};
use crate::services::local_time;

const HEADER_BLUE: u32 = 0x4472C4;
const ACTIVE_GREEN: u32 = 0xE2EFDA;
const MISSING_RED: u32 = 0xFFE6E6;
const VACATION_YELLOW: u32 = 0xFFF2CC;
const MISSING_FONT_RED: u32 = 0xCC0000;
const VACATION_ORANGE: u32 = 0xFF8C00;

const MAIN_COLUMN_WIDTHS: [f64; 6] = [15.0, 25.0, 15.0, 15.0, 15.0, 15.0];
const GRID_DATE_COLUMN_WIDTH: f64 = 12.0;

/// Aggregate counters over the whole attendance record set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryTotals {
    pub total_employees: u32,
    pub active: u32,
    pub on_vacation: u32,
    pub missing: u32,
    pub total_reports: u32,
    pub total_stores: u32,
}

/// One row of the day-by-day vacation grid
#[derive(Debug, Clone)]
pub struct VacationGridRow {
    pub employee_code: String,
    pub employee_name: String,
    pub days: BTreeSet<NaiveDate>,
}

/// The vacation grid: one column per calendar day in the window, one
/// row per employee with at least one vacation day in it
#[derive(Debug, Clone)]
pub struct VacationGrid {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<VacationGridRow>,
}

/// Everything the summary sheet displays
#[derive(Debug, Clone)]
pub struct SummaryData {
    /// Raw requested dates, shown in titles as supplied (or
    /// "Beginning"/"End" when absent)
    pub requested_start: Option<String>,
    pub requested_end: Option<String>,
    pub window: ResolvedWindow,
    pub rows: Vec<AttendanceRecord>,
    pub totals: SummaryTotals,
    /// None when no employee has a vacation day in the window; the grid
    /// section is then omitted entirely
    pub grid: Option<VacationGrid>,
}

/// Build the summary data from reconciled attendance records and the
/// window-scoped vacation set.
///
/// Records are expected pre-sorted by display name (the reconciler's
/// output order); grid rows are re-sorted independently over the
/// vacationing subset.
pub fn build_summary(
    records: Vec<AttendanceRecord>,
    vacations: &[VacationRow],
    window: ResolvedWindow,
    requested_start: Option<String>,
    requested_end: Option<String>,
) -> SummaryData {
    let mut active = 0u32;
    let mut on_vacation = 0u32;
    let mut missing = 0u32;
    let mut total_reports = 0u32;
    let mut total_stores = 0u32;

    for record in &records {
        match record.status {
            AttendanceStatus::Active => active += 1,
            AttendanceStatus::OnVacation => on_vacation += 1,
            AttendanceStatus::NoReports => missing += 1,
        }
        total_reports += record.reports_count;
        total_stores += record.stores_count;
    }

    let totals = SummaryTotals {
        total_employees: records.len() as u32,
        active,
        on_vacation,
        missing,
        total_reports,
        total_stores,
    };
    // Status is a partition, so the three counters always add up
    debug_assert_eq!(
        totals.active + totals.on_vacation + totals.missing,
        totals.total_employees
    );

    let grid = build_grid(vacations, window);

    SummaryData {
        requested_start,
        requested_end,
        window,
        rows: records,
        totals,
        grid,
    }
}

fn build_grid(vacations: &[VacationRow], window: ResolvedWindow) -> Option<VacationGrid> {
    if vacations.is_empty() {
        return None;
    }

    let mut by_code: HashMap<&str, VacationGridRow> = HashMap::new();
    for vacation in vacations {
        by_code
            .entry(vacation.employee_code.as_str())
            .or_insert_with(|| VacationGridRow {
                employee_code: vacation.employee_code.clone(),
                employee_name: vacation.employee_name.clone(),
                days: BTreeSet::new(),
            })
            .days
            .insert(vacation.vacation_date);
    }

    let mut rows: Vec<VacationGridRow> = by_code.into_values().collect();
    rows.sort_by(|a, b| {
        a.employee_name
            .cmp(&b.employee_name)
            .then_with(|| a.employee_code.cmp(&b.employee_code))
    });

    let mut dates = Vec::new();
    let mut current = window.start;
    while current <= window.end {
        dates.push(current);
        current += chrono::Duration::days(1);
    }

    Some(VacationGrid { dates, rows })
}

fn display_range(data: &SummaryData) -> (String, String) {
    let start = match data.requested_start.as_deref() {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => "Beginning".to_string(),
    };
    let end = match data.requested_end.as_deref() {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => "End".to_string(),
    };
    (start, end)
}

struct SummaryFormats {
    title: Format,
    header: Format,
    data_center: Format,
    data_left: Format,
    missing_center: Format,
    missing_left: Format,
    vacation_center: Format,
    vacation_left: Format,
    active_status: Format,
    stats_header: Format,
    stats_label: Format,
    stats_value: Format,
    stats_value_orange: Format,
    stats_value_red: Format,
    grid_date_header: Format,
    grid_mark: Format,
    grid_empty: Format,
    legend_label: Format,
    legend_mark: Format,
}

impl SummaryFormats {
    fn new() -> Self {
        let center = |f: Format| {
            f.set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap()
        };
        let left = |f: Format| {
            f.set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap()
        };
        let bordered = |f: Format| f.set_border(FormatBorder::Thin);

        let data = || Format::new().set_font_name("Calibri").set_font_size(10);
        let missing = || {
            Format::new()
                .set_font_name("Calibri")
                .set_font_size(10)
                .set_bold()
                .set_font_color(Color::RGB(MISSING_FONT_RED))
                .set_background_color(Color::RGB(MISSING_RED))
        };
        let vacation = || {
            Format::new()
                .set_font_name("Calibri")
                .set_font_size(10)
                .set_bold()
                .set_font_color(Color::RGB(VACATION_ORANGE))
                .set_background_color(Color::RGB(VACATION_YELLOW))
        };

        SummaryFormats {
            title: center(Format::new().set_font_name("Calibri").set_font_size(14).set_bold()),
            header: center(bordered(
                Format::new()
                    .set_font_name("Calibri")
                    .set_font_size(12)
                    .set_bold()
                    .set_font_color(Color::White)
                    .set_background_color(Color::RGB(HEADER_BLUE)),
            )),
            data_center: center(bordered(data())),
            data_left: left(bordered(data())),
            missing_center: center(bordered(missing())),
            missing_left: left(bordered(missing())),
            vacation_center: center(bordered(vacation())),
            vacation_left: left(bordered(vacation())),
            active_status: center(bordered(
                data().set_background_color(Color::RGB(ACTIVE_GREEN)),
            )),
            stats_header: center(Format::new().set_font_name("Calibri").set_font_size(12).set_bold()),
            stats_label: left(Format::new().set_font_name("Calibri").set_font_size(10).set_bold()),
            stats_value: center(data()),
            stats_value_orange: center(
                Format::new()
                    .set_font_name("Calibri")
                    .set_font_size(10)
                    .set_bold()
                    .set_font_color(Color::RGB(VACATION_ORANGE)),
            ),
            stats_value_red: center(
                Format::new()
                    .set_font_name("Calibri")
                    .set_font_size(10)
                    .set_bold()
                    .set_font_color(Color::RGB(MISSING_FONT_RED)),
            ),
            grid_date_header: center(bordered(
                Format::new()
                    .set_font_name("Calibri")
                    .set_font_size(9)
                    .set_bold()
                    .set_font_color(Color::White)
                    .set_background_color(Color::RGB(HEADER_BLUE)),
            )),
            grid_mark: center(bordered(
                Format::new()
                    .set_font_name("Calibri")
                    .set_font_size(12)
                    .set_bold()
                    .set_font_color(Color::RGB(VACATION_ORANGE))
                    .set_background_color(Color::RGB(VACATION_YELLOW)),
            )),
            grid_empty: center(bordered(Format::new())),
            legend_label: Format::new().set_font_name("Calibri").set_font_size(10).set_bold(),
            legend_mark: center(bordered(vacation())),
        }
    }
}

/// Render the summary sheet: title, per-employee table, General
/// Statistics block, and (when present) the vacation grid.
pub fn write_summary_sheet(ws: &mut Worksheet, data: &SummaryData) -> Result<(), XlsxError> {
    let formats = SummaryFormats::new();
    let (display_start, display_end) = display_range(data);

    ws.merge_range(
        0,
        0,
        0,
        5,
        &format!("Reports Summary - From {display_start} To {display_end}"),
        &formats.title,
    )?;

    let headers = [
        "Employee Code",
        "Employee Name",
        "Stores Count",
        "Reports Count",
        "Last Report",
        "Status",
    ];
    for (col, header) in headers.iter().enumerate() {
        ws.write_string_with_format(2, col as u16, *header, &formats.header)?;
    }

    for (idx, record) in data.rows.iter().enumerate() {
        let row = 3 + idx as u32;
        let (center_fmt, left_fmt, status_fmt) = match record.status {
            AttendanceStatus::OnVacation => (
                &formats.vacation_center,
                &formats.vacation_left,
                &formats.vacation_center,
            ),
            AttendanceStatus::NoReports => (
                &formats.missing_center,
                &formats.missing_left,
                &formats.missing_center,
            ),
            AttendanceStatus::Active => (
                &formats.data_center,
                &formats.data_left,
                &formats.active_status,
            ),
        };

        ws.write_string_with_format(row, 0, &record.employee_code, center_fmt)?;
        ws.write_string_with_format(row, 1, &record.employee_name, left_fmt)?;
        ws.write_number_with_format(row, 2, record.stores_count as f64, center_fmt)?;
        ws.write_number_with_format(row, 3, record.reports_count as f64, center_fmt)?;
        let last_report = match record.last_report {
            Some(instant) => local_time::utc_to_local(instant).format("%Y-%m-%d").to_string(),
            None => "No Reports".to_string(),
        };
        ws.write_string_with_format(row, 4, &last_report, center_fmt)?;
        ws.write_string_with_format(row, 5, record.status.label(), status_fmt)?;
    }

    for (col, width) in MAIN_COLUMN_WIDTHS.iter().enumerate() {
        ws.set_column_width(col as u16, *width)?;
    }

    // General Statistics block, two blank rows below the table
    let stats_header_row = 3 + data.rows.len() as u32 + 2;
    ws.merge_range(
        stats_header_row,
        0,
        stats_header_row,
        1,
        "General Statistics",
        &formats.stats_header,
    )?;

    let totals = &data.totals;
    let stats: [(&str, u32); 6] = [
        ("Total Employees:", totals.total_employees),
        ("Active Employees:", totals.active),
        ("On Vacation:", totals.on_vacation),
        ("Missing Employees:", totals.missing),
        ("Total Reports:", totals.total_reports),
        ("Total Stores Reported:", totals.total_stores),
    ];
    for (i, (label, value)) in stats.iter().enumerate() {
        let row = stats_header_row + 1 + i as u32;
        ws.write_string_with_format(row, 0, *label, &formats.stats_label)?;
        let value_fmt = match *label {
            "On Vacation:" if *value > 0 => &formats.stats_value_orange,
            "Missing Employees:" if *value > 0 => &formats.stats_value_red,
            _ => &formats.stats_value,
        };
        ws.write_number_with_format(row, 1, *value as f64, value_fmt)?;
    }

    ws.set_freeze_panes(3, 0)?;

    if let Some(grid) = &data.grid {
        write_vacation_grid(
            ws,
            grid,
            stats_header_row + stats.len() as u32 + 3,
            &display_start,
            &display_end,
            &formats,
        )?;
    }

    Ok(())
}

fn write_vacation_grid(
    ws: &mut Worksheet,
    grid: &VacationGrid,
    start_row: u32,
    display_start: &str,
    display_end: &str,
    formats: &SummaryFormats,
) -> Result<(), XlsxError> {
    ws.merge_range(
        start_row,
        0,
        start_row,
        5,
        &format!("Vacation Details - From {display_start} To {display_end}"),
        &formats.title,
    )?;

    let header_row = start_row + 2;
    ws.write_string_with_format(header_row, 0, "Employee Code", &formats.header)?;
    ws.write_string_with_format(header_row, 1, "Employee Name", &formats.header)?;
    for (i, date) in grid.dates.iter().enumerate() {
        let col = 2 + i as u16;
        ws.write_string_with_format(
            header_row,
            col,
            &date.format("%Y-%m-%d").to_string(),
            &formats.grid_date_header,
        )?;
        ws.set_column_width(col, GRID_DATE_COLUMN_WIDTH)?;
    }

    for (idx, row_data) in grid.rows.iter().enumerate() {
        let row = header_row + 1 + idx as u32;
        ws.write_string_with_format(row, 0, &row_data.employee_code, &formats.data_center)?;
        ws.write_string_with_format(row, 1, &row_data.employee_name, &formats.data_left)?;
        for (i, date) in grid.dates.iter().enumerate() {
            let col = 2 + i as u16;
            if row_data.days.contains(date) {
                ws.write_string_with_format(row, col, "\u{2713}", &formats.grid_mark)?;
            } else {
                ws.write_string_with_format(row, col, "", &formats.grid_empty)?;
            }
        }
    }

    let legend_row = header_row + 1 + grid.rows.len() as u32 + 2;
    ws.write_string_with_format(legend_row, 0, "Legend:", &formats.legend_label)?;
    ws.write_string_with_format(
        legend_row + 1,
        0,
        "\u{2713} = On Vacation",
        &formats.legend_mark,
    )?;

    Ok(())
}
