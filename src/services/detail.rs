//! Per-employee detail sheet
//!
//! Reproduces the reporting template administrators receive: three
//! stacked header rows (merged section banners, merged sub-headers,
//! then the 16 column headers), one row per report, and content-driven
//! row/column sizing. Column order is part of the external interface.

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Worksheet, XlsxError};
use std::collections::HashMap;

use crate::repos::report_repo::ReportRow;
use crate::services::local_time;

const SECTION_GREEN: u32 = 0xE2EFDA; // AM-SPVR & store information
const SECTION_BLUE: u32 = 0xD9E1F2; // sales movement, VOD, result & action
const SECTION_ORANGE: u32 = 0xFCE4D6; // Samsung product availability
const SECTION_YELLOW: u32 = 0xFFF2CC; // store activities
const BRIGHT_YELLOW: u32 = 0xFFFF00; // combined free-text columns

const MIN_ROW_HEIGHT: f64 = 20.0;
const MAX_ROW_HEIGHT: f64 = 100.0;
const MAX_COLUMN_WIDTH: f64 = 50.0;

struct ColumnSpec {
    header: &'static str,
    width: f64,
    color: u32,
}

const COLUMNS: [ColumnSpec; 16] = [
    ColumnSpec { header: "Date", width: 12.0, color: SECTION_GREEN },
    ColumnSpec { header: "SPVR Code", width: 12.0, color: SECTION_GREEN },
    ColumnSpec { header: "SPVR Name", width: 20.0, color: SECTION_GREEN },
    ColumnSpec { header: "Shop code", width: 12.0, color: SECTION_GREEN },
    ColumnSpec { header: "Shop Name", width: 25.0, color: SECTION_GREEN },
    ColumnSpec { header: "Area", width: 15.0, color: SECTION_GREEN },
    ColumnSpec { header: "Governorate", width: 15.0, color: SECTION_GREEN },
    ColumnSpec { header: "Samsung", width: 35.0, color: SECTION_BLUE },
    ColumnSpec { header: "Competitors", width: 35.0, color: SECTION_BLUE },
    ColumnSpec { header: "TV", width: 30.0, color: SECTION_ORANGE },
    ColumnSpec { header: "HA", width: 30.0, color: SECTION_ORANGE },
    ColumnSpec { header: "SFO, PMT", width: 25.0, color: SECTION_YELLOW },
    ColumnSpec { header: "Display", width: 25.0, color: SECTION_YELLOW },
    ColumnSpec { header: "Store Issue", width: 25.0, color: SECTION_YELLOW },
    ColumnSpec { header: "Complaints, Issues, Requirements", width: 40.0, color: BRIGHT_YELLOW },
    ColumnSpec { header: "Store, Member", width: 40.0, color: BRIGHT_YELLOW },
];

struct Banner {
    text: &'static str,
    first_col: u16,
    last_col: u16,
    color: u32,
}

const MAIN_BANNERS: [Banner; 6] = [
    Banner { text: "AM-SPVR & Store Information", first_col: 0, last_col: 6, color: SECTION_GREEN },
    Banner { text: "Sales Movement", first_col: 7, last_col: 8, color: SECTION_BLUE },
    Banner { text: "Samsung Product Availability", first_col: 9, last_col: 10, color: SECTION_ORANGE },
    Banner { text: "Store Activities", first_col: 11, last_col: 13, color: SECTION_YELLOW },
    Banner { text: "VOD", first_col: 14, last_col: 14, color: SECTION_BLUE },
    Banner { text: "Result & Action", first_col: 15, last_col: 15, color: SECTION_BLUE },
];

const SUB_BANNERS: [Banner; 8] = [
    Banner { text: "Member Data", first_col: 0, last_col: 2, color: SECTION_GREEN },
    Banner { text: "Shop Data", first_col: 3, last_col: 6, color: SECTION_GREEN },
    Banner { text: "Samsung & Competitors (LG, Araby, Others)", first_col: 7, last_col: 8, color: SECTION_BLUE },
    Banner { text: "Ditributor, Key Model, Flag", first_col: 9, last_col: 9, color: SECTION_ORANGE },
    Banner { text: "Ditributor, Key Model, Flag", first_col: 10, last_col: 10, color: SECTION_ORANGE },
    Banner { text: "Samsung & Competitors", first_col: 11, last_col: 13, color: SECTION_YELLOW },
    Banner { text: "Store & Dealer's Situation", first_col: 14, last_col: 14, color: BRIGHT_YELLOW },
    Banner { text: "What I did ?", first_col: 15, last_col: 15, color: BRIGHT_YELLOW },
];

/// Pick the governorate for one report: store first, then area, then
/// the reporting employee's first branch that has one.
pub fn resolve_governorate(report: &ReportRow, branch_governorates: &HashMap<i32, String>) -> String {
    if let Some(governorate) = report.store_governorate.as_deref() {
        if !governorate.is_empty() {
            return governorate.to_string();
        }
    }
    if let Some(governorate) = report.area_governorate.as_deref() {
        if !governorate.is_empty() {
            return governorate.to_string();
        }
    }
    branch_governorates
        .get(&report.user_id)
        .cloned()
        .unwrap_or_default()
}

/// The 16 cell values for one report row, in column order
pub fn detail_row_values(report: &ReportRow, governorate: &str) -> [String; 16] {
    let text = |field: &Option<String>| field.clone().unwrap_or_default();
    [
        local_time::utc_to_local(report.report_date)
            .format("%Y-%m-%d")
            .to_string(),
        report.employee_code.clone(),
        report.employee_name.clone(),
        report.store_code.clone(),
        report.store_name.clone(),
        report.area_name.clone(),
        governorate.to_string(),
        text(&report.samsung_sales),
        text(&report.competitors_sales),
        text(&report.tv_availability),
        text(&report.ha_availability),
        text(&report.sfo_pmt),
        text(&report.display_activities),
        text(&report.store_issues),
        text(&report.complaints),
        text(&report.actions_taken),
    ]
}

/// Estimate the display height for one data row: wrapped line count
/// at ~0.8 characters per width unit, 15 points per line plus padding,
/// clamped to [20, 100].
pub fn estimate_row_height(values: &[String], widths: &[f64]) -> f64 {
    let mut max_lines = 1usize;
    for (i, value) in values.iter().enumerate() {
        if value.is_empty() {
            continue;
        }
        let width = widths.get(i).copied().unwrap_or(15.0);
        let chars_per_line = ((width * 0.8) as usize).max(10);
        let len = value.chars().count();
        let mut lines = len / chars_per_line + usize::from(len % chars_per_line > 0);
        lines = lines.max(1);
        if value.contains('\n') {
            lines = lines.max(value.lines().count());
        }
        max_lines = max_lines.max(lines);
    }
    let height = (max_lines as f64 * 15.0 + 5.0).max(MIN_ROW_HEIGHT);
    height.min(MAX_ROW_HEIGHT)
}

/// Fit one column to its content: longest line plus margin, capped at
/// 50, never below the preset template width.
pub fn fit_column_width(header: &str, values: &[&str], preset: f64) -> f64 {
    let mut max_width = header.chars().count() as f64 + 3.0;
    for value in values {
        let longest_line = value
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        if longest_line > 0 {
            max_width = max_width.max(longest_line as f64 + 3.0);
        }
    }
    max_width.min(MAX_COLUMN_WIDTH).max(preset)
}

/// Render one employee's detail sheet.
pub fn write_detail_sheet(
    ws: &mut Worksheet,
    reports: &[ReportRow],
    branch_governorates: &HashMap<i32, String>,
) -> Result<(), XlsxError> {
    let center = |f: Format| {
        f.set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
    };

    let banner_fmt = |color: u32, size: f64| {
        center(
            Format::new()
                .set_font_name("Calibri")
                .set_font_size(size)
                .set_bold()
                .set_background_color(Color::RGB(color)),
        )
    };

    let data_fmt = Format::new()
        .set_font_name("Calibri")
        .set_font_size(9)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::Top)
        .set_text_wrap()
        .set_border(FormatBorder::Thin);

    // Row 0: merged section banners
    for banner in &MAIN_BANNERS {
        let fmt = banner_fmt(banner.color, 11.0);
        if banner.first_col == banner.last_col {
            ws.write_string_with_format(0, banner.first_col, banner.text, &fmt)?;
        } else {
            ws.merge_range(0, banner.first_col, 0, banner.last_col, banner.text, &fmt)?;
        }
    }

    // Row 1: merged sub-headers
    for banner in &SUB_BANNERS {
        let fmt = banner_fmt(banner.color, 10.0);
        if banner.first_col == banner.last_col {
            ws.write_string_with_format(1, banner.first_col, banner.text, &fmt)?;
        } else {
            ws.merge_range(1, banner.first_col, 1, banner.last_col, banner.text, &fmt)?;
        }
    }

    // Row 2: column headers
    for (col, spec) in COLUMNS.iter().enumerate() {
        let fmt = banner_fmt(spec.color, 10.0);
        ws.write_string_with_format(2, col as u16, spec.header, &fmt)?;
    }

    // Data rows
    let mut all_rows: Vec<[String; 16]> = Vec::with_capacity(reports.len());
    for (idx, report) in reports.iter().enumerate() {
        let governorate = resolve_governorate(report, branch_governorates);
        let values = detail_row_values(report, &governorate);
        for (col, value) in values.iter().enumerate() {
            ws.write_string_with_format(3 + idx as u32, col as u16, value, &data_fmt)?;
        }
        all_rows.push(values);
    }

    // Column widths: content-fitted, template widths as minimum
    let mut widths = [0.0f64; 16];
    for (col, spec) in COLUMNS.iter().enumerate() {
        let column_values: Vec<&str> = all_rows.iter().map(|r| r[col].as_str()).collect();
        widths[col] = fit_column_width(spec.header, &column_values, spec.width);
        ws.set_column_width(col as u16, widths[col])?;
    }

    // Row heights driven by the fitted widths
    ws.set_row_height(0, 30)?;
    ws.set_row_height(1, 25)?;
    ws.set_row_height(2, 25)?;
    for (idx, values) in all_rows.iter().enumerate() {
        ws.set_row_height(3 + idx as u32, estimate_row_height(values, &widths))?;
    }

    ws.set_freeze_panes(3, 0)?;

    // Print setup: landscape A4 covering all data
    ws.set_landscape();
    ws.set_paper_size(9);
    ws.set_margins(0.5, 0.5, 0.75, 0.75, 0.3, 0.3);
    let last_row = 2 + reports.len() as u32;
    ws.set_print_area(0, 0, last_row, (COLUMNS.len() - 1) as u16)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn report() -> ReportRow {
        ReportRow {
            id: 1,
            user_id: 7,
            report_date: Utc.with_ymd_and_hms(2025, 8, 3, 10, 0, 0).unwrap(),
            created_at: Utc.with_ymd_and_hms(2025, 8, 3, 10, 5, 0).unwrap(),
            status: "new".to_string(),
            is_read: false,
            employee_code: "001".to_string(),
            employee_name: "Ali".to_string(),
            store_id: 3,
            store_code: "S3".to_string(),
            store_name: "Downtown".to_string(),
            store_governorate: None,
            area_name: "East".to_string(),
            area_governorate: None,
            samsung_sales: Some("Strong week".to_string()),
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
    fn governorate_prefers_store_then_area_then_branch() {
        let mut r = report();
        let branches: HashMap<i32, String> = [(7, "Giza".to_string())].into_iter().collect();

        assert_eq!(resolve_governorate(&r, &branches), "Giza");

        r.area_governorate = Some("Cairo".to_string());
        assert_eq!(resolve_governorate(&r, &branches), "Cairo");

        r.store_governorate = Some("Alexandria".to_string());
        assert_eq!(resolve_governorate(&r, &branches), "Alexandria");
    }

    #[test]
    fn governorate_empty_when_no_source_has_one() {
        let r = report();
        assert_eq!(resolve_governorate(&r, &HashMap::new()), "");
    }

    #[test]
    fn row_values_follow_the_column_contract() {
        let r = report();
        let values = detail_row_values(&r, "Giza");
        assert_eq!(values[0], "2025-08-03");
        assert_eq!(values[1], "001");
        assert_eq!(values[2], "Ali");
        assert_eq!(values[3], "S3");
        assert_eq!(values[4], "Downtown");
        assert_eq!(values[5], "East");
        assert_eq!(values[6], "Giza");
        assert_eq!(values[7], "Strong week");
        // Absent free-text fields render as empty strings
        assert!(values[8..].iter().all(|v| v.is_empty()));
    }

    #[test]
    fn short_content_gets_minimum_row_height() {
        let values = vec!["short".to_string(), "also short".to_string()];
        let widths = vec![12.0, 20.0];
        assert_eq!(estimate_row_height(&values, &widths), MIN_ROW_HEIGHT);
    }

    #[test]
    fn long_content_grows_but_is_capped() {
        let values = vec!["x".repeat(2000)];
        let widths = vec![12.0];
        assert_eq!(estimate_row_height(&values, &widths), MAX_ROW_HEIGHT);
    }

    #[test]
    fn explicit_line_breaks_raise_the_estimate() {
        let values = vec!["a\nb\nc\nd".to_string()];
        let widths = vec![40.0];
        // 4 lines * 15 + 5
        assert_eq!(estimate_row_height(&values, &widths), 65.0);
    }

    #[test]
    fn column_width_never_shrinks_below_preset() {
        assert_eq!(fit_column_width("TV", &["ok"], 30.0), 30.0);
    }

    #[test]
    fn column_width_grows_with_content_up_to_cap() {
        let long = "y".repeat(120);
        assert_eq!(fit_column_width("Samsung", &[long.as_str()], 35.0), MAX_COLUMN_WIDTH);
        let medium = "z".repeat(40);
        assert_eq!(fit_column_width("Samsung", &[medium.as_str()], 35.0), 43.0);
    }

    #[test]
    fn detail_sheet_renders_without_error() {
        let mut ws = Worksheet::new();
        write_detail_sheet(&mut ws, &[report()], &HashMap::new()).expect("detail sheet renders");
    }
}
