//! Sheet identifier derivation
//!
//! Workbook sheet names are externally visible and capped at 31
//! characters by the xlsx format. Names are derived from the employee's
//! display name and code, sanitized and de-duplicated. All length
//! arithmetic is in characters, not bytes: display names are routinely
//! Arabic.

use std::collections::HashSet;

/// Reserved name of the always-present summary sheet
pub const SUMMARY_SHEET_NAME: &str = "Reports Summary";

/// Name of the placeholder sheet emitted when no reports matched
pub const NO_REPORTS_SHEET_NAME: &str = "No Reports Found";

/// Hard ceiling imposed by the xlsx format
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Allocates unique sheet names for one export run.
///
/// The summary sheet name is reserved up front so no per-employee sheet
/// can collide with it.
#[derive(Debug)]
pub struct SheetNamer {
    used: HashSet<String>,
}

impl Default for SheetNamer {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetNamer {
    pub fn new() -> Self {
        let mut used = HashSet::new();
        used.insert(SUMMARY_SHEET_NAME.to_string());
        SheetNamer { used }
    }

    /// Derive and reserve a unique sheet name for one employee group.
    ///
    /// `multi` is true when the export contains more than one employee
    /// group; the single-employee export prefers the bare name.
    pub fn assign(&mut self, employee_code: &str, employee_name: &str, multi: bool) -> String {
        let clean_code = sanitize(employee_code.trim());
        let clean_name = sanitize_name(employee_name);

        let mut base = if clean_name.is_empty() {
            tracing::warn!(
                employee_code = %employee_code,
                "employee name missing during sheet naming, using fallback"
            );
            if multi {
                clean_code.clone()
            } else {
                "Report".to_string()
            }
        } else if multi {
            format!("{clean_name}_{clean_code}")
        } else if clean_name.chars().count() <= 25 {
            clean_name.clone()
        } else {
            "Report".to_string()
        };

        if base.chars().count() > MAX_SHEET_NAME_LEN {
            if multi {
                // Truncate the name portion, keeping the full _code suffix
                let code_part_len = clean_code.chars().count() + 1;
                let available_for_name = MAX_SHEET_NAME_LEN.saturating_sub(code_part_len);
                if available_for_name > 3 {
                    let truncated: String = clean_name.chars().take(available_for_name).collect();
                    base = format!("{truncated}_{clean_code}");
                } else {
                    base = clean_code.chars().take(MAX_SHEET_NAME_LEN).collect();
                }
            } else {
                base = base.chars().take(MAX_SHEET_NAME_LEN).collect();
            }
        }

        // Append _1, _2, ... until unique, shortening the base as needed
        let mut final_name = base.clone();
        let mut counter = 1u32;
        while self.used.contains(&final_name) {
            let suffix = format!("_{counter}");
            if base.chars().count() + suffix.chars().count() <= MAX_SHEET_NAME_LEN {
                final_name = format!("{base}{suffix}");
            } else {
                let keep = MAX_SHEET_NAME_LEN - suffix.chars().count();
                let truncated: String = base.chars().take(keep).collect();
                final_name = format!("{truncated}{suffix}");
            }
            counter += 1;
        }

        self.used.insert(final_name.clone());
        final_name
    }
}

/// Strip the characters xlsx forbids in sheet names: \ / * [ ] : ?
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '[' | ']' | ':' | '?'))
        .collect()
}

/// Sanitize a display name: strip forbidden characters, then collapse
/// whitespace runs into single underscores.
pub fn sanitize_name(name: &str) -> String {
    let stripped = sanitize(name.trim());
    let mut out = String::with_capacity(stripped.len());
    let mut in_whitespace = false;
    for c in stripped.chars() {
        if c.is_whitespace() {
            if !in_whitespace && !out.is_empty() {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_is_noop_on_clean_input() {
        assert_eq!(sanitize("Mohamed Ali"), "Mohamed Ali");
        assert_eq!(sanitize_name("Mohamed_Ali"), "Mohamed_Ali");
    }

    #[test]
    fn sanitize_strips_forbidden_characters() {
        assert_eq!(sanitize(r"a\b/c*d[e]f:g?h"), "abcdefgh");
    }

    #[test]
    fn sanitize_name_collapses_whitespace() {
        assert_eq!(sanitize_name("  Mohamed   Ali "), "Mohamed_Ali");
        assert_eq!(sanitize_name("A\tB\nC"), "A_B_C");
    }

    #[test]
    fn multi_employee_name_is_name_underscore_code() {
        let mut namer = SheetNamer::new();
        assert_eq!(namer.assign("001", "Mohamed Ali", true), "Mohamed_Ali_001");
        assert_eq!(namer.assign("002", "Mohamed Ali", true), "Mohamed_Ali_002");
    }

    #[test]
    fn single_employee_prefers_bare_name() {
        let mut namer = SheetNamer::new();
        assert_eq!(namer.assign("001", "Mohamed Ali", false), "Mohamed_Ali");
    }

    #[test]
    fn single_employee_long_name_falls_back_to_report() {
        let mut namer = SheetNamer::new();
        let name = "An Extremely Long Employee Name Indeed";
        assert_eq!(namer.assign("001", name, false), "Report");
    }

    #[test]
    fn missing_name_uses_code_in_multi_export() {
        let mut namer = SheetNamer::new();
        assert_eq!(namer.assign("007", "   ", true), "007");
        let mut namer = SheetNamer::new();
        assert_eq!(namer.assign("007", "", false), "Report");
    }

    #[test]
    fn long_name_is_truncated_to_fit_code_suffix() {
        let mut namer = SheetNamer::new();
        let name = "Abcdefghijklmnopqrstuvwxyz Abcdefghijklmnop";
        let assigned = namer.assign("12345", name, true);
        assert_eq!(assigned.chars().count(), MAX_SHEET_NAME_LEN);
        assert!(assigned.ends_with("_12345"));
    }

    #[test]
    fn oversized_code_stands_alone_truncated() {
        let mut namer = SheetNamer::new();
        let code = "0123456789012345678901234567890123456789";
        let assigned = namer.assign(code, "Someone", true);
        assert_eq!(assigned.chars().count(), MAX_SHEET_NAME_LEN);
        assert!(!assigned.contains("Someone"));
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let mut namer = SheetNamer::new();
        let first = namer.assign("001", "Ali", true);
        let second = namer.assign("001", "Ali", true);
        let third = namer.assign("001", "Ali", true);
        assert_eq!(first, "Ali_001");
        assert_eq!(second, "Ali_001_1");
        assert_eq!(third, "Ali_001_2");
    }

    #[test]
    fn summary_name_is_reserved() {
        let mut namer = SheetNamer::new();
        let assigned = namer.assign("Summary", "Reports", true);
        assert_ne!(assigned, SUMMARY_SHEET_NAME);
    }

    #[test]
    fn pathological_duplicates_stay_unique_and_bounded() {
        let mut namer = SheetNamer::new();
        let long_name = "Abcdefghijklmnopqrstuvwxyzabcde";
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            let assigned = namer.assign("99999999", long_name, true);
            assert!(assigned.chars().count() <= MAX_SHEET_NAME_LEN);
            assert!(seen.insert(assigned), "duplicate sheet name produced");
        }
    }

    #[test]
    fn arabic_names_truncate_on_character_boundaries() {
        let mut namer = SheetNamer::new();
        let name = "\u{645}\u{62d}\u{645}\u{62f} ".repeat(12); // well past the limit
        let assigned = namer.assign("001", &name, true);
        assert!(assigned.chars().count() <= MAX_SHEET_NAME_LEN);
        assert!(assigned.ends_with("_001"));
    }
}
