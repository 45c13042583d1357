use std::env;

use chrono::{DateTime, Local, NaiveDate};

use crate::model::DateFormat;

/// ISO layout used in the persisted document
pub const ISO_DATE: &str = "%Y-%m-%d";

/// Date layout used at the presentation boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `mm/dd/yyyy`
    Us,
    /// `dd.mm.yyyy`
    European,
}

impl DateStyle {
    /// Resolve the configured preference, consulting the environment for `auto`.
    pub fn resolve(pref: DateFormat) -> Self {
        match pref {
            DateFormat::Us => DateStyle::Us,
            DateFormat::European => DateStyle::European,
            DateFormat::Auto => DateStyle::from_env(),
        }
    }

    /// `AppleLocale` first (macOS), then `LC_TIME`, then `LANG`.
    pub fn from_env() -> Self {
        if let Some(apple) = env::var("AppleLocale").ok().filter(|v| !v.is_empty()) {
            return DateStyle::from_apple_locale(&apple);
        }
        let lang = env::var("LC_TIME")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| env::var("LANG").ok())
            .unwrap_or_default();
        DateStyle::from_locale(&lang)
    }

    /// POSIX locale string such as `en_US.UTF-8`
    pub fn from_locale(locale: &str) -> Self {
        if locale.to_lowercase().contains("us") {
            DateStyle::Us
        } else {
            DateStyle::European
        }
    }

    /// Apple locale identifiers carry the region after `@rg=` or `_`
    /// (`de_DE@rg=uszzzz`, `en_US`).
    pub fn from_apple_locale(locale: &str) -> Self {
        let l = locale.to_lowercase();
        let region = if let Some(idx) = l.find("@rg=") {
            l.get(idx + 4..idx + 6)
        } else if let Some(idx) = l.find('_') {
            l.get(idx + 1..idx + 3)
        } else {
            None
        };
        let us = match region {
            Some(region) => region == "us",
            None => l.contains("us"),
        };
        if us { DateStyle::Us } else { DateStyle::European }
    }

    pub fn layout(self) -> &'static str {
        match self {
            DateStyle::Us => "%m/%d/%Y",
            DateStyle::European => "%d.%m.%Y",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            DateStyle::Us => "mm/dd/yyyy",
            DateStyle::European => "dd.mm.yyyy",
        }
    }

    fn separator(self) -> char {
        match self {
            DateStyle::Us => '/',
            DateStyle::European => '.',
        }
    }

    /// `2025-06-10` → `06/10/2025` or `10.06.2025`. Invalid input gives an empty string.
    pub fn iso_to_local(self, iso: &str) -> String {
        NaiveDate::parse_from_str(iso, ISO_DATE)
            .map(|d| d.format(self.layout()).to_string())
            .unwrap_or_default()
    }

    /// Inverse of [`iso_to_local`](Self::iso_to_local). Empty input is a valid "no date".
    pub fn local_to_iso(self, local: &str) -> Result<String, chrono::ParseError> {
        let local = local.trim();
        if local.is_empty() {
            return Ok(String::new());
        }
        let date = NaiveDate::parse_from_str(local, self.layout())?;
        Ok(date.format(ISO_DATE).to_string())
    }

    /// RFC3339 timestamp rendered as local date plus `HH:MM`
    pub fn timestamp_to_local(self, rfc3339: &str) -> String {
        DateTime::parse_from_rfc3339(rfc3339)
            .map(|dt| {
                dt.with_timezone(&Local)
                    .format(&format!("{} %H:%M", self.layout()))
                    .to_string()
            })
            .unwrap_or_default()
    }

    /// Re-insert separators while the user types digits into the due field:
    /// `1203` → `12.03.`, `12032023` → `12.03.2023`. At most 8 digits are kept.
    pub fn format_due_input(self, text: &str) -> String {
        let digits: String = text
            .chars()
            .filter(|c| *c != '.' && *c != '/')
            .take(8)
            .collect();
        let sep = self.separator();
        let n = digits.chars().count();
        if !digits.is_ascii() {
            return digits;
        }
        match n {
            0 | 1 => digits,
            2 | 3 => format!("{}{sep}{}", &digits[..2], &digits[2..]),
            4 => format!("{}{sep}{}{sep}", &digits[..2], &digits[2..4]),
            _ => format!("{}{sep}{}{sep}{}", &digits[..2], &digits[2..4], &digits[4..]),
        }
    }

    /// Backspace in the due field: drop the last digit and re-format.
    pub fn remove_last_due_digit(self, text: &str) -> String {
        let mut digits: String = text.chars().filter(|c| *c != '.' && *c != '/').collect();
        if digits.pop().is_none() {
            return String::new();
        }
        self.format_due_input(&digits)
    }
}

/// Urgency marker appended to a task title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueMarker {
    Today,
    Tomorrow,
}

impl DueMarker {
    pub fn label(self) -> &'static str {
        match self {
            DueMarker::Today => "[due!]",
            DueMarker::Tomorrow => "[tomorrow]",
        }
    }
}

/// Marker for an ISO due date relative to `today`. Past, later, empty and
/// unparseable dates get none.
pub fn due_marker(due: &str, today: NaiveDate) -> Option<DueMarker> {
    let date = NaiveDate::parse_from_str(due, ISO_DATE).ok()?;
    match (date - today).num_days() {
        0 => Some(DueMarker::Today),
        1 => Some(DueMarker::Tomorrow),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn due_markers_around_today() {
        let today = day(2025, 6, 10);
        assert_eq!(due_marker("2025-06-10", today), Some(DueMarker::Today));
        assert_eq!(due_marker("2025-06-11", today), Some(DueMarker::Tomorrow));
        assert_eq!(due_marker("2025-06-12", today), None);
        assert_eq!(due_marker("2025-06-09", today), None);
        assert_eq!(due_marker("", today), None);
        assert_eq!(due_marker("soon", today), None);
        assert_eq!(DueMarker::Today.label(), "[due!]");
        assert_eq!(DueMarker::Tomorrow.label(), "[tomorrow]");
    }

    #[test]
    fn locale_detection() {
        assert_eq!(DateStyle::from_locale("en_US.UTF-8"), DateStyle::Us);
        assert_eq!(DateStyle::from_locale("de_DE.UTF-8"), DateStyle::European);
        assert_eq!(DateStyle::from_locale(""), DateStyle::European);
        assert_eq!(DateStyle::from_apple_locale("de_DE@rg=uszzzz"), DateStyle::Us);
        assert_eq!(DateStyle::from_apple_locale("en_US"), DateStyle::Us);
        assert_eq!(DateStyle::from_apple_locale("en_GB"), DateStyle::European);
        assert_eq!(DateStyle::resolve(DateFormat::Us), DateStyle::Us);
        assert_eq!(DateStyle::resolve(DateFormat::European), DateStyle::European);
    }

    #[test]
    fn iso_round_trip_per_style() {
        assert_eq!(DateStyle::Us.iso_to_local("2025-06-10"), "06/10/2025");
        assert_eq!(DateStyle::European.iso_to_local("2025-06-10"), "10.06.2025");
        assert_eq!(DateStyle::European.iso_to_local("nope"), "");
        assert_eq!(DateStyle::Us.local_to_iso("06/10/2025").unwrap(), "2025-06-10");
        assert_eq!(DateStyle::European.local_to_iso("10.06.2025").unwrap(), "2025-06-10");
        assert_eq!(DateStyle::European.local_to_iso("").unwrap(), "");
        assert!(DateStyle::European.local_to_iso("31.02.2025").is_err());
        assert!(DateStyle::Us.local_to_iso("10.06.2025").is_err());
    }

    #[test]
    fn formats_due_input_european() {
        let style = DateStyle::European;
        let cases = [
            ("1", "1"),
            ("12", "12."),
            ("120", "12.0"),
            ("1203", "12.03."),
            ("120320", "12.03.20"),
            ("12032023", "12.03.2023"),
            ("12.03.2023", "12.03.2023"),
            ("120320239", "12.03.2023"),
        ];
        for (input, expected) in cases {
            assert_eq!(style.format_due_input(input), expected, "input {input:?}");
        }
    }

    #[test]
    fn formats_due_input_us() {
        let style = DateStyle::Us;
        assert_eq!(style.format_due_input("12"), "12/");
        assert_eq!(style.format_due_input("1203"), "12/03/");
        assert_eq!(style.format_due_input("12032023"), "12/03/2023");
        assert_eq!(style.format_due_input("12/03/2023"), "12/03/2023");
    }

    #[test]
    fn removes_last_digit() {
        let style = DateStyle::European;
        assert_eq!(style.remove_last_due_digit(""), "");
        assert_eq!(style.remove_last_due_digit("1"), "");
        assert_eq!(style.remove_last_due_digit("12."), "1");
        assert_eq!(style.remove_last_due_digit("12.03.2023"), "12.03.202");
        assert_eq!(DateStyle::Us.remove_last_due_digit("12/03/2023"), "12/03/202");
    }
}
