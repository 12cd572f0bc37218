use std::collections::HashSet;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;

/// Text tokens read as missing values, matching the usual spreadsheet NA spellings.
static NA_TOKENS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan",
        "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a",
        "nan", "null",
    ]
    .into_iter()
    .collect()
});

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
];

/// Makes a header unique within its sheet. Blank headers become `Unnamed: <index>`,
/// repeats get a `.<n>` suffix.
pub fn unique_column_name(name: &str, index: usize, existing_names: &mut HashSet<String>) -> String {
    let trimmed = name.trim();
    let base_name = if trimmed.is_empty() {
        format!("Unnamed: {}", index)
    } else {
        trimmed.to_string()
    };

    // If the name already exists, add a numeric suffix
    let mut cleaned = base_name.clone();
    let mut counter = 1;
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}.{}", base_name, counter);
        counter += 1;
    }

    cleaned
}

pub fn is_na_token(s: &str) -> bool {
    NA_TOKENS.contains(s)
}

pub fn is_date_string(s: &str) -> bool {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .any(|format| NaiveDate::parse_from_str(s, format).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(s, format).is_ok())
}

/// Converts an Excel serial date (days since 1899-12-30) into a timestamp.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    // `as` saturates; out-of-range serials are rejected by the checked calls
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::try_milliseconds(millis)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_repeated_headers() {
        let mut seen = HashSet::new();
        assert_eq!(unique_column_name("id", 0, &mut seen), "id");
        assert_eq!(unique_column_name("", 1, &mut seen), "Unnamed: 1");
        assert_eq!(unique_column_name("id", 2, &mut seen), "id.1");
        assert_eq!(unique_column_name(" id ", 3, &mut seen), "id.2");
    }

    #[test]
    fn na_tokens() {
        assert!(is_na_token("N/A"));
        assert!(is_na_token(""));
        assert!(is_na_token("null"));
        assert!(!is_na_token("Nathan"));
        assert!(!is_na_token("0"));
    }

    #[test]
    fn date_strings() {
        assert!(is_date_string("2024-01-31"));
        assert!(is_date_string("31/01/2024"));
        assert!(is_date_string("2024-01-31 08:15:00"));
        assert!(!is_date_string("product A"));
        assert!(!is_date_string("2024"));
    }

    #[test]
    fn serial_dates() {
        let dt = excel_serial_to_datetime(45292.5).unwrap();
        assert_eq!(dt.to_string(), "2024-01-01 12:00:00");
        assert!(excel_serial_to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn out_of_range_serials_are_rejected() {
        assert!(excel_serial_to_datetime(-1e300).is_none());
        assert!(excel_serial_to_datetime(1e300).is_none());
        assert!(excel_serial_to_datetime(1e15).is_none());
    }
}
