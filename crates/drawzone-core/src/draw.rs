// Draw records and their on-disk formats (JSON arrays and CSV tables).

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::loader::LoadError;

/// One historical lottery event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Draw {
    pub date: NaiveDate,
    pub numbers: Vec<i64>,
}

impl Draw {
    pub fn new(date: NaiveDate, numbers: Vec<i64>) -> Self {
        Draw { date, numbers }
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Serialization format of a period resource, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Csv,
}

impl DataFormat {
    /// Detect the format from a resource name (`lottery_2024.json`).
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(DataFormat::Json),
            "csv" => Some(DataFormat::Csv),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parse a draw date. Accepts `2024-03-05`, `2024/03/05`, RFC 3339
/// timestamps (the calendar date of the timestamp's own offset is kept) and
/// ISO 8601 local date-times without an offset (`2024-03-05T20:30:00`).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Wire shape of one JSON record. Both fields are required.
#[derive(Debug, Deserialize)]
struct RawDraw {
    date: String,
    numbers: Vec<i64>,
}

/// Parse a JSON array of `{date, numbers}` records. Any malformed record
/// fails the whole document.
pub fn parse_json(resource: &str, text: &str) -> Result<Vec<Draw>, LoadError> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(text).map_err(|e| LoadError::InvalidDocument {
            resource: resource.to_string(),
            message: e.to_string(),
        })?;

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let raw: RawDraw = serde_json::from_value(value).map_err(|e| {
                LoadError::MalformedRecord {
                    resource: resource.to_string(),
                    index,
                    message: e.to_string(),
                }
            })?;
            let date = parse_date(&raw.date).ok_or_else(|| LoadError::MalformedRecord {
                resource: resource.to_string(),
                index,
                message: format!("unparseable date `{}`", raw.date),
            })?;
            Ok(Draw::new(date, raw.numbers))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Parse a CSV table with a header row. The first column is the date; every
/// further non-empty cell holds one or more whitespace-separated integers.
pub fn parse_csv(resource: &str, text: &str) -> Result<Vec<Draw>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let malformed = |index: usize, message: String| LoadError::MalformedRecord {
        resource: resource.to_string(),
        index,
        message,
    };

    let mut draws = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| malformed(index, e.to_string()))?;

        let raw_date = record
            .get(0)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| malformed(index, "missing date".into()))?;
        let date = parse_date(raw_date)
            .ok_or_else(|| malformed(index, format!("unparseable date `{raw_date}`")))?;

        let mut numbers = Vec::new();
        for token in record.iter().skip(1).flat_map(str::split_whitespace) {
            let n = token
                .parse::<i64>()
                .map_err(|_| malformed(index, format!("`{token}` is not an integer")))?;
            numbers.push(n);
        }
        if numbers.is_empty() {
            return Err(malformed(index, "missing numbers".into()));
        }

        draws.push(Draw::new(date, numbers));
    }
    Ok(draws)
}

/// Parse `text` according to the format implied by `resource`'s extension.
pub fn parse_draws(resource: &str, text: &str) -> Result<Vec<Draw>, LoadError> {
    match DataFormat::from_name(resource) {
        Some(DataFormat::Json) => parse_json(resource, text),
        Some(DataFormat::Csv) => parse_csv(resource, text),
        None => Err(LoadError::UnsupportedFormat(resource.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_date_accepts_common_forms() {
        assert_eq!(parse_date("2024-03-05"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("2026/02/19"), Some(ymd(2026, 2, 19)));
        assert_eq!(parse_date(" 2024-03-05 "), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05T20:30:00+08:00"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05T20:30:00"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05T20:30:00.250"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05T20:30"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("05/03/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn format_detection_by_extension() {
        assert_eq!(DataFormat::from_name("lottery_2024.json"), Some(DataFormat::Json));
        assert_eq!(DataFormat::from_name("draws_2023.CSV"), Some(DataFormat::Csv));
        assert_eq!(DataFormat::from_name("notes.txt"), None);
        assert_eq!(DataFormat::from_name("README"), None);
    }

    #[test]
    fn json_records_parse() {
        let text = r#"[
            {"date": "2024/01/02", "numbers": [8, 15, 19, 25, 27]},
            {"date": "2024-01-03", "numbers": [1, 2, 3, 4, 5]}
        ]"#;
        let draws = parse_json("lottery_2024.json", text).unwrap();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].date, ymd(2024, 1, 2));
        assert_eq!(draws[0].numbers, vec![8, 15, 19, 25, 27]);
        assert_eq!(draws[1].weekday(), Weekday::Wed);
    }

    #[test]
    fn json_local_datetime_keeps_calendar_date() {
        let text = r#"[{"date": "2024-03-05T20:30:00", "numbers": [1, 2, 3, 4, 5]}]"#;
        let draws = parse_json("lottery_2024.json", text).unwrap();
        assert_eq!(draws[0].date, ymd(2024, 3, 5));
        assert_eq!(draws[0].weekday(), Weekday::Tue);
    }

    #[test]
    fn json_missing_numbers_fails_whole_load() {
        let text = r#"[
            {"date": "2024-01-02", "numbers": [1, 2, 3, 4, 5]},
            {"date": "2024-01-03"}
        ]"#;
        match parse_json("x.json", text).unwrap_err() {
            LoadError::MalformedRecord { index, .. } => assert_eq!(index, 1),
            other => panic!("expected MalformedRecord, got: {other}"),
        }
    }

    #[test]
    fn json_non_integer_numbers_fail() {
        for bad in [
            r#"[{"date": "2024-01-02", "numbers": [1, 2.5, 3]}]"#,
            r#"[{"date": "2024-01-02", "numbers": ["1", "2"]}]"#,
            r#"[{"date": "2024-01-02", "numbers": 7}]"#,
        ] {
            assert!(
                matches!(parse_json("x.json", bad), Err(LoadError::MalformedRecord { index: 0, .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn json_bad_date_fails() {
        let text = r#"[{"date": "yesterday", "numbers": [1]}]"#;
        let err = parse_json("x.json", text).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn json_non_array_document_fails() {
        let err = parse_json("x.json", r#"{"date": "2024-01-02"}"#).unwrap_err();
        assert!(matches!(err, LoadError::InvalidDocument { .. }));
    }

    #[test]
    fn json_empty_array_is_empty_collection() {
        assert!(parse_json("x.json", "[]").unwrap().is_empty());
    }

    #[test]
    fn csv_records_parse() {
        let text = "date,n1,n2,n3,n4,n5\n2023-12-30,3,12,17,28,39\n2023/12/31, 1 ,2,3,4,5\n";
        let draws = parse_csv("draws_2023.csv", text).unwrap();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].numbers, vec![3, 12, 17, 28, 39]);
        assert_eq!(draws[1].date, ymd(2023, 12, 31));
        assert_eq!(draws[1].numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn csv_single_numbers_column_is_split() {
        let text = "date,numbers\n2023-12-30,\"3 12 17 28 39\"\n";
        let draws = parse_csv("draws_2023.csv", text).unwrap();
        assert_eq!(draws[0].numbers, vec![3, 12, 17, 28, 39]);
    }

    #[test]
    fn csv_rejects_non_integer_cell() {
        let text = "date,n1,n2\n2023-12-30,3,x\n";
        let err = parse_csv("draws_2023.csv", text).unwrap_err();
        assert!(matches!(err, LoadError::MalformedRecord { index: 0, .. }));
    }

    #[test]
    fn csv_rejects_row_without_numbers() {
        let text = "date,n1\n2023-12-30,3\n2023-12-31,\n";
        let err = parse_csv("draws_2023.csv", text).unwrap_err();
        assert!(matches!(err, LoadError::MalformedRecord { index: 1, .. }));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = parse_draws("draws.xlsx", "").unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));
    }
}
