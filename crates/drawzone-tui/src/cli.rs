// Non-interactive subcommands: period listing, classified table, import.
//
// Each command returns the text to print so it can be checked in tests.

use std::path::Path;

use anyhow::{bail, Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use tracing::info;

use drawzone_core::classify::{classify_all, Verdict};
use drawzone_core::config::{Config, SourceKind};
use drawzone_core::draw::Draw;
use drawzone_core::ingest::{ingest_file, IngestReport};
use drawzone_core::loader::{list_periods, load_period};
use drawzone_core::period::PeriodDescriptor;
use drawzone_core::source::DrawSource;
use drawzone_core::zones::GroupSet;

use crate::tui::widgets::draw_table::{format_date, format_numbers};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// `drawzone list`
pub async fn list(source: &dyn DrawSource) -> Result<String> {
    let periods = list_periods(source)
        .await
        .with_context(|| format!("failed to list periods from {}", source.describe()))?;
    Ok(periods_table(&periods))
}

/// `drawzone show [period]`. Without a name the first listed (newest) period
/// is shown.
pub async fn show(source: &dyn DrawSource, groups: &GroupSet, name: Option<&str>) -> Result<String> {
    let period = match name {
        Some(name) => PeriodDescriptor::from_name(name),
        None => {
            let periods = list_periods(source)
                .await
                .with_context(|| format!("failed to list periods from {}", source.describe()))?;
            match periods.into_iter().next() {
                Some(p) => p,
                None => return Ok("No data available yet.".to_string()),
            }
        }
    };

    let draws = load_period(source, &period.name)
        .await
        .with_context(|| format!("failed to load {}", period.name))?;
    Ok(draws_table(&period, &draws, groups))
}

/// `drawzone import <file>`. Only directory-backed data can be written.
pub fn import(config: &Config, input: &Path) -> Result<String> {
    if config.data.source != SourceKind::Directory {
        bail!("import needs a directory data source; configured source is http");
    }
    let report = ingest_file(&config.data.dir, input)
        .with_context(|| format!("failed to import {}", input.display()))?;
    info!(
        "import of {} done: {} inserted, {} skipped",
        input.display(),
        report.inserted,
        report.skipped
    );
    Ok(import_summary(&report))
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

pub fn periods_table(periods: &[PeriodDescriptor]) -> String {
    if periods.is_empty() {
        return "No data available yet.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Period", "Resource"]);
    for p in periods {
        table.add_row(vec![p.label(), p.name.as_str()]);
    }
    table.to_string()
}

pub fn draws_table(period: &PeriodDescriptor, draws: &[Draw], groups: &GroupSet) -> String {
    let summary = if draws.is_empty() {
        format!("{} · no records", period.label())
    } else {
        format!("{} · {} records", period.label(), draws.len())
    };
    if draws.is_empty() {
        return summary;
    }

    let mut header = vec![Cell::new("Date"), Cell::new("Numbers")];
    header.extend(groups.iter().map(|g| Cell::new(g.name())));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for draw in draws {
        let mut row = vec![
            Cell::new(format_date(draw.date)),
            Cell::new(format_numbers(&draw.numbers)),
        ];
        for c in classify_all(&draw.numbers, groups) {
            let text = format!("{:<5} {}", c.verdict.label(), c.pattern);
            let cell = Cell::new(text);
            row.push(match c.verdict {
                Verdict::Large => cell.fg(Color::Red),
                Verdict::Small => cell.fg(Color::Green),
                Verdict::None => cell,
            });
        }
        table.add_row(row);
    }

    format!("{summary}\n{table}")
}

pub fn import_summary(report: &IngestReport) -> String {
    let mut out = format!(
        "Import finished:\n  Inserted         : {}\n  Already present  : {}",
        report.inserted, report.skipped
    );
    for path in &report.files_written {
        out.push_str(&format!("\n  Wrote {}", path.display()));
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn periods_table_empty_state() {
        assert_eq!(periods_table(&[]), "No data available yet.");
    }

    #[test]
    fn periods_table_shows_labels_and_names() {
        let text = periods_table(&[
            PeriodDescriptor::from_name("lottery_2024.json"),
            PeriodDescriptor::from_name("notes.csv"),
        ]);
        assert!(text.contains("2024"));
        assert!(text.contains("lottery_2024.json"));
        assert!(text.contains("notes.csv"));
    }

    #[test]
    fn draws_table_classifies_every_group() {
        let period = PeriodDescriptor::from_name("lottery_2024.json");
        let draws = vec![Draw::new(ymd(2024, 1, 2), vec![8, 15, 19, 25, 27])];
        let text = draws_table(&period, &draws, &GroupSet::default());
        assert!(text.starts_with("2024 · 1 records"));
        assert!(text.contains("2024-01-02 Tue"));
        assert!(text.contains("08 15 19 25 27"));
        assert!(text.contains("LARGE 1-2-2"));
        assert!(text.contains("New-B"));
    }

    #[test]
    fn draws_table_without_records() {
        let period = PeriodDescriptor::from_name("lottery_2025.json");
        assert_eq!(
            draws_table(&period, &[], &GroupSet::default()),
            "2025 · no records"
        );
    }

    #[test]
    fn import_summary_lists_files() {
        let report = IngestReport {
            inserted: 3,
            skipped: 1,
            files_written: vec![PathBuf::from("data/lottery_2024.json")],
        };
        let text = import_summary(&report);
        assert!(text.contains("Inserted         : 3"));
        assert!(text.contains("Already present  : 1"));
        assert!(text.contains("lottery_2024.json"));
    }
}
