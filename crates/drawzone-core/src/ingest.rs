// Merge newly obtained draws into a data directory of per-year JSON files.
//
// Layout written: `<dir>/lottery_<year>.json` (newest first) and
// `<dir>/files.json` indexing them.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::draw::{parse_draws, parse_json, Draw};
use crate::loader::sort_newest_first;
use crate::period::{sort_periods, PeriodDescriptor};
use crate::source::INDEX_FILE;

/// Date form used in written year files.
const STORED_DATE_FORMAT: &str = "%Y/%m/%d";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted: usize,
    pub skipped: usize,
    /// Year files created or rewritten.
    pub files_written: Vec<PathBuf>,
}

#[derive(Serialize)]
struct StoredDraw<'a> {
    date: String,
    numbers: &'a [i64],
}

pub fn year_file_name(year: i32) -> String {
    format!("lottery_{year}.json")
}

/// Read draws from a `.json` or `.csv` file and merge them into `data_dir`.
pub fn ingest_file(data_dir: &Path, input: &Path) -> Result<IngestReport> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable file name", input.display()))?;
    let draws = parse_draws(name, &text)?;
    info!("importing {} draws from {}", draws.len(), input.display());
    ingest_draws(data_dir, draws)
}

/// Merge `draws` into the per-year files under `data_dir`.
///
/// A draw whose date already exists in its year file (or earlier in
/// `draws`) is skipped. Year files are rewritten newest first; every written
/// year file missing from `files.json` gets an entry there.
pub fn ingest_draws(data_dir: &Path, draws: Vec<Draw>) -> Result<IngestReport> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;

    let mut by_year: BTreeMap<i32, Vec<Draw>> = BTreeMap::new();
    for draw in draws {
        by_year.entry(draw.year()).or_default().push(draw);
    }

    let mut report = IngestReport::default();
    let mut written_names = Vec::new();

    for (year, incoming) in by_year {
        let name = year_file_name(year);
        let path = data_dir.join(&name);
        let mut stored = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_json(&name, &text)?
        } else {
            Vec::new()
        };

        let mut dates: HashSet<NaiveDate> = stored.iter().map(|d| d.date).collect();
        let before = stored.len();
        for draw in incoming {
            if dates.insert(draw.date) {
                debug!("adding draw {}", draw.date);
                stored.push(draw);
            } else {
                debug!("draw {} already present, skipping", draw.date);
                report.skipped += 1;
            }
        }

        let added = stored.len() - before;
        if added == 0 {
            continue;
        }
        report.inserted += added;

        sort_newest_first(&mut stored);
        write_year_file(&path, &stored)?;
        report.files_written.push(path);
        written_names.push(name);
    }

    if !written_names.is_empty() {
        update_index(data_dir, &written_names)?;
    }

    info!(
        "import finished: {} inserted, {} skipped",
        report.inserted, report.skipped
    );
    Ok(report)
}

fn write_year_file(path: &Path, draws: &[Draw]) -> Result<()> {
    let stored: Vec<StoredDraw<'_>> = draws
        .iter()
        .map(|d| StoredDraw {
            date: d.date.format(STORED_DATE_FORMAT).to_string(),
            numbers: &d.numbers,
        })
        .collect();
    let json = serde_json::to_string_pretty(&stored).context("failed to serialize draws")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Add entries for those `names` not yet in `files.json`, keeping it in
/// listing order. The index is left untouched when nothing is missing.
fn update_index(data_dir: &Path, names: &[String]) -> Result<()> {
    let path = data_dir.join(INDEX_FILE);
    let mut index: Vec<PeriodDescriptor> = if path.exists() {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("{} is not a period index", path.display()))?
    } else {
        Vec::new()
    };

    let before = index.len();
    for name in names {
        if !index.iter().any(|p| &p.name == name) {
            index.push(PeriodDescriptor::from_name(name.as_str()));
        }
    }
    if index.len() == before && path.exists() {
        return Ok(());
    }
    debug!("indexing {} new period(s)", index.len() - before);
    sort_periods(&mut index);

    let json = serde_json::to_string_pretty(&index).context("failed to serialize index")?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))
}
