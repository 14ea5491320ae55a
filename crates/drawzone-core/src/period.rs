// Period descriptors: one selectable data source (normally one calendar year).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A selectable period as returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDescriptor {
    /// Resource identifier, e.g. `lottery_2024.json`.
    pub name: String,
    /// Four-digit year token, when one is present.
    #[serde(default)]
    pub year: Option<String>,
}

impl PeriodDescriptor {
    /// Build a descriptor from a resource name, extracting the year token.
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let year = extract_year(&name);
        PeriodDescriptor { name, year }
    }

    /// Display label: the year if known, else the raw name.
    pub fn label(&self) -> &str {
        self.year.as_deref().unwrap_or(&self.name)
    }

    fn year_value(&self) -> Option<u32> {
        self.year.as_deref().and_then(|y| y.parse().ok())
    }
}

/// First run of four ASCII digits in `name`, if any.
///
/// Longer digit runs yield their first four digits (`20240101` -> `2024`).
pub fn extract_year(name: &str) -> Option<String> {
    name.as_bytes()
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .map(|start| name[start..start + 4].to_string())
}

/// Listing order: periods with a parseable year first, newest year first;
/// then periods without one. Ties and year-less entries order by name.
///
/// A dated/undated pair is not compared by name: mixing name order for those
/// pairs with year order for dated pairs is not transitive, and `sort_by`
/// needs a total order.
pub fn compare_periods(a: &PeriodDescriptor, b: &PeriodDescriptor) -> Ordering {
    match (a.year_value(), b.year_value()) {
        (Some(ya), Some(yb)) => yb.cmp(&ya).then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    }
}

/// Sort periods into listing order in place.
pub fn sort_periods(periods: &mut [PeriodDescriptor]) {
    periods.sort_by(compare_periods);
}
