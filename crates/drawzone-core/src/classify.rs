// Zone classification: per-zone hit counts and the large/small verdict.

use std::fmt;

use serde::Serialize;

use crate::zones::{GroupSet, ZoneGroup};

/// Per-zone match counts, in zone order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct CountPattern(pub [u32; 3]);

impl CountPattern {
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

impl fmt::Display for CountPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.0[0], self.0[1], self.0[2])
    }
}

/// Verdict for one draw under one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verdict {
    Large,
    Small,
    None,
}

impl Verdict {
    /// Short display label; empty for `Verdict::None`.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Large => "LARGE",
            Verdict::Small => "SMALL",
            Verdict::None => "",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Large => f.write_str("LARGE"),
            Verdict::Small => f.write_str("SMALL"),
            Verdict::None => f.write_str("NONE"),
        }
    }
}

/// Patterns that yield `Verdict::Large`. Only meaningful for 5-number draws.
const LARGE_PATTERNS: [[u32; 3]; 3] = [[1, 2, 2], [2, 1, 2], [2, 2, 1]];
/// Patterns that yield `Verdict::Small`.
const SMALL_PATTERNS: [[u32; 3]; 3] = [[1, 1, 3], [1, 3, 1], [3, 1, 1]];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Classification {
    pub pattern: CountPattern,
    pub verdict: Verdict,
}

/// Map a count pattern to its verdict via the literal lookup table.
pub fn verdict_for(pattern: CountPattern) -> Verdict {
    if LARGE_PATTERNS.contains(&pattern.0) {
        Verdict::Large
    } else if SMALL_PATTERNS.contains(&pattern.0) {
        Verdict::Small
    } else {
        Verdict::None
    }
}

/// Classify a draw's numbers against one zone group.
///
/// Each number counts toward the first zone (in zone order) that contains it.
/// Numbers in no zone, including values outside 1..=39, are ignored. Any
/// input is accepted; draws that are not exactly five numbers can only ever
/// produce `Verdict::None`.
pub fn classify(numbers: &[i64], group: &ZoneGroup) -> Classification {
    let mut counts = [0u32; 3];
    for &n in numbers {
        if let Some(idx) = group.zone_of(n) {
            counts[idx] += 1;
        }
    }
    let pattern = CountPattern(counts);
    Classification {
        pattern,
        verdict: verdict_for(pattern),
    }
}

/// Classify against every group of `groups`, in group order.
pub fn classify_all(numbers: &[i64], groups: &GroupSet) -> Vec<Classification> {
    groups.iter().map(|g| classify(numbers, g)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
