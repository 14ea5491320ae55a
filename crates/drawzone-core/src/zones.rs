// Zone groups: named three-way partitions of the 1..=39 number universe.
//
// The built-in groups live in one static table. Additional or replacement
// groups may come from `config/zones.toml`; those are validated against the
// same rules (numbers inside the universe, zones pairwise disjoint).

use std::borrow::Cow;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Smallest number a draw can contain.
pub const MIN_NUMBER: i64 = 1;
/// Largest number a draw can contain.
pub const MAX_NUMBER: i64 = 39;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZoneError {
    #[error("zone group name must not be empty")]
    EmptyName,

    #[error("zone group `{0}` is defined more than once")]
    DuplicateName(String),

    #[error("zone group `{group}`: number {number} is outside 1..=39")]
    OutOfUniverse { group: String, number: i64 },

    #[error("zone group `{group}`: number {number} appears in zone {first} and zone {second}")]
    Overlap {
        group: String,
        number: i64,
        first: usize,
        second: usize,
    },
}

// ---------------------------------------------------------------------------
// Zone
// ---------------------------------------------------------------------------

/// A set of numbers from the universe, stored as a bitmask (bit `n` set
/// means `n` is a member).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Zone(u64);

impl Zone {
    /// Build a zone from literal numbers. Only used for the compiled-in table,
    /// whose numbers are all inside the universe.
    const fn from_literal(numbers: &[u8]) -> Self {
        let mut mask = 0u64;
        let mut i = 0;
        while i < numbers.len() {
            mask |= 1u64 << numbers[i];
            i += 1;
        }
        Zone(mask)
    }

    /// Build a zone from arbitrary integers, rejecting anything outside the
    /// universe. Duplicates collapse.
    pub fn from_numbers(group: &str, numbers: &[i64]) -> Result<Self, ZoneError> {
        let mut mask = 0u64;
        for &n in numbers {
            if !(MIN_NUMBER..=MAX_NUMBER).contains(&n) {
                return Err(ZoneError::OutOfUniverse {
                    group: group.to_string(),
                    number: n,
                });
            }
            mask |= 1u64 << n;
        }
        Ok(Zone(mask))
    }

    /// Membership test. Values outside the universe are never members.
    pub fn contains(&self, n: i64) -> bool {
        (MIN_NUMBER..=MAX_NUMBER).contains(&n) && self.0 & (1u64 << n) != 0
    }

    /// Members in ascending order.
    pub fn numbers(&self) -> impl Iterator<Item = i64> + '_ {
        (MIN_NUMBER..=MAX_NUMBER).filter(move |n| self.contains(*n))
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    fn overlap(&self, other: &Zone) -> Option<i64> {
        let shared = self.0 & other.0;
        if shared == 0 {
            None
        } else {
            Some(shared.trailing_zeros() as i64)
        }
    }
}

// ---------------------------------------------------------------------------
// ZoneGroup
// ---------------------------------------------------------------------------

/// A named classification scheme: three disjoint zones, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneGroup {
    name: Cow<'static, str>,
    zones: [Zone; 3],
}

impl ZoneGroup {
    const fn builtin(name: &'static str, zones: [&[u8]; 3]) -> Self {
        ZoneGroup {
            name: Cow::Borrowed(name),
            zones: [
                Zone::from_literal(zones[0]),
                Zone::from_literal(zones[1]),
                Zone::from_literal(zones[2]),
            ],
        }
    }

    /// Build and validate a group from configuration data.
    pub fn new(name: impl Into<String>, zones: &[Vec<i64>; 3]) -> Result<Self, ZoneError> {
        let name: String = name.into();
        if name.trim().is_empty() {
            return Err(ZoneError::EmptyName);
        }
        let group = ZoneGroup {
            zones: [
                Zone::from_numbers(&name, &zones[0])?,
                Zone::from_numbers(&name, &zones[1])?,
                Zone::from_numbers(&name, &zones[2])?,
            ],
            name: Cow::Owned(name),
        };
        group.validate()?;
        Ok(group)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zones(&self) -> &[Zone; 3] {
        &self.zones
    }

    /// Check that the three zones are pairwise disjoint.
    pub fn validate(&self) -> Result<(), ZoneError> {
        for first in 0..3 {
            for second in (first + 1)..3 {
                if let Some(number) = self.zones[first].overlap(&self.zones[second]) {
                    return Err(ZoneError::Overlap {
                        group: self.name.to_string(),
                        number,
                        first: first + 1,
                        second: second + 1,
                    });
                }
            }
        }
        Ok(())
    }

    /// Index (0..3) of the first zone containing `n`, if any.
    pub fn zone_of(&self, n: i64) -> Option<usize> {
        self.zones.iter().position(|z| z.contains(n))
    }
}

impl fmt::Display for ZoneGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ---------------------------------------------------------------------------
// Built-in table
// ---------------------------------------------------------------------------

/// All compiled-in groups, in display order. One instance each for the life
/// of the program.
pub static BUILTIN_GROUPS: [ZoneGroup; 5] = [
    ZoneGroup::builtin(
        "A",
        [
            &[2, 4, 5, 6, 7, 11, 12, 14, 15, 16],
            &[22, 24, 25, 26, 27, 33, 35, 36, 38, 39],
            &[1, 3, 8, 9, 10, 13, 17, 18, 19, 20, 21, 23, 28, 29, 30, 31, 32, 34, 37],
        ],
    ),
    ZoneGroup::builtin(
        "B",
        [
            &[3, 5, 6, 8, 9, 21, 22, 23, 25, 28],
            &[12, 13, 15, 16, 17, 30, 32, 33, 35, 39],
            &[1, 2, 4, 7, 10, 11, 14, 18, 19, 20, 24, 26, 27, 29, 31, 34, 36, 37, 38],
        ],
    ),
    ZoneGroup::builtin(
        "C",
        [
            &[20, 21, 22, 23, 24, 25, 26, 27, 28, 29],
            &[1, 4, 5, 8, 9, 11, 14, 15, 18, 19, 31, 34, 35, 38, 39],
            &[2, 3, 6, 7, 10, 12, 13, 16, 17, 30, 32, 33, 36, 37],
        ],
    ),
    // Provisional partitions; see DESIGN.md. Override through config/zones.toml.
    ZoneGroup::builtin(
        "New-A",
        [
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
            &[30, 31, 32, 33, 34, 35, 36, 37, 38, 39],
            &[11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29],
        ],
    ),
    ZoneGroup::builtin(
        "New-B",
        [
            &[1, 5, 9, 13, 17, 21, 25, 29, 33, 37],
            &[3, 7, 11, 15, 19, 23, 27, 31, 35, 39],
            &[2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 22, 24, 26, 28, 30, 32, 34, 36, 38],
        ],
    ),
];

pub static GROUP_A: &ZoneGroup = &BUILTIN_GROUPS[0];
pub static GROUP_B: &ZoneGroup = &BUILTIN_GROUPS[1];
pub static GROUP_C: &ZoneGroup = &BUILTIN_GROUPS[2];
pub static GROUP_NEW_A: &ZoneGroup = &BUILTIN_GROUPS[3];
pub static GROUP_NEW_B: &ZoneGroup = &BUILTIN_GROUPS[4];

// ---------------------------------------------------------------------------
// GroupSet
// ---------------------------------------------------------------------------

/// A zone group definition as written in `config/zones.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GroupDef {
    pub name: String,
    pub zones: [Vec<i64>; 3],
}

/// The ordered set of groups the application classifies against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSet {
    groups: Vec<ZoneGroup>,
}

impl Default for GroupSet {
    fn default() -> Self {
        GroupSet {
            groups: BUILTIN_GROUPS.to_vec(),
        }
    }
}

impl GroupSet {
    /// The built-in groups with configured definitions applied on top. A
    /// definition whose name matches a built-in group replaces it in place;
    /// any other definition is appended.
    pub fn with_overrides(defs: &[GroupDef]) -> Result<Self, ZoneError> {
        let mut set = GroupSet::default();
        let mut seen: Vec<&str> = Vec::new();
        for def in defs {
            if seen.contains(&def.name.as_str()) {
                return Err(ZoneError::DuplicateName(def.name.clone()));
            }
            seen.push(&def.name);

            let group = ZoneGroup::new(def.name.clone(), &def.zones)?;
            match set.position(&def.name) {
                Some(idx) => set.groups[idx] = group,
                None => set.groups.push(group),
            }
        }
        Ok(set)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneGroup> {
        self.groups.iter()
    }

    pub fn as_slice(&self) -> &[ZoneGroup] {
        &self.groups
    }

    pub fn get(&self, name: &str) -> Option<&ZoneGroup> {
        self.groups.iter().find(|g| g.name() == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name() == name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_groups_are_pairwise_disjoint() {
        for group in BUILTIN_GROUPS.iter() {
            group
                .validate()
                .unwrap_or_else(|e| panic!("group {} invalid: {e}", group.name()));
        }
    }

    #[test]
    fn builtin_group_names_in_display_order() {
        let names: Vec<&str> = BUILTIN_GROUPS.iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["A", "B", "C", "New-A", "New-B"]);
    }

    #[test]
    fn named_groups_point_into_builtin_table() {
        assert!(std::ptr::eq(GROUP_A, &BUILTIN_GROUPS[0]));
        assert!(std::ptr::eq(GROUP_NEW_B, &BUILTIN_GROUPS[4]));
        assert_eq!(GROUP_C.name(), "C");
    }

    #[test]
    fn group_a_literal_sets() {
        let zones = GROUP_A.zones();
        assert_eq!(
            zones[0].numbers().collect::<Vec<_>>(),
            vec![2, 4, 5, 6, 7, 11, 12, 14, 15, 16]
        );
        assert_eq!(
            zones[1].numbers().collect::<Vec<_>>(),
            vec![22, 24, 25, 26, 27, 33, 35, 36, 38, 39]
        );
        assert_eq!(zones[2].len(), 19);
    }

    #[test]
    fn groups_a_b_c_cover_whole_universe() {
        for group in [GROUP_A, GROUP_B, GROUP_C] {
            let total: usize = group.zones().iter().map(Zone::len).sum();
            assert_eq!(total, 39, "group {}", group.name());
        }
    }

    #[test]
    fn zone_contains_rejects_out_of_universe() {
        let zone = GROUP_A.zones()[2];
        assert!(zone.contains(1));
        assert!(!zone.contains(0));
        assert!(!zone.contains(-3));
        assert!(!zone.contains(40));
        assert!(!zone.contains(64));
        assert!(!zone.contains(i64::MAX));
    }

    #[test]
    fn zone_of_reports_first_matching_zone() {
        assert_eq!(GROUP_A.zone_of(2), Some(0));
        assert_eq!(GROUP_A.zone_of(22), Some(1));
        assert_eq!(GROUP_A.zone_of(1), Some(2));
        assert_eq!(GROUP_A.zone_of(99), None);
    }

    #[test]
    fn new_rejects_number_outside_universe() {
        let err = ZoneGroup::new("X", &[vec![1, 40], vec![2], vec![3]]).unwrap_err();
        assert_eq!(
            err,
            ZoneError::OutOfUniverse {
                group: "X".into(),
                number: 40
            }
        );
    }

    #[test]
    fn new_rejects_overlapping_zones() {
        let err = ZoneGroup::new("X", &[vec![1, 2], vec![3], vec![2, 4]]).unwrap_err();
        assert_eq!(
            err,
            ZoneError::Overlap {
                group: "X".into(),
                number: 2,
                first: 1,
                second: 3
            }
        );
    }

    #[test]
    fn new_rejects_blank_name() {
        let err = ZoneGroup::new("  ", &[vec![1], vec![2], vec![3]]).unwrap_err();
        assert_eq!(err, ZoneError::EmptyName);
    }

    #[test]
    fn overrides_replace_builtin_in_place() {
        let defs = vec![GroupDef {
            name: "New-A".into(),
            zones: [vec![1, 2], vec![3, 4], vec![5, 6]],
        }];
        let set = GroupSet::with_overrides(&defs).unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(set.position("New-A"), Some(3));
        let replaced = set.get("New-A").unwrap();
        assert_eq!(replaced.zones()[0].numbers().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn overrides_append_new_groups() {
        let defs = vec![GroupDef {
            name: "D".into(),
            zones: [vec![1], vec![2], vec![3]],
        }];
        let set = GroupSet::with_overrides(&defs).unwrap();
        assert_eq!(set.len(), 6);
        assert_eq!(set.as_slice()[5].name(), "D");
    }

    #[test]
    fn overrides_reject_duplicate_definitions() {
        let def = GroupDef {
            name: "D".into(),
            zones: [vec![1], vec![2], vec![3]],
        };
        let err = GroupSet::with_overrides(&[def.clone(), def]).unwrap_err();
        assert_eq!(err, ZoneError::DuplicateName("D".into()));
    }
}
