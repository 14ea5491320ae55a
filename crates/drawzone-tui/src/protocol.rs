// Messages between the app orchestrator and the TUI.
//
// The orchestrator owns loading, classification and persistence and pushes
// `UiUpdate`s; the TUI turns key presses into `UserCommand`s.

use std::collections::HashMap;

use chrono::NaiveDate;
use drawzone_core::classify::Classification;
use drawzone_core::draw::Draw;
use drawzone_core::period::PeriodDescriptor;
use drawzone_core::zones::GroupSet;

/// One draw with its verdict under every configured group, in group order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedDraw {
    pub draw: Draw,
    pub classifications: Vec<Classification>,
}

/// Notes keyed by `(draw date, group name)`.
pub type AnnotationMap = HashMap<(NaiveDate, String), String>;

/// A fully loaded period, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodView {
    pub period: PeriodDescriptor,
    /// Newest first.
    pub draws: Vec<ClassifiedDraw>,
    pub annotations: AnnotationMap,
}

/// Static session facts sent once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub user_label: String,
    pub source: String,
    pub groups: GroupSet,
    pub default_group: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Session(Box<SessionInfo>),
    /// Listing order, newest first.
    Periods(Vec<PeriodDescriptor>),
    PeriodsFailed(String),
    Loading(String),
    PeriodLoaded(Box<PeriodView>),
    LoadFailed { name: String, message: String },
    /// An annotation write was accepted. An empty note means removal.
    AnnotationChanged {
        date: NaiveDate,
        group: String,
        note: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    LoadPeriod(String),
    RefreshPeriods,
    SaveAnnotation {
        date: NaiveDate,
        group: String,
        note: String,
    },
    /// Remember the group last shown in the zone panel.
    SelectGroup(String),
    Quit,
}
