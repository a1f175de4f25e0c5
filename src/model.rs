//! Core data model: time slots, courses, groups, schedules and the caller-supplied
//! transcript/limits/preference structures.
//!
//! Mirrors the teacher crate's convention of plain, serde-derived structs with
//! explicit identity (there, `Course`/`Participant` identity is their `index`;
//! here it is a course `code`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// One weekday. Ordered `Mon < Tue < ... < Sun` so that `TimeSlot`'s derived
/// `Ord` sorts a week in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
        Day::Sun,
    ];

    /// Whether this day belongs to the default 5-day working week.
    pub fn is_weekday(self) -> bool {
        !matches!(self, Day::Sat | Day::Sun)
    }
}

/// A single weekly time slot: a day and a 1-based period index.
///
/// Immutable, hashable and totally ordered by `(day, period)`, per spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub day: Day,
    pub period: u8,
}

impl TimeSlot {
    pub fn new(day: Day, period: u8) -> Self {
        TimeSlot { day, period }
    }
}

/// A row in the period-to-wall-clock lookup table (configuration, not
/// hardcoded — spec.md §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub period: u8,
    pub starts_at_minute: u16,
    pub ends_at_minute: u16,
}

/// Maps periods to wall-clock windows. Supplied by the caller; the engine
/// itself never hardcodes bell times.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodTable {
    windows: Vec<PeriodWindow>,
}

impl PeriodTable {
    pub fn new(windows: Vec<PeriodWindow>) -> Self {
        PeriodTable { windows }
    }

    pub fn window_for(&self, period: u8) -> Option<&PeriodWindow> {
        self.windows.iter().find(|w| w.period == period)
    }
}

/// The kind of session a `Course` section represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CourseType {
    Lecture,
    Lab,
    ProblemSession,
}

/// One concrete offering ("section") of a course, e.g. `COMP1111.1`.
///
/// Equality and hashing are by `code` alone, matching spec.md §3.1: two
/// `Course` values with the same code are the same section even if other
/// fields differ (the catalog is assumed internally consistent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
    pub ects: u32,
    pub course_type: CourseType,
    pub slots: Vec<TimeSlot>,
    pub teacher: String,
    pub faculty: String,
    pub department: String,
    pub campus: String,
    pub prerequisites: Vec<String>,
    pub corequisites: Vec<String>,
}

impl Course {
    /// The course-level identifier obtained by stripping the section suffix,
    /// e.g. `COMP1111.1` -> `COMP1111`.
    pub fn main_code(&self) -> &str {
        match self.code.split_once('.') {
            Some((main, _)) => main,
            None => &self.code,
        }
    }
}

impl PartialEq for Course {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}
impl Eq for Course {}

impl std::hash::Hash for Course {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

/// How a group (all sections sharing one main code) participates in search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionPolicy {
    Mandatory,
    Optional,
    Excluded,
}

/// Read-only input describing a student's academic history, consumed by the
/// smart filter (spec.md §4.2). Storage/bookkeeping of transcripts is out of
/// scope; this is a value the caller passes in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptView {
    pub completed_course_codes: BTreeSet<String>,
    pub gpa: f64,
}

/// Hard-constraint configuration for a single `generate` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    pub max_results: u8,
    pub max_ects: Option<u32>,
    pub allow_conflicts: bool,
    pub max_conflicts: u32,
    pub timeout: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_results: 10,
            max_ects: None,
            allow_conflicts: false,
            max_conflicts: 0,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Limits {
    /// Validate and normalize. `allow_conflicts = false` is folded into
    /// `max_conflicts = 0` here, per spec.md §9's resolution of the
    /// redundancy between the two fields.
    pub fn validated(mut self) -> Result<Self, crate::error::EngineError> {
        use crate::error::EngineError;
        if !(1..=100).contains(&self.max_results) {
            return Err(EngineError::InvalidLimits(format!(
                "max_results must be in 1..=100, got {}",
                self.max_results
            )));
        }
        if let Some(cap) = self.max_ects {
            if cap > 60 {
                return Err(EngineError::InvalidLimits(format!(
                    "max_ects must be in 0..=60, got {}",
                    cap
                )));
            }
        }
        if self.max_conflicts > 10 {
            return Err(EngineError::InvalidLimits(format!(
                "max_conflicts must be in 0..=10, got {}",
                self.max_conflicts
            )));
        }
        if self.timeout < Duration::from_secs(1) || self.timeout > Duration::from_secs(600) {
            return Err(EngineError::InvalidLimits(
                "timeout must be between 1s and 600s".to_owned(),
            ));
        }
        if !self.allow_conflicts {
            self.max_conflicts = 0;
        }
        Ok(self)
    }
}

/// A completed, materialized schedule: an ordered set of distinct courses.
///
/// `total_ects` and `conflict_count` are derived, not stored redundantly by
/// the caller — recomputed by `Schedule::new` from the evaluator so they can
/// never drift from the course list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub courses: Vec<Course>,
    pub total_ects: u32,
    pub conflict_count: u32,
}

impl Schedule {
    pub fn new(courses: Vec<Course>) -> Self {
        let total_ects = courses.iter().map(|c| c.ects).sum();
        let conflict_count = crate::evaluator::count_conflicts(&courses);
        Schedule {
            courses,
            total_ects,
            conflict_count,
        }
    }

    /// The tuple of course codes, sorted, used as the tie-break key (spec.md
    /// §3.2(6)) and as the round-trip identity (spec.md §8 property 6).
    pub fn code_tuple(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.courses.iter().map(|c| c.code.as_str()).collect();
        codes.sort_unstable();
        codes
    }

    pub fn has_duplicate_main_code(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        for c in &self.courses {
            if !seen.insert(c.main_code()) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(code: &str, ects: u32, slots: Vec<TimeSlot>) -> Course {
        Course {
            code: code.to_owned(),
            name: code.to_owned(),
            ects,
            course_type: CourseType::Lecture,
            slots,
            teacher: String::new(),
            faculty: String::new(),
            department: String::new(),
            campus: String::new(),
            prerequisites: Vec::new(),
            corequisites: Vec::new(),
        }
    }

    #[test]
    fn main_code_strips_section_suffix() {
        let c = course("COMP1111.1", 5, vec![TimeSlot::new(Day::Mon, 1)]);
        assert_eq!(c.main_code(), "COMP1111");
    }

    #[test]
    fn main_code_without_suffix_is_identity() {
        let c = course("COMP1111", 5, vec![TimeSlot::new(Day::Mon, 1)]);
        assert_eq!(c.main_code(), "COMP1111");
    }

    #[test]
    fn schedule_derives_total_ects_and_conflicts() {
        let a = course("X.1", 5, vec![TimeSlot::new(Day::Mon, 1)]);
        let b = course("Y.1", 3, vec![TimeSlot::new(Day::Mon, 1)]);
        let s = Schedule::new(vec![a, b]);
        assert_eq!(s.total_ects, 8);
        assert_eq!(s.conflict_count, 1);
    }

    #[test]
    fn duplicate_main_code_detected() {
        let a = course("X.1", 5, vec![TimeSlot::new(Day::Mon, 1)]);
        let b = course("X.2", 5, vec![TimeSlot::new(Day::Tue, 1)]);
        let s = Schedule::new(vec![a, b]);
        assert!(s.has_duplicate_main_code());
    }

    #[test]
    fn limits_default_is_valid() {
        assert!(Limits::default().validated().is_ok());
    }

    #[test]
    fn limits_rejects_out_of_range_max_conflicts() {
        let limits = Limits {
            max_conflicts: 11,
            allow_conflicts: true,
            ..Limits::default()
        };
        assert!(limits.validated().is_err());
    }

    #[test]
    fn limits_folds_allow_conflicts_false_into_zero_budget() {
        let limits = Limits {
            allow_conflicts: false,
            max_conflicts: 5,
            ..Limits::default()
        }
        .validated()
        .unwrap();
        assert_eq!(limits.max_conflicts, 0);
    }
}
