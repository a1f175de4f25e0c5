//! Preference scorer (spec.md §4.3): a weighted sum of `[0,1]`-normalized
//! components describing "how good" a feasible schedule is.
//!
//! Grounded on the teacher's `caobab::solution_score` module, which derives a
//! single comparable quality figure from raw solver output; here the figure
//! is a multi-objective dot product instead of a single assignment score.

use crate::model::{Day, Limits, Schedule};
use log::warn;
use std::collections::BTreeSet;
use std::sync::Once;

/// Canonical names of the preference components, used for `from_named`
/// construction and validation (spec.md §6: "unknown names are rejected").
pub const PREFERENCE_NAMES: &[&str] = &[
    "prefer_fewer_conflicts",
    "prefer_more_ects",
    "prefer_fewer_ects",
    "prefer_morning",
    "prefer_afternoon",
    "compactness",
    "free_days",
    "preferred_campus",
    "preferred_teacher",
];

/// Weighted configuration for the scorer. All weights default to zero
/// ("any order"), in which case the tie-break policy of spec.md §3.2(6)
/// alone governs result order.
#[derive(Debug, Clone, Default)]
pub struct SchedulerPrefs {
    pub prefer_fewer_conflicts: f64,
    pub prefer_more_ects: f64,
    pub prefer_fewer_ects: f64,
    /// Target ECTS sum for `prefer_fewer_ects`; ignored if that weight is 0.
    pub target_ects: u32,
    pub prefer_morning: f64,
    pub prefer_afternoon: f64,
    pub compactness: f64,
    pub free_days: BTreeSet<Day>,
    pub free_days_weight: f64,
    pub preferred_campus: Option<String>,
    pub preferred_campus_weight: f64,
    pub preferred_teacher: Option<String>,
    pub preferred_teacher_weight: f64,
}

impl SchedulerPrefs {
    /// Build prefs from a `(name, weight)` list, as an external caller might
    /// assemble them from a config file. Rejects unknown names and negative
    /// weights up front (spec.md §6/§7: input errors surface before search).
    pub fn with_weights(entries: &[(&str, f64)]) -> Result<Self, crate::error::EngineError> {
        use crate::error::EngineError;
        let mut prefs = SchedulerPrefs::default();
        for &(name, weight) in entries {
            if weight < 0.0 {
                return Err(EngineError::NegativePreferenceWeight(name.to_owned()));
            }
            match name {
                "prefer_fewer_conflicts" => prefs.prefer_fewer_conflicts = weight,
                "prefer_more_ects" => prefs.prefer_more_ects = weight,
                "prefer_fewer_ects" => prefs.prefer_fewer_ects = weight,
                "prefer_morning" => prefs.prefer_morning = weight,
                "prefer_afternoon" => prefs.prefer_afternoon = weight,
                "compactness" => prefs.compactness = weight,
                "free_days" => prefs.free_days_weight = weight,
                "preferred_campus" => prefs.preferred_campus_weight = weight,
                "preferred_teacher" => prefs.preferred_teacher_weight = weight,
                other => return Err(EngineError::UnknownPreferenceName(other.to_owned())),
            }
        }
        Ok(prefs)
    }

    pub fn is_trivial(&self) -> bool {
        self.prefer_fewer_conflicts == 0.0
            && self.prefer_more_ects == 0.0
            && self.prefer_fewer_ects == 0.0
            && self.prefer_morning == 0.0
            && self.prefer_afternoon == 0.0
            && self.compactness == 0.0
            && self.free_days_weight == 0.0
            && self.preferred_campus_weight == 0.0
            && self.preferred_teacher_weight == 0.0
    }
}

static NAN_WARNED: Once = Once::new();

/// Clamp a NaN component value to 0 and log once (spec.md §4.5.5: "internal
/// numeric issues... clamp to 0 and continue; log once").
fn nan_safe(value: f64) -> f64 {
    if value.is_nan() {
        NAN_WARNED.call_once(|| warn!("preference scorer produced NaN; clamping to 0"));
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn fewer_conflicts_component(schedule: &Schedule, limits: &Limits) -> f64 {
    if limits.max_conflicts == 0 {
        return if schedule.conflict_count == 0 { 1.0 } else { 0.0 };
    }
    nan_safe(1.0 - schedule.conflict_count as f64 / (limits.max_conflicts as f64 + 1.0))
}

fn more_ects_component(schedule: &Schedule, limits: &Limits) -> f64 {
    let cap = limits.max_ects.unwrap_or(60).max(1) as f64;
    nan_safe(schedule.total_ects as f64 / cap)
}

fn fewer_ects_component(schedule: &Schedule, target: u32) -> f64 {
    if target == 0 {
        return if schedule.total_ects == 0 { 1.0 } else { 0.0 };
    }
    if schedule.total_ects > target {
        return 0.0;
    }
    nan_safe(1.0 - (target - schedule.total_ects) as f64 / target as f64)
}

fn session_count_in_range(schedule: &Schedule, lo: u8, hi: u8) -> (usize, usize) {
    let mut matching = 0;
    let mut total = 0;
    for c in &schedule.courses {
        for slot in &c.slots {
            total += 1;
            if slot.period >= lo && slot.period <= hi {
                matching += 1;
            }
        }
    }
    (matching, total)
}

fn morning_component(schedule: &Schedule) -> f64 {
    let (matching, total) = session_count_in_range(schedule, 1, 5);
    if total == 0 {
        return 1.0;
    }
    nan_safe(matching as f64 / total as f64)
}

fn afternoon_component(schedule: &Schedule) -> f64 {
    let (matching, total) = session_count_in_range(schedule, 6, 10);
    if total == 0 {
        return 1.0;
    }
    nan_safe(matching as f64 / total as f64)
}

/// Fewer idle gaps within each active day. For a day with sessions spanning
/// periods `[min, max]`, any unoccupied period strictly between them is an
/// idle gap; the component is `1 - gaps / max_possible_gaps` across all
/// active days.
fn compactness_component(schedule: &Schedule) -> f64 {
    let mut by_day: std::collections::BTreeMap<Day, BTreeSet<u8>> = std::collections::BTreeMap::new();
    for c in &schedule.courses {
        for slot in &c.slots {
            by_day.entry(slot.day).or_default().insert(slot.period);
        }
    }
    if by_day.is_empty() {
        return 1.0;
    }
    let mut gaps = 0u32;
    let mut possible = 0u32;
    for periods in by_day.values() {
        let min = *periods.iter().min().unwrap();
        let max = *periods.iter().max().unwrap();
        let span = (max - min) as u32;
        possible += span;
        for p in min..=max {
            if !periods.contains(&p) {
                gaps += 1;
            }
        }
    }
    if possible == 0 {
        return 1.0;
    }
    nan_safe(1.0 - gaps as f64 / possible as f64)
}

fn free_days_component(schedule: &Schedule, requested: &BTreeSet<Day>) -> f64 {
    if requested.is_empty() {
        return 1.0;
    }
    let occupied: BTreeSet<Day> = schedule
        .courses
        .iter()
        .flat_map(|c| c.slots.iter().map(|s| s.day))
        .collect();
    let satisfied = requested.iter().filter(|d| !occupied.contains(d)).count();
    nan_safe(satisfied as f64 / requested.len() as f64)
}

fn fraction_matching<'a, F>(schedule: &'a Schedule, predicate: F) -> f64
where
    F: Fn(&'a crate::model::Course) -> bool,
{
    if schedule.courses.is_empty() {
        return 1.0;
    }
    let matching = schedule.courses.iter().filter(|c| predicate(c)).count();
    nan_safe(matching as f64 / schedule.courses.len() as f64)
}

/// Per-component, normalized `[0,1]` values plus the weighted total. Kept
/// separate from the scalar score so tests and diagnostics can inspect each
/// contributing factor, the way `QualityInfo` breaks down multiple figures.
#[derive(Debug, Clone, Default)]
pub struct ScoreBreakdown {
    pub fewer_conflicts: f64,
    pub more_ects: f64,
    pub fewer_ects: f64,
    pub morning: f64,
    pub afternoon: f64,
    pub compactness: f64,
    pub free_days: f64,
    pub preferred_campus: f64,
    pub preferred_teacher: f64,
    pub total: f64,
}

pub fn score_breakdown(schedule: &Schedule, prefs: &SchedulerPrefs, limits: &Limits) -> ScoreBreakdown {
    let fewer_conflicts = fewer_conflicts_component(schedule, limits);
    let more_ects = more_ects_component(schedule, limits);
    let fewer_ects = fewer_ects_component(schedule, prefs.target_ects);
    let morning = morning_component(schedule);
    let afternoon = afternoon_component(schedule);
    let compactness = compactness_component(schedule);
    let free_days = free_days_component(schedule, &prefs.free_days);
    let preferred_campus = match &prefs.preferred_campus {
        Some(campus) => fraction_matching(schedule, |c| &c.campus == campus),
        None => 0.0,
    };
    let preferred_teacher = match &prefs.preferred_teacher {
        Some(teacher) => fraction_matching(schedule, |c| &c.teacher == teacher),
        None => 0.0,
    };

    let total = prefs.prefer_fewer_conflicts * fewer_conflicts
        + prefs.prefer_more_ects * more_ects
        + prefs.prefer_fewer_ects * fewer_ects
        + prefs.prefer_morning * morning
        + prefs.prefer_afternoon * afternoon
        + prefs.compactness * compactness
        + prefs.free_days_weight * free_days
        + prefs.preferred_campus_weight * preferred_campus
        + prefs.preferred_teacher_weight * preferred_teacher;

    ScoreBreakdown {
        fewer_conflicts,
        more_ects,
        fewer_ects,
        morning,
        afternoon,
        compactness,
        free_days,
        preferred_campus,
        preferred_teacher,
        total: nan_safe_unbounded(total),
    }
}

/// Like `nan_safe` but does not clamp to `[0,1]` — the total score is a
/// weighted sum and can legitimately exceed 1 when weights are large.
fn nan_safe_unbounded(value: f64) -> f64 {
    if value.is_nan() {
        NAN_WARNED.call_once(|| warn!("preference scorer produced NaN total; clamping to 0"));
        0.0
    } else {
        value
    }
}

pub fn score(schedule: &Schedule, prefs: &SchedulerPrefs, limits: &Limits) -> f64 {
    score_breakdown(schedule, prefs, limits).total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseType, TimeSlot};
    use assert_float_eq::assert_float_absolute_eq;

    fn course(code: &str, ects: u32, slots: Vec<TimeSlot>) -> crate::model::Course {
        crate::model::Course {
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
    fn all_zero_weights_yield_zero_total() {
        let s = Schedule::new(vec![course("X.1", 5, vec![TimeSlot::new(Day::Mon, 1)])]);
        let prefs = SchedulerPrefs::default();
        assert!(prefs.is_trivial());
        assert_float_absolute_eq!(score(&s, &prefs, &Limits::default()), 0.0);
    }

    #[test]
    fn prefer_fewer_conflicts_rewards_zero_conflicts() {
        let s = Schedule::new(vec![course("X.1", 5, vec![TimeSlot::new(Day::Mon, 1)])]);
        let prefs = SchedulerPrefs {
            prefer_fewer_conflicts: 1.0,
            ..Default::default()
        };
        assert_float_absolute_eq!(score(&s, &prefs, &Limits::default()), 1.0);
    }

    #[test]
    fn free_days_component_checks_zero_sessions() {
        let s = Schedule::new(vec![course("X.1", 5, vec![TimeSlot::new(Day::Mon, 1)])]);
        let mut requested = BTreeSet::new();
        requested.insert(Day::Fri);
        let prefs = SchedulerPrefs {
            free_days: requested,
            free_days_weight: 1.0,
            ..Default::default()
        };
        assert_float_absolute_eq!(score(&s, &prefs, &Limits::default()), 1.0);
    }

    #[test]
    fn unknown_preference_name_rejected() {
        let result = SchedulerPrefs::with_weights(&[("totally_made_up", 1.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn negative_weight_rejected() {
        let result = SchedulerPrefs::with_weights(&[("compactness", -1.0)]);
        assert!(result.is_err());
    }
}
