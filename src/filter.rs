//! Transcript-aware smart filter (spec.md §4.2) and prerequisite-cycle
//! detection (spec.md §9).
//!
//! Runs once, before search-space construction, exactly as
//! `caobab::precompute_problem` runs once before the Branch-and-Bound tree is
//! explored.

use crate::error::EngineError;
use crate::model::{Course, Limits, TranscriptView};
use std::collections::{HashMap, HashSet};

/// GPA-adjusted effective `max_ects` cap (spec.md §4.2). An explicit
/// `Limits::max_ects` override always wins over the GPA rule.
fn gpa_adjusted_cap(gpa: f64) -> u32 {
    if gpa >= 3.5 {
        42
    } else if gpa >= 2.5 {
        37
    } else {
        31
    }
}

/// Remove sections whose prerequisites are not satisfied by the transcript,
/// and fold the GPA rule into `limits.max_ects` when no explicit cap was
/// given. Produces no error on its own; a mandatory group left empty by this
/// step is reported as `PrerequisiteUnmet` by the builder's empty-result
/// path (spec.md §4.2).
pub fn apply_smart_filter(
    catalog: Vec<Course>,
    transcript: Option<&TranscriptView>,
    prereqs_enabled: bool,
    mut limits: Limits,
) -> (Vec<Course>, Limits) {
    let filtered = match (transcript, prereqs_enabled) {
        (Some(t), true) => catalog
            .into_iter()
            .filter(|c| {
                c.prerequisites
                    .iter()
                    .all(|p| t.completed_course_codes.contains(p))
            })
            .collect(),
        _ => catalog,
    };

    if limits.max_ects.is_none() {
        if let Some(t) = transcript {
            limits.max_ects = Some(gpa_adjusted_cap(t.gpa));
        }
    }

    (filtered, limits)
}

/// Detect cycles in the prerequisite graph over main codes. Bad catalog data
/// (e.g. A requires B, B requires A) would otherwise make every mandatory
/// group unsatisfiable in a way that is indistinguishable from a normal
/// `PrerequisiteUnmet`; this is reported as a distinct, explicit error
/// instead (spec.md §9).
pub fn detect_prerequisite_cycle(catalog: &[Course]) -> Result<(), EngineError> {
    let mut edges: HashMap<&str, HashSet<&str>> = HashMap::new();
    for c in catalog {
        let entry = edges.entry(c.main_code()).or_default();
        for p in &c.prerequisites {
            entry.insert(p.as_str());
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks: HashMap<&str, Mark> = edges.keys().map(|&k| (k, Mark::Unvisited)).collect();

    fn visit<'a>(
        node: &'a str,
        edges: &HashMap<&'a str, HashSet<&'a str>>,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Result<(), Vec<String>> {
        match marks.get(node).copied().unwrap_or(Mark::Done) {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                let start = path.iter().position(|&n| n == node).unwrap_or(0);
                return Err(path[start..].iter().map(|s| s.to_string()).collect());
            }
            Mark::Unvisited => {}
        }
        marks.insert(node, Mark::InProgress);
        path.push(node);
        if let Some(deps) = edges.get(node) {
            for &dep in deps {
                if edges.contains_key(dep) {
                    visit(dep, edges, marks, path)?;
                }
            }
        }
        path.pop();
        marks.insert(node, Mark::Done);
        Ok(())
    }

    let nodes: Vec<&str> = edges.keys().copied().collect();
    for node in nodes {
        let mut path = Vec::new();
        if let Err(cycle) = visit(node, &edges, &mut marks, &mut path) {
            return Err(EngineError::PrerequisiteCycle(cycle));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseType, Day, TimeSlot};

    fn course(code: &str, prereqs: &[&str]) -> Course {
        Course {
            code: code.to_owned(),
            name: code.to_owned(),
            ects: 5,
            course_type: CourseType::Lecture,
            slots: vec![TimeSlot::new(Day::Mon, 1)],
            teacher: String::new(),
            faculty: String::new(),
            department: String::new(),
            campus: String::new(),
            prerequisites: prereqs.iter().map(|s| s.to_string()).collect(),
            corequisites: Vec::new(),
        }
    }

    #[test]
    fn gpa_rule_applies_when_no_override() {
        let transcript = TranscriptView {
            gpa: 2.3,
            ..Default::default()
        };
        let (_, limits) =
            apply_smart_filter(vec![], Some(&transcript), true, Limits::default());
        assert_eq!(limits.max_ects, Some(31));
    }

    #[test]
    fn explicit_override_wins_over_gpa_rule() {
        let transcript = TranscriptView {
            gpa: 2.3,
            ..Default::default()
        };
        let limits = Limits {
            max_ects: Some(20),
            ..Limits::default()
        };
        let (_, limits) = apply_smart_filter(vec![], Some(&transcript), true, limits);
        assert_eq!(limits.max_ects, Some(20));
    }

    #[test]
    fn filter_drops_sections_with_unmet_prerequisites() {
        let y = course("Y.1", &["X"]);
        let transcript = TranscriptView::default();
        let (remaining, _) =
            apply_smart_filter(vec![y], Some(&transcript), true, Limits::default());
        assert!(remaining.is_empty());
    }

    #[test]
    fn no_cycle_in_acyclic_graph() {
        let catalog = vec![course("X.1", &[]), course("Y.1", &["X"])];
        assert!(detect_prerequisite_cycle(&catalog).is_ok());
    }

    #[test]
    fn cycle_detected() {
        let catalog = vec![course("X.1", &["Y"]), course("Y.1", &["X"])];
        assert!(matches!(
            detect_prerequisite_cycle(&catalog),
            Err(EngineError::PrerequisiteCycle(_))
        ));
    }
}
