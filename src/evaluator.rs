//! Conflict and constraint evaluator (spec.md §4.1).
//!
//! The pairwise overlap matrix is precomputed once per search the way the
//! teacher's `caobab::precompute_problem` builds its adjacency matrix once
//! and reuses it across every Branch-and-Bound node, instead of
//! recomputing course-pair overlaps at every call.

use crate::error::InfeasibilityReason;
use crate::model::{Course, Limits, TranscriptView};
use ndarray::Array2;

/// True iff the two sections share at least one `TimeSlot`.
pub fn conflicts(a: &Course, b: &Course) -> bool {
    a.slots.iter().any(|s| b.slots.contains(s))
}

/// Number of overlapping slot pairs between `a` and `b`. A course with two
/// overlapping periods against another course's slots contributes 2, not 1
/// (spec.md §4.1's tie-break policy for pairwise conflict counting).
fn pairwise_conflict_count(a: &Course, b: &Course) -> u32 {
    a.slots
        .iter()
        .filter(|slot| b.slots.contains(slot))
        .count() as u32
}

/// Sum of `pairwise_conflict_count` over every unordered pair in `courses`.
pub fn count_conflicts(courses: &[Course]) -> u32 {
    let mut total = 0;
    for i in 0..courses.len() {
        for j in (i + 1)..courses.len() {
            total += pairwise_conflict_count(&courses[i], &courses[j]);
        }
    }
    total
}

/// Precomputed pairwise overlap counts between every section in a filtered
/// catalog, indexed by position in that catalog slice.
///
/// Built once by the search space builder and shared by reference with every
/// scheduler, exactly as the teacher's `PreComputedProblem::adjacency_matrix`
/// is built once and read by every Branch-and-Bound node.
#[derive(Debug, Clone)]
pub struct ConflictMatrix {
    counts: Array2<u8>,
}

impl ConflictMatrix {
    pub fn build(sections: &[Course]) -> Self {
        let n = sections.len();
        let mut counts = Array2::<u8>::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                let c = pairwise_conflict_count(&sections[i], &sections[j]).min(u8::MAX as u32) as u8;
                counts[[i, j]] = c;
                counts[[j, i]] = c;
            }
        }
        ConflictMatrix { counts }
    }

    pub fn pair(&self, i: usize, j: usize) -> u8 {
        self.counts[[i, j]]
    }
}

/// Incremental schedule-under-construction, owned exclusively by the
/// exploring worker (spec.md §3.3). Tracks `total_ects` and `conflict_count`
/// so every algorithm can push/pop in O(k) rather than recomputing from
/// scratch at every node.
#[derive(Debug, Clone)]
pub struct PartialSchedule {
    pub indices: Vec<usize>,
    pub total_ects: u32,
    pub conflict_count: u32,
}

impl PartialSchedule {
    pub fn empty() -> Self {
        PartialSchedule {
            indices: Vec::new(),
            total_ects: 0,
            conflict_count: 0,
        }
    }

    pub fn push(&mut self, index: usize, ects: u32, matrix: &ConflictMatrix) {
        for &existing in &self.indices {
            self.conflict_count += matrix.pair(existing, index) as u32;
        }
        self.total_ects += ects;
        self.indices.push(index);
    }

    pub fn pop(&mut self, ects: u32, matrix: &ConflictMatrix) -> Option<usize> {
        let index = self.indices.pop()?;
        self.total_ects -= ects;
        for &remaining in &self.indices {
            self.conflict_count -= matrix.pair(remaining, index) as u32;
        }
        Some(index)
    }
}

/// Fails fast when a partial schedule cannot possibly recover into a
/// feasible final schedule under the hard constraints.
pub fn is_feasible_partial(
    courses: &[Course],
    limits: &Limits,
    transcript: Option<&TranscriptView>,
) -> Result<(), InfeasibilityReason> {
    let total_ects: u32 = courses.iter().map(|c| c.ects).sum();
    if let Some(cap) = limits.max_ects {
        if total_ects > cap {
            return Err(InfeasibilityReason::EctsCapExceeded);
        }
    }

    let conflict_count = count_conflicts(courses);
    if conflict_count > limits.max_conflicts {
        return Err(InfeasibilityReason::ConflictBudgetExceeded);
    }

    let mut seen_main_codes = std::collections::HashSet::new();
    for c in courses {
        if !seen_main_codes.insert(c.main_code()) {
            return Err(InfeasibilityReason::DuplicateGroup(c.main_code().to_owned()));
        }
    }

    if let Some(transcript) = transcript {
        for c in courses {
            for prereq in &c.prerequisites {
                if !transcript.completed_course_codes.contains(prereq) {
                    return Err(InfeasibilityReason::PrerequisiteUnmet(prereq.clone()));
                }
            }
        }
    }

    Ok(())
}

/// Additionally checks that every mandatory group is represented.
pub fn is_feasible_final(
    courses: &[Course],
    limits: &Limits,
    mandatory_main_codes: &[String],
    transcript: Option<&TranscriptView>,
) -> Result<(), InfeasibilityReason> {
    is_feasible_partial(courses, limits, transcript)?;

    let present: std::collections::HashSet<&str> =
        courses.iter().map(|c| c.main_code()).collect();
    for mandatory in mandatory_main_codes {
        if !present.contains(mandatory.as_str()) {
            return Err(InfeasibilityReason::MandatoryMissing(mandatory.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseType, Day, TimeSlot};

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
    fn conflicts_true_on_shared_slot() {
        let a = course("X.1", 5, vec![TimeSlot::new(Day::Mon, 1)]);
        let b = course("Y.1", 5, vec![TimeSlot::new(Day::Mon, 1)]);
        assert!(conflicts(&a, &b));
    }

    #[test]
    fn count_conflicts_counts_per_overlapping_slot() {
        let a = course(
            "X.1",
            5,
            vec![TimeSlot::new(Day::Mon, 1), TimeSlot::new(Day::Mon, 2)],
        );
        let b = course(
            "Y.1",
            5,
            vec![TimeSlot::new(Day::Mon, 1), TimeSlot::new(Day::Mon, 2)],
        );
        assert_eq!(count_conflicts(&[a, b]), 2);
    }

    #[test]
    fn conflict_matrix_matches_pairwise_count() {
        let a = course("X.1", 5, vec![TimeSlot::new(Day::Mon, 1)]);
        let b = course("Y.1", 5, vec![TimeSlot::new(Day::Mon, 1)]);
        let c = course("Z.1", 5, vec![TimeSlot::new(Day::Tue, 1)]);
        let sections = vec![a, b, c];
        let matrix = ConflictMatrix::build(&sections);
        assert_eq!(matrix.pair(0, 1), 1);
        assert_eq!(matrix.pair(0, 2), 0);
    }

    #[test]
    fn partial_schedule_push_pop_is_symmetric() {
        let a = course("X.1", 5, vec![TimeSlot::new(Day::Mon, 1)]);
        let b = course("Y.1", 3, vec![TimeSlot::new(Day::Mon, 1)]);
        let sections = vec![a, b];
        let matrix = ConflictMatrix::build(&sections);
        let mut partial = PartialSchedule::empty();
        partial.push(0, 5, &matrix);
        partial.push(1, 3, &matrix);
        assert_eq!(partial.total_ects, 8);
        assert_eq!(partial.conflict_count, 1);
        partial.pop(3, &matrix);
        assert_eq!(partial.total_ects, 5);
        assert_eq!(partial.conflict_count, 0);
    }

    #[test]
    fn feasible_partial_rejects_ects_cap() {
        let a = course("X.1", 50, vec![TimeSlot::new(Day::Mon, 1)]);
        let limits = Limits {
            max_ects: Some(10),
            ..Limits::default()
        };
        assert_eq!(
            is_feasible_partial(&[a], &limits, None),
            Err(InfeasibilityReason::EctsCapExceeded)
        );
    }

    #[test]
    fn feasible_partial_rejects_unmet_prerequisite() {
        let mut a = course("Y.1", 5, vec![TimeSlot::new(Day::Mon, 1)]);
        a.prerequisites.push("X".to_owned());
        let transcript = TranscriptView::default();
        assert_eq!(
            is_feasible_partial(&[a], &Limits::default(), Some(&transcript)),
            Err(InfeasibilityReason::PrerequisiteUnmet("X".to_owned()))
        );
    }

    #[test]
    fn feasible_final_rejects_missing_mandatory() {
        let a = course("X.1", 5, vec![TimeSlot::new(Day::Mon, 1)]);
        let result = is_feasible_final(
            &[a],
            &Limits::default(),
            &["Y".to_owned()],
            None,
        );
        assert_eq!(
            result,
            Err(InfeasibilityReason::MandatoryMissing("Y".to_owned()))
        );
    }
}
