//! Search space builder (spec.md §4.4).
//!
//! Groups sections by main code, enumerates per-group option sets, and
//! orders groups most-constrained-first. Grounded on the teacher's
//! `caobab::precompute_problem`: build the read-only problem representation
//! once, then hand out shared references to every scheduler.

use crate::error::InfeasibilityReason;
use crate::evaluator::ConflictMatrix;
use crate::model::{Course, CourseType, SelectionPolicy};
use std::collections::{BTreeMap, HashMap, HashSet};

/// One way to fill a group's slot: the indices (into `PreparedSearch::catalog`)
/// of the sections this option contributes, or an empty list for the
/// synthetic "skip" option of an Optional group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleOption {
    pub section_indices: Vec<usize>,
    pub is_skip: bool,
}

impl ScheduleOption {
    pub fn ects(&self, catalog: &[Course]) -> u32 {
        self.section_indices.iter().map(|&i| catalog[i].ects).sum()
    }
}

/// All options for one main-code group.
#[derive(Debug, Clone)]
pub struct GroupOptions {
    pub main_code: String,
    pub policy: SelectionPolicy,
    pub options: Vec<ScheduleOption>,
}

/// The search-ready representation handed to every scheduler: a filtered,
/// flattened catalog, its precomputed conflict matrix, and per-group option
/// sets ordered most-constrained-first.
#[derive(Debug, Clone)]
pub struct PreparedSearch {
    pub catalog: Vec<Course>,
    pub conflict_matrix: ConflictMatrix,
    pub groups: Vec<GroupOptions>,
}

impl PreparedSearch {
    pub fn mandatory_main_codes(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter(|g| g.policy == SelectionPolicy::Mandatory)
            .map(|g| g.main_code.clone())
            .collect()
    }

    pub fn option_product_is_empty(&self) -> bool {
        self.groups.iter().any(|g| g.options.is_empty())
    }

    /// Lowest ECTS sum a mandatory-only pick of this search could ever
    /// reach: the cheapest option of every `Mandatory` group, summed. Used
    /// to distinguish "nothing fits under the cap" from "the search just
    /// didn't find anything" when a completed run returns no schedules.
    pub fn minimum_mandatory_ects(&self) -> u32 {
        self.groups
            .iter()
            .filter(|g| g.policy == SelectionPolicy::Mandatory)
            .map(|g| {
                g.options
                    .iter()
                    .map(|o| o.ects(&self.catalog))
                    .min()
                    .unwrap_or(0)
            })
            .sum()
    }
}

/// The set of main codes present in a catalog, used to tell a group that
/// was filtered away from one that was never in the catalog at all.
pub fn main_codes(catalog: &[Course]) -> HashSet<String> {
    catalog.iter().map(|c| c.main_code().to_owned()).collect()
}

fn course_type_index(t: CourseType) -> usize {
    match t {
        CourseType::Lecture => 0,
        CourseType::Lab => 1,
        CourseType::ProblemSession => 2,
    }
}

/// Enumerate every valid combination of at most one section per present
/// `CourseType` within a single group, dropping combinations with an
/// internal time conflict.
fn enumerate_group_options(indices: &[usize], catalog: &[Course]) -> Vec<ScheduleOption> {
    let mut by_type: [Vec<usize>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for &i in indices {
        by_type[course_type_index(catalog[i].course_type)].push(i);
    }

    // Cartesian product over the (at most 3) present types; an absent type
    // contributes a single "none" placeholder so it never participates.
    let choices: Vec<Vec<Option<usize>>> = by_type
        .iter()
        .map(|bucket| {
            if bucket.is_empty() {
                vec![None]
            } else {
                bucket.iter().map(|&i| Some(i)).collect()
            }
        })
        .collect();

    let mut combos: Vec<Vec<usize>> = vec![Vec::new()];
    for bucket in &choices {
        let mut next = Vec::with_capacity(combos.len() * bucket.len());
        for combo in &combos {
            for choice in bucket {
                let mut extended = combo.clone();
                if let Some(i) = choice {
                    extended.push(*i);
                }
                next.push(extended);
            }
        }
        combos = next;
    }

    combos
        .into_iter()
        .filter(|combo| !combo.is_empty())
        .filter(|combo| {
            // no internal time conflict between the chosen sections
            for a in 0..combo.len() {
                for b in (a + 1)..combo.len() {
                    if crate::evaluator::conflicts(&catalog[combo[a]], &catalog[combo[b]]) {
                        return false;
                    }
                }
            }
            true
        })
        .map(|mut section_indices| {
            section_indices.sort_unstable_by_key(|&i| catalog[i].code.clone());
            ScheduleOption {
                section_indices,
                is_skip: false,
            }
        })
        .collect()
}

/// Build the `PreparedSearch` from a filtered catalog and the caller's
/// per-group selection policy. Returns the first `InfeasibilityReason`
/// encountered if a `Mandatory` group has no viable option (search does not
/// run in that case, per spec.md §4.4), or if the whole option product is
/// empty.
///
/// `original_main_codes` is the main-code set of the catalog *before* the
/// smart filter ran (see `main_codes`); it is consulted only to tell apart a
/// `Mandatory` group that the filter removed (`PrerequisiteUnmet`) from one
/// that was never in the catalog to begin with (`MandatoryMissing`) —
/// `catalog` itself is always the already-filtered one.
pub fn build(
    catalog: Vec<Course>,
    original_main_codes: &HashSet<String>,
    selection: &HashMap<String, SelectionPolicy>,
) -> Result<PreparedSearch, InfeasibilityReason> {
    let mut by_main_code: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, c) in catalog.iter().enumerate() {
        by_main_code
            .entry(c.main_code().to_owned())
            .or_default()
            .push(i);
    }

    for (main_code, policy) in selection {
        if *policy == SelectionPolicy::Mandatory && !by_main_code.contains_key(main_code) {
            return Err(if original_main_codes.contains(main_code) {
                InfeasibilityReason::PrerequisiteUnmet(main_code.clone())
            } else {
                InfeasibilityReason::MandatoryMissing(main_code.clone())
            });
        }
    }

    let mut groups = Vec::new();
    for (main_code, indices) in by_main_code {
        let policy = selection
            .get(&main_code)
            .copied()
            .unwrap_or(SelectionPolicy::Optional);
        if policy == SelectionPolicy::Excluded {
            continue;
        }

        let mut options = enumerate_group_options(&indices, &catalog);
        options.sort_by(|a, b| {
            let a_code = a.section_indices.first().map(|&i| catalog[i].code.as_str()).unwrap_or("");
            let b_code = b.section_indices.first().map(|&i| catalog[i].code.as_str()).unwrap_or("");
            a_code.cmp(b_code)
        });

        if policy == SelectionPolicy::Optional {
            options.push(ScheduleOption {
                section_indices: Vec::new(),
                is_skip: true,
            });
        }

        if policy == SelectionPolicy::Mandatory && options.is_empty() {
            return Err(InfeasibilityReason::MandatoryMissing(main_code));
        }

        groups.push(GroupOptions {
            main_code,
            policy,
            options,
        });
    }

    // Most-constrained-first: fewest remaining options sorted to the front,
    // to maximize pruning (spec.md §4.4).
    groups.sort_by_key(|g| g.options.len());

    let conflict_matrix = ConflictMatrix::build(&catalog);

    let search = PreparedSearch {
        catalog,
        conflict_matrix,
        groups,
    };

    if search.groups.is_empty() || search.option_product_is_empty() {
        return Err(InfeasibilityReason::OptionProductEmpty);
    }

    Ok(search)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Day, TimeSlot};
    use std::collections::HashMap;

    fn build_from(
        catalog: Vec<Course>,
        selection: &HashMap<String, SelectionPolicy>,
    ) -> Result<PreparedSearch, InfeasibilityReason> {
        let original = main_codes(&catalog);
        build(catalog, &original, selection)
    }

    fn course(code: &str, course_type: CourseType, slots: Vec<TimeSlot>) -> Course {
        Course {
            code: code.to_owned(),
            name: code.to_owned(),
            ects: 5,
            course_type,
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
    fn excluded_groups_produce_no_entry() {
        let catalog = vec![course("X.1", CourseType::Lecture, vec![TimeSlot::new(Day::Mon, 1)])];
        let mut selection = HashMap::new();
        selection.insert("X".to_owned(), SelectionPolicy::Excluded);
        let result = build_from(catalog, &selection);
        assert_eq!(result, Err(InfeasibilityReason::OptionProductEmpty));
    }

    #[test]
    fn mandatory_group_with_no_sections_is_reported_immediately() {
        let selection = HashMap::from([("X".to_owned(), SelectionPolicy::Mandatory)]);
        let result = build_from(vec![], &selection);
        assert_eq!(
            result,
            Err(InfeasibilityReason::MandatoryMissing("X".to_owned()))
        );
    }

    #[test]
    fn mandatory_group_present_in_original_catalog_but_filtered_away_is_prerequisite_unmet() {
        // Simulates a group whose sections existed before the smart filter
        // ran (e.g. removed for an unmet prerequisite) rather than one that
        // was never in the catalog at all.
        let original = HashSet::from(["X".to_owned(), "Y".to_owned()]);
        let selection = HashMap::from([("Y".to_owned(), SelectionPolicy::Mandatory)]);
        let result = build(vec![course("X.1", CourseType::Lecture, vec![TimeSlot::new(Day::Mon, 1)])], &original, &selection);
        assert_eq!(
            result,
            Err(InfeasibilityReason::PrerequisiteUnmet("Y".to_owned()))
        );
    }

    #[test]
    fn optional_group_gets_synthetic_skip_option() {
        let catalog = vec![course("X.1", CourseType::Lecture, vec![TimeSlot::new(Day::Mon, 1)])];
        let selection = HashMap::from([("X".to_owned(), SelectionPolicy::Optional)]);
        let search = build_from(catalog, &selection).unwrap();
        assert_eq!(search.groups.len(), 1);
        assert!(search.groups[0].options.iter().any(|o| o.is_skip));
        assert_eq!(search.groups[0].options.len(), 2);
    }

    #[test]
    fn lecture_and_lab_combine_into_one_option() {
        let catalog = vec![
            course("X.1", CourseType::Lecture, vec![TimeSlot::new(Day::Mon, 1)]),
            course("X.L1", CourseType::Lab, vec![TimeSlot::new(Day::Tue, 1)]),
        ];
        let selection = HashMap::from([("X".to_owned(), SelectionPolicy::Mandatory)]);
        let search = build_from(catalog, &selection).unwrap();
        assert_eq!(search.groups[0].options.len(), 1);
        assert_eq!(search.groups[0].options[0].section_indices.len(), 2);
    }

    #[test]
    fn internally_conflicting_combination_is_dropped() {
        let catalog = vec![
            course("X.1", CourseType::Lecture, vec![TimeSlot::new(Day::Mon, 1)]),
            course("X.L1", CourseType::Lab, vec![TimeSlot::new(Day::Mon, 1)]),
        ];
        let selection = HashMap::from([("X".to_owned(), SelectionPolicy::Mandatory)]);
        let result = build_from(catalog, &selection);
        assert_eq!(
            result,
            Err(InfeasibilityReason::MandatoryMissing("X".to_owned()))
        );
    }

    #[test]
    fn groups_ordered_most_constrained_first() {
        let catalog = vec![
            course("X.1", CourseType::Lecture, vec![TimeSlot::new(Day::Mon, 1)]),
            course("X.2", CourseType::Lecture, vec![TimeSlot::new(Day::Mon, 2)]),
            course("Y.1", CourseType::Lecture, vec![TimeSlot::new(Day::Wed, 1)]),
        ];
        let selection = HashMap::from([
            ("X".to_owned(), SelectionPolicy::Mandatory),
            ("Y".to_owned(), SelectionPolicy::Mandatory),
        ]);
        let search = build_from(catalog, &selection).unwrap();
        assert_eq!(search.groups[0].main_code, "Y");
        assert_eq!(search.groups[1].main_code, "X");
    }
}
