//! Depth-first complete search (spec.md §4.5.1): recursive, lexicographic
//! option order, first algorithm family to stop as soon as `max_results`
//! candidates are found. A thin `Scheduler` wrapper around the shared
//! `tree_search` engine with `depth_bound = search.groups.len()` (no
//! iterative deepening).

use super::tree_search;
use crate::scheduler::{
    finalize, AlgorithmCategory, AlgorithmMetadata, RunDeadline, RunInputs, Scheduler,
};
use crate::stats::RunStats;

#[derive(Debug, Default)]
pub struct Dfs;

impl Scheduler for Dfs {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            name: "dfs",
            category: AlgorithmCategory::CompleteSearch,
            is_optimal: true,
            supports_preferences: true,
            complexity_hint: "exponential worst case, fast to first result",
            good_for: "small to medium catalogs where any feasible schedule is wanted quickly",
        }
    }

    fn run(&self, inputs: RunInputs<'_>) -> (Vec<crate::model::Schedule>, RunStats) {
        let deadline = RunDeadline::new(inputs.limits.timeout, inputs.cancel.clone());
        let outcome = tree_search(
            inputs.search,
            inputs.limits,
            inputs.transcript,
            &deadline,
            inputs.progress,
            "dfs",
            inputs.limits.max_results as usize,
            inputs.search.groups.len(),
        );

        let mut stats = RunStats::new("dfs");
        stats.nodes_explored = outcome.nodes_explored;
        stats.branches_pruned = outcome.branches_pruned;
        stats.wall_clock = deadline.elapsed();
        stats.termination = deadline.termination();

        let schedules = finalize(
            outcome.candidates,
            inputs.search,
            inputs.limits,
            inputs.prefs,
            inputs.transcript,
        );
        (schedules, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseType, Day, Limits, SelectionPolicy, TimeSlot};
    use crate::scheduler::{CancelToken, ProgressSink};
    use crate::scorer::SchedulerPrefs;
    use std::collections::HashMap;

    #[test]
    fn dfs_finds_a_trivial_feasible_schedule() {
        let catalog = vec![crate::model::Course {
            code: "X.1".to_owned(),
            name: "X".to_owned(),
            ects: 5,
            course_type: CourseType::Lecture,
            slots: vec![TimeSlot::new(Day::Mon, 1)],
            teacher: String::new(),
            faculty: String::new(),
            department: String::new(),
            campus: String::new(),
            prerequisites: Vec::new(),
            corequisites: Vec::new(),
        }];
        let selection = HashMap::from([("X".to_owned(), SelectionPolicy::Mandatory)]);
        let original = crate::builder::main_codes(&catalog);
        let search = crate::builder::build(catalog, &original, &selection).unwrap();
        let limits = Limits::default();
        let prefs = SchedulerPrefs::default();
        let progress = ProgressSink::default();

        let (schedules, stats) = Dfs.run(RunInputs {
            search: &search,
            limits: &limits,
            prefs: &prefs,
            transcript: None,
            cancel: CancelToken::new(),
            progress: &progress,
            seed: 0,
        });

        assert_eq!(schedules.len(), 1);
        assert_eq!(stats.algorithm_name, "dfs");
    }
}
