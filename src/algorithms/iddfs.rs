//! Iterative-deepening depth-first search (spec.md §4.5.1): `tree_search` is
//! re-run with an increasing `depth_bound`, from 1 up to the full number of
//! groups, re-exploring shallow nodes on every pass. Complete candidates
//! only ever appear on the final, full-depth pass (every candidate needs one
//! gene per group, skip options included); earlier passes exist purely to
//! mirror the classic IDDFS re-exploration cost and to notice a deadline or
//! cancellation before committing to the full-depth search.

use super::tree_search;
use crate::scheduler::{
    finalize, AlgorithmCategory, AlgorithmMetadata, RunDeadline, RunInputs, Scheduler,
};
use crate::stats::RunStats;

#[derive(Debug, Default)]
pub struct Iddfs;

impl Scheduler for Iddfs {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            name: "iddfs",
            category: AlgorithmCategory::CompleteSearch,
            is_optimal: true,
            supports_preferences: true,
            complexity_hint: "re-explores shallow nodes every pass, bounded memory like dfs",
            good_for: "deep catalogs where memory use must stay low but early termination is valuable",
        }
    }

    fn run(&self, inputs: RunInputs<'_>) -> (Vec<crate::model::Schedule>, RunStats) {
        let deadline = RunDeadline::new(inputs.limits.timeout, inputs.cancel.clone());
        let full_depth = inputs.search.groups.len();

        let mut nodes_explored = 0u64;
        let mut branches_pruned = 0u64;
        let mut candidates = Vec::new();

        for depth_bound in 1..=full_depth.max(1) {
            if deadline.should_stop() {
                break;
            }
            let outcome = tree_search(
                inputs.search,
                inputs.limits,
                inputs.transcript,
                &deadline,
                inputs.progress,
                "iddfs",
                inputs.limits.max_results as usize,
                depth_bound,
            );
            nodes_explored += outcome.nodes_explored;
            branches_pruned += outcome.branches_pruned;
            if depth_bound == full_depth {
                candidates = outcome.candidates;
            }
        }

        let mut stats = RunStats::new("iddfs");
        stats.nodes_explored = nodes_explored;
        stats.branches_pruned = branches_pruned;
        stats.wall_clock = deadline.elapsed();
        stats.termination = deadline.termination();

        let schedules = finalize(
            candidates,
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
    fn iddfs_finds_the_same_feasible_schedule_as_dfs() {
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

        let (schedules, stats) = Iddfs.run(RunInputs {
            search: &search,
            limits: &limits,
            prefs: &prefs,
            transcript: None,
            cancel: CancelToken::new(),
            progress: &progress,
            seed: 0,
        });

        assert_eq!(schedules.len(), 1);
        assert!(stats.nodes_explored >= 1);
    }
}
