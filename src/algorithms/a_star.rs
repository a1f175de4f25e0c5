//! Best-first complete search (spec.md §4.5.1's A*): a priority frontier
//! ordered by `g + h`, where `g` is the preference score of the partial
//! assignment so far and `h` is an optimistic upper bound on the remaining
//! groups' contribution (every still-unassigned group could in principle
//! hit every weighted component at its maximum of 1.0). Pops the most
//! promising partial first, so the first full assignment it completes is a
//! good schedule, not merely the lexicographically first one.
//!
//! Grounded on `ordered-float::OrderedFloat`, already a teacher dependency,
//! to make `f64` priorities usable as `BinaryHeap` keys without a custom
//! wrapper.

use crate::algorithms::{chromosome_to_sections, Chromosome};
use crate::evaluator::PartialSchedule;
use crate::scheduler::{
    finalize, schedule_from_indices, AlgorithmCategory, AlgorithmMetadata, ProgressEvent,
    RunDeadline, RunInputs, Scheduler,
};
use crate::scorer::{score, SchedulerPrefs};
use crate::stats::RunStats;
use ordered_float::OrderedFloat;
use std::collections::BinaryHeap;

#[derive(Debug, Default)]
pub struct AStar;

struct Node {
    prefix: Chromosome,
    partial: PartialSchedule,
    priority: OrderedFloat<f64>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}
impl Eq for Node {}
impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Node {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority.cmp(&other.priority)
    }
}

/// Sum of every weight in `prefs`: the maximum any single group's worth of
/// components could possibly contribute, used as the admissible per-group
/// heuristic bound.
fn max_weight_sum(prefs: &SchedulerPrefs) -> f64 {
    prefs.prefer_fewer_conflicts
        + prefs.prefer_more_ects
        + prefs.prefer_fewer_ects
        + prefs.prefer_morning
        + prefs.prefer_afternoon
        + prefs.compactness
        + prefs.free_days_weight
        + prefs.preferred_campus_weight
        + prefs.preferred_teacher_weight
}

impl Scheduler for AStar {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            name: "a_star",
            category: AlgorithmCategory::CompleteSearch,
            is_optimal: true,
            supports_preferences: true,
            complexity_hint: "exponential worst case, but frontier order favors high-scoring schedules early",
            good_for: "preference-heavy requests where a good schedule matters more than the first one",
        }
    }

    fn run(&self, inputs: RunInputs<'_>) -> (Vec<crate::model::Schedule>, RunStats) {
        let deadline = RunDeadline::new(inputs.limits.timeout, inputs.cancel.clone());
        let search = inputs.search;
        let max_results = inputs.limits.max_results as usize;
        let per_group_bound = max_weight_sum(inputs.prefs);

        let mut heap: BinaryHeap<Node> = BinaryHeap::new();
        heap.push(Node {
            prefix: Vec::new(),
            partial: PartialSchedule::empty(),
            priority: OrderedFloat(per_group_bound * search.groups.len() as f64),
        });

        let mut candidates = Vec::new();
        let mut nodes_explored: u64 = 0;
        let mut branches_pruned: u64 = 0;
        let mut stopped_early = false;

        while let Some(node) = heap.pop() {
            if candidates.len() >= max_results {
                break;
            }
            if deadline.should_stop() {
                stopped_early = true;
                break;
            }

            let group_idx = node.prefix.len();
            if group_idx >= search.groups.len() {
                candidates.push(chromosome_to_sections(&node.prefix, search));
                continue;
            }

            let group = &search.groups[group_idx];
            for option_idx in 0..group.options.len() {
                nodes_explored += 1;

                let option = &group.options[option_idx];
                let prereqs_ok = option
                    .section_indices
                    .iter()
                    .all(|&s| super::section_prereqs_ok(s, search, inputs.transcript));

                let mut partial = node.partial.clone();
                for &section_idx in &option.section_indices {
                    let ects = search.catalog[section_idx].ects;
                    partial.push(section_idx, ects, &search.conflict_matrix);
                }

                if prereqs_ok && super::partial_within_budget(&partial, inputs.limits) {
                    let mut prefix = node.prefix.clone();
                    prefix.push(option_idx);

                    let g = score(
                        &schedule_from_indices(&partial.indices, search),
                        inputs.prefs,
                        inputs.limits,
                    );
                    let remaining = search.groups.len() - prefix.len();
                    let h = per_group_bound * remaining as f64;

                    heap.push(Node {
                        prefix,
                        partial,
                        priority: OrderedFloat(g + h),
                    });
                } else {
                    branches_pruned += 1;
                }

                if nodes_explored % 64 == 0 {
                    inputs.progress.emit(ProgressEvent {
                        algorithm_name: "a_star".to_owned(),
                        nodes_explored,
                        branches_pruned,
                        current_best_score: 0.0,
                        elapsed_ms: deadline.elapsed().as_millis() as u64,
                    });
                }
            }
        }

        let mut stats = RunStats::new("a_star");
        stats.nodes_explored = nodes_explored;
        stats.branches_pruned = branches_pruned;
        stats.wall_clock = deadline.elapsed();
        stats.termination = if stopped_early {
            deadline.termination()
        } else {
            crate::stats::Termination::Completed
        };

        let schedules = finalize(candidates, search, inputs.limits, inputs.prefs, inputs.transcript);
        (schedules, stats)
    }
}
