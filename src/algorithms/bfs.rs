//! Breadth-first complete search (spec.md §4.5.1): explores the group tree
//! level by level with an explicit queue rather than recursion, so memory
//! grows with the frontier width instead of the recursion depth. Separate
//! from `tree_search` (which is depth-first by construction) since BFS needs
//! its own frontier data structure.

use crate::algorithms::Chromosome;
use crate::builder::PreparedSearch;
use crate::evaluator::PartialSchedule;
use crate::scheduler::{
    finalize, AlgorithmCategory, AlgorithmMetadata, ProgressEvent, RunDeadline, RunInputs,
    Scheduler,
};
use crate::stats::RunStats;
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct Bfs;

struct Frontier {
    prefix: Chromosome,
    partial: PartialSchedule,
}

impl Scheduler for Bfs {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            name: "bfs",
            category: AlgorithmCategory::CompleteSearch,
            is_optimal: true,
            supports_preferences: true,
            complexity_hint: "frontier grows with branching factor, can exhaust memory on wide catalogs",
            good_for: "shallow group trees where the shortest feasible combination is wanted first",
        }
    }

    fn run(&self, inputs: RunInputs<'_>) -> (Vec<crate::model::Schedule>, RunStats) {
        let deadline = RunDeadline::new(inputs.limits.timeout, inputs.cancel.clone());
        let search = inputs.search;
        let max_results = inputs.limits.max_results as usize;

        let mut queue: VecDeque<Frontier> = VecDeque::new();
        queue.push_back(Frontier {
            prefix: Vec::new(),
            partial: PartialSchedule::empty(),
        });

        let mut candidates = Vec::new();
        let mut nodes_explored: u64 = 0;
        let mut branches_pruned: u64 = 0;
        let mut stopped_early = false;

        'outer: while let Some(node) = queue.pop_front() {
            if candidates.len() >= max_results {
                break;
            }
            if deadline.should_stop() {
                stopped_early = true;
                break;
            }

            let group_idx = node.prefix.len();
            if group_idx >= search.groups.len() {
                candidates.push(
                    crate::algorithms::chromosome_to_sections(&node.prefix, search),
                );
                continue;
            }

            let group = &search.groups[group_idx];
            for option_idx in 0..group.options.len() {
                if candidates.len() >= max_results {
                    break 'outer;
                }
                if deadline.should_stop() {
                    stopped_early = true;
                    break 'outer;
                }
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

                let within_budget = super::partial_within_budget(&partial, inputs.limits);

                if prereqs_ok && within_budget {
                    let mut prefix = node.prefix.clone();
                    prefix.push(option_idx);
                    queue.push_back(Frontier { prefix, partial });
                } else {
                    branches_pruned += 1;
                }

                if nodes_explored % 64 == 0 {
                    inputs.progress.emit(ProgressEvent {
                        algorithm_name: "bfs".to_owned(),
                        nodes_explored,
                        branches_pruned,
                        current_best_score: 0.0,
                        elapsed_ms: deadline.elapsed().as_millis() as u64,
                    });
                }
            }
        }

        let mut stats = RunStats::new("bfs");
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
