//! The ten concrete schedulers (spec.md §4.5), sharing the `Scheduler`
//! contract, `PartialSchedule`/`ConflictMatrix` evaluator primitives, and the
//! `finalize()` template.
//!
//! Grounded on the teacher's `bab.rs`/`caobab.rs` split: one generic search
//! engine idiom (push/pop a partial, bound on score, backtrack), specialized
//! per algorithm family the way `caobab.rs` specializes `bab::solve` for the
//! course-assignment problem.

pub mod a_star;
pub mod bfs;
pub mod dfs;
pub mod genetic;
pub mod hill_climbing;
pub mod hybrid;
pub mod iddfs;
pub mod particle_swarm;
pub mod simulated_annealing;
pub mod tabu_search;

use crate::builder::PreparedSearch;
use crate::evaluator::{is_feasible_partial, ConflictMatrix, PartialSchedule};
use crate::model::{Limits, TranscriptView};
use crate::scorer::{score, SchedulerPrefs};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A chromosome / candidate assignment: `genes[g]` is the index into
/// `search.groups[g].options` chosen for group `g`. Shared representation
/// for the complete-search frontier, local-search "current candidate", and
/// the population-based chromosome (spec.md §4.5.2/§4.5.3).
pub type Chromosome = Vec<usize>;

/// Expand a chromosome into the flat list of section indices it selects.
pub fn chromosome_to_sections(chromosome: &Chromosome, search: &PreparedSearch) -> Vec<usize> {
    let mut sections = Vec::new();
    for (group_idx, &option_idx) in chromosome.iter().enumerate() {
        sections.extend(&search.groups[group_idx].options[option_idx].section_indices);
    }
    sections
}

/// Reproducible RNG seeded as specified by `RunInputs::seed` (spec.md §5:
/// "local/population algorithms accept a seed parameter").
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Whether a chromosome, expanded to sections, currently satisfies every
/// hard constraint that `is_feasible_partial` can check (does not check
/// mandatory-group coverage, since a chromosome always has one gene per
/// group by construction).
pub fn chromosome_is_feasible(
    chromosome: &Chromosome,
    search: &PreparedSearch,
    limits: &Limits,
    transcript: Option<&TranscriptView>,
) -> bool {
    let sections = chromosome_to_sections(chromosome, search);
    let courses: Vec<_> = sections.iter().map(|&i| search.catalog[i].clone()).collect();
    is_feasible_partial(&courses, limits, transcript).is_ok()
}

/// Score a chromosome under the caller's preferences; infeasible chromosomes
/// score `f64::NEG_INFINITY` so they never win a comparison.
pub fn chromosome_score(
    chromosome: &Chromosome,
    search: &PreparedSearch,
    limits: &Limits,
    prefs: &SchedulerPrefs,
    transcript: Option<&TranscriptView>,
) -> f64 {
    if !chromosome_is_feasible(chromosome, search, limits, transcript) {
        return f64::NEG_INFINITY;
    }
    let sections = chromosome_to_sections(chromosome, search);
    let schedule = crate::scheduler::schedule_from_indices(&sections, search);
    score(&schedule, prefs, limits)
}

/// Generate a random feasible-looking starting chromosome (one random option
/// per group; feasibility is checked by the caller, not guaranteed here).
pub fn random_chromosome(search: &PreparedSearch, rng: &mut impl rand::Rng) -> Chromosome {
    search
        .groups
        .iter()
        .map(|g| rng.gen_range(0..g.options.len()))
        .collect()
}

/// Every feasible neighbor of a chromosome obtained by swapping exactly one
/// group's chosen option for another of that same group's options
/// (spec.md §4.5.2: "move = swap one group's option for another feasible
/// one").
pub fn neighbors(chromosome: &Chromosome, search: &PreparedSearch) -> Vec<(usize, Chromosome)> {
    let mut result = Vec::new();
    for (group_idx, group) in search.groups.iter().enumerate() {
        for option_idx in 0..group.options.len() {
            if option_idx == chromosome[group_idx] {
                continue;
            }
            let mut neighbor = chromosome.clone();
            neighbor[group_idx] = option_idx;
            result.push((group_idx, neighbor));
        }
    }
    result
}

/// Shared helper for the incremental complete-search family: expand a
/// chromosome prefix into a `PartialSchedule` over the conflict matrix.
pub fn partial_from_prefix(
    prefix: &[usize],
    search: &PreparedSearch,
) -> PartialSchedule {
    let mut partial = PartialSchedule::empty();
    for (group_idx, &option_idx) in prefix.iter().enumerate() {
        for &section_idx in &search.groups[group_idx].options[option_idx].section_indices {
            let ects = search.catalog[section_idx].ects;
            partial.push(section_idx, ects, &search.conflict_matrix);
        }
    }
    partial
}

pub fn conflict_matrix(search: &PreparedSearch) -> &ConflictMatrix {
    &search.conflict_matrix
}

fn section_prereqs_ok(
    section_idx: usize,
    search: &PreparedSearch,
    transcript: Option<&TranscriptView>,
) -> bool {
    match transcript {
        None => true,
        Some(t) => search.catalog[section_idx]
            .prerequisites
            .iter()
            .all(|p| t.completed_course_codes.contains(p)),
    }
}

fn partial_within_budget(partial: &PartialSchedule, limits: &Limits) -> bool {
    if let Some(cap) = limits.max_ects {
        if partial.total_ects > cap {
            return false;
        }
    }
    partial.conflict_count <= limits.max_conflicts
}

/// Outcome of a bounded tree-search pass, shared by DFS and IDDFS (which is
/// just DFS re-run with an increasing `depth_bound`).
pub struct TreeSearchOutcome {
    pub candidates: Vec<Vec<usize>>,
    pub nodes_explored: u64,
    pub branches_pruned: u64,
    pub exhausted: bool,
}

/// Immutable context shared by every node of a `tree_search` recursion.
struct TreeSearchCtx<'a> {
    search: &'a PreparedSearch,
    limits: &'a Limits,
    transcript: Option<&'a TranscriptView>,
    deadline: &'a crate::scheduler::RunDeadline,
    progress: &'a crate::scheduler::ProgressSink,
    algorithm_name: &'a str,
    max_results: usize,
    depth_bound: usize,
}

/// Mutable search state threaded through the recursion: the partial
/// assignment under construction plus the running counters and candidates.
struct TreeSearchState {
    prefix: Chromosome,
    partial: PartialSchedule,
    candidates: Vec<Vec<usize>>,
    nodes_explored: u64,
    branches_pruned: u64,
    stopped_early: bool,
}

impl TreeSearchState {
    fn recurse(&mut self, group_idx: usize, ctx: &TreeSearchCtx<'_>) {
        if self.stopped_early || self.candidates.len() >= ctx.max_results {
            return;
        }
        if ctx.deadline.should_stop() {
            self.stopped_early = true;
            return;
        }
        if group_idx >= ctx.depth_bound || group_idx >= ctx.search.groups.len() {
            self.candidates
                .push(chromosome_to_sections(&self.prefix, ctx.search));
            return;
        }

        let group = &ctx.search.groups[group_idx];
        for option_idx in 0..group.options.len() {
            if self.stopped_early || self.candidates.len() >= ctx.max_results {
                return;
            }
            if ctx.deadline.should_stop() {
                self.stopped_early = true;
                return;
            }
            self.nodes_explored += 1;

            let option = &group.options[option_idx];
            let pushed: Vec<usize> = option
                .section_indices
                .iter()
                .filter(|&&s| section_prereqs_ok(s, ctx.search, ctx.transcript))
                .copied()
                .collect();
            let all_prereqs_ok = pushed.len() == option.section_indices.len();

            for &section_idx in &pushed {
                let ects = ctx.search.catalog[section_idx].ects;
                self.partial.push(section_idx, ects, &ctx.search.conflict_matrix);
            }

            if all_prereqs_ok && partial_within_budget(&self.partial, ctx.limits) {
                self.prefix.push(option_idx);
                self.recurse(group_idx + 1, ctx);
                self.prefix.pop();
            } else {
                self.branches_pruned += 1;
            }

            for &section_idx in pushed.iter().rev() {
                let ects = ctx.search.catalog[section_idx].ects;
                self.partial.pop(ects, &ctx.search.conflict_matrix);
            }

            if self.nodes_explored % 64 == 0 {
                ctx.progress.emit(crate::scheduler::ProgressEvent {
                    algorithm_name: ctx.algorithm_name.to_owned(),
                    nodes_explored: self.nodes_explored,
                    branches_pruned: self.branches_pruned,
                    current_best_score: 0.0,
                    elapsed_ms: ctx.deadline.elapsed().as_millis() as u64,
                });
            }
        }
    }
}

/// Depth-bounded recursive backtracking search over `search.groups`, in
/// their most-constrained-first order, trying each group's options in the
/// lexicographic order the builder already sorted them into (spec.md
/// §4.5.1's DFS: "recursive, lexicographic option order").
///
/// Stops as soon as `max_results` candidates have been found (first
/// algorithm to do so wins, per spec.md §4.5.1), or the group tree below
/// `depth_bound` has been fully explored ("exhausted"), or the deadline
/// fires.
#[allow(clippy::too_many_arguments)]
pub fn tree_search(
    search: &PreparedSearch,
    limits: &Limits,
    transcript: Option<&TranscriptView>,
    deadline: &crate::scheduler::RunDeadline,
    progress: &crate::scheduler::ProgressSink,
    algorithm_name: &str,
    max_results: usize,
    depth_bound: usize,
) -> TreeSearchOutcome {
    let ctx = TreeSearchCtx {
        search,
        limits,
        transcript,
        deadline,
        progress,
        algorithm_name,
        max_results,
        depth_bound,
    };
    let mut state = TreeSearchState {
        prefix: Vec::new(),
        partial: PartialSchedule::empty(),
        candidates: Vec::new(),
        nodes_explored: 0,
        branches_pruned: 0,
        stopped_early: false,
    };
    state.recurse(0, &ctx);

    TreeSearchOutcome {
        exhausted: !state.stopped_early,
        candidates: state.candidates,
        nodes_explored: state.nodes_explored,
        branches_pruned: state.branches_pruned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseType, Day, SelectionPolicy, TimeSlot};
    use std::collections::HashMap;

    fn catalog() -> Vec<crate::model::Course> {
        vec![
            crate::model::Course {
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
            },
            crate::model::Course {
                code: "Y.1".to_owned(),
                name: "Y".to_owned(),
                ects: 3,
                course_type: CourseType::Lecture,
                slots: vec![TimeSlot::new(Day::Tue, 1)],
                teacher: String::new(),
                faculty: String::new(),
                department: String::new(),
                campus: String::new(),
                prerequisites: Vec::new(),
                corequisites: Vec::new(),
            },
        ]
    }

    #[test]
    fn chromosome_to_sections_expands_every_group() {
        let selection = HashMap::from([
            ("X".to_owned(), SelectionPolicy::Mandatory),
            ("Y".to_owned(), SelectionPolicy::Mandatory),
        ]);
        let c = catalog();
        let original = crate::builder::main_codes(&c);
        let search = crate::builder::build(c, &original, &selection).unwrap();
        let chromosome: Chromosome = vec![0, 0];
        let sections = chromosome_to_sections(&chromosome, &search);
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn neighbors_never_repeats_current_option() {
        let selection = HashMap::from([
            ("X".to_owned(), SelectionPolicy::Optional),
            ("Y".to_owned(), SelectionPolicy::Excluded),
        ]);
        let c = catalog();
        let original = crate::builder::main_codes(&c);
        let search = crate::builder::build(c, &original, &selection).unwrap();
        let chromosome: Chromosome = vec![0];
        let result = neighbors(&chromosome, &search);
        assert!(result.iter().all(|(_, n)| n[0] != chromosome[0]));
    }
}
