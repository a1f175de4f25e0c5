//! Hill-climbing local search (spec.md §4.5.2): start from a random feasible
//! chromosome, repeatedly move to the best strictly-improving neighbor, and
//! restart from a partially-randomized chromosome once stuck at a local
//! optimum.
//!
//! Restarts use `util::IterSelections` to pick which groups to re-randomize,
//! growing the selection size each restart so later restarts explore further
//! from the previous optimum — the use `util.rs` was written for.

use crate::algorithms::{
    chromosome_is_feasible, chromosome_score, chromosome_to_sections, neighbors,
    random_chromosome, seeded_rng, Chromosome,
};
use crate::scheduler::{
    finalize, AlgorithmCategory, AlgorithmMetadata, ProgressEvent, RunDeadline, RunInputs,
    Scheduler,
};
use crate::stats::RunStats;
use crate::util::IterSelections;
use rand::Rng;

#[derive(Debug, Default)]
pub struct HillClimbing;

/// Try up to `attempts` random chromosomes, returning the first feasible
/// one found (or the last attempt if none were feasible).
fn random_feasible_start(
    search: &crate::builder::PreparedSearch,
    limits: &crate::model::Limits,
    transcript: Option<&crate::model::TranscriptView>,
    rng: &mut impl Rng,
    attempts: usize,
) -> Chromosome {
    let mut best = random_chromosome(search, rng);
    for _ in 0..attempts {
        let candidate = random_chromosome(search, rng);
        if chromosome_is_feasible(&candidate, search, limits, transcript) {
            return candidate;
        }
        best = candidate;
    }
    best
}

/// Randomize exactly the groups in `selected_groups`, keeping the rest of
/// `base` unchanged.
fn randomize_selected(
    base: &Chromosome,
    selected_groups: &[&usize],
    search: &crate::builder::PreparedSearch,
    rng: &mut impl Rng,
) -> Chromosome {
    let mut chromosome = base.clone();
    for &&group_idx in selected_groups {
        let option_count = search.groups[group_idx].options.len();
        if option_count > 0 {
            chromosome[group_idx] = rng.gen_range(0..option_count);
        }
    }
    chromosome
}

/// Climb from `start` to a local optimum: repeatedly move to the best
/// strictly-improving feasible neighbor, stopping when none improves or the
/// deadline fires.
fn climb(
    start: Chromosome,
    search: &crate::builder::PreparedSearch,
    limits: &crate::model::Limits,
    prefs: &crate::scorer::SchedulerPrefs,
    transcript: Option<&crate::model::TranscriptView>,
    deadline: &RunDeadline,
    nodes_explored: &mut u64,
) -> Chromosome {
    let mut current = start;
    let mut current_score = chromosome_score(&current, search, limits, prefs, transcript);

    loop {
        if deadline.should_stop() {
            break;
        }
        let mut best_neighbor: Option<(Chromosome, f64)> = None;
        for (_, neighbor) in neighbors(&current, search) {
            *nodes_explored += 1;
            let neighbor_score = chromosome_score(&neighbor, search, limits, prefs, transcript);
            if neighbor_score > current_score {
                if best_neighbor.as_ref().map(|(_, s)| neighbor_score > *s).unwrap_or(true) {
                    best_neighbor = Some((neighbor, neighbor_score));
                }
            }
        }
        match best_neighbor {
            Some((neighbor, neighbor_score)) => {
                current = neighbor;
                current_score = neighbor_score;
            }
            None => break,
        }
    }
    current
}

impl Scheduler for HillClimbing {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            name: "hill_climbing",
            category: AlgorithmCategory::LocalSearch,
            is_optimal: false,
            supports_preferences: true,
            complexity_hint: "polynomial per restart, no completeness or optimality guarantee",
            good_for: "large catalogs where a good-enough schedule quickly beats an exhaustive search",
        }
    }

    fn run(&self, inputs: RunInputs<'_>) -> (Vec<crate::model::Schedule>, RunStats) {
        let deadline = RunDeadline::new(inputs.limits.timeout, inputs.cancel.clone());
        let search = inputs.search;
        let mut rng = seeded_rng(inputs.seed);
        let max_results = inputs.limits.max_results as usize;

        let mut candidates: Vec<Vec<usize>> = Vec::new();
        let mut seen_chromosomes: std::collections::HashSet<Chromosome> =
            std::collections::HashSet::new();
        let mut nodes_explored: u64 = 0;
        let group_indices: Vec<usize> = (0..search.groups.len()).collect();

        let mut restart_size = 1usize.min(group_indices.len().max(1));
        let mut restarts = 0u32;
        const MAX_RESTARTS: u32 = 200;

        let mut best_known: Option<Chromosome> = None;

        while candidates.len() < max_results && restarts < MAX_RESTARTS && !deadline.should_stop() {
            let start = match &best_known {
                None => random_feasible_start(search, inputs.limits, inputs.transcript, &mut rng, 20),
                Some(base) => {
                    let k = restart_size.min(group_indices.len());
                    if k == 0 {
                        random_feasible_start(search, inputs.limits, inputs.transcript, &mut rng, 20)
                    } else {
                        let selections: Vec<Vec<&usize>> =
                            group_indices[..].iter_selections(k).collect();
                        if selections.is_empty() {
                            random_feasible_start(search, inputs.limits, inputs.transcript, &mut rng, 20)
                        } else {
                            let pick = rng.gen_range(0..selections.len());
                            randomize_selected(base, &selections[pick], search, &mut rng)
                        }
                    }
                }
            };

            let result = climb(
                start,
                search,
                inputs.limits,
                inputs.prefs,
                inputs.transcript,
                &deadline,
                &mut nodes_explored,
            );

            if chromosome_is_feasible(&result, search, inputs.limits, inputs.transcript)
                && seen_chromosomes.insert(result.clone())
            {
                candidates.push(chromosome_to_sections(&result, search));
                best_known = Some(result);
                restart_size = 1;
            } else {
                restart_size = (restart_size + 1).min(group_indices.len().max(1));
            }
            restarts += 1;

            if restarts % 8 == 0 {
                inputs.progress.emit(ProgressEvent {
                    algorithm_name: "hill_climbing".to_owned(),
                    nodes_explored,
                    branches_pruned: 0,
                    current_best_score: 0.0,
                    elapsed_ms: deadline.elapsed().as_millis() as u64,
                });
            }
        }

        let mut stats = RunStats::new("hill_climbing");
        stats.nodes_explored = nodes_explored;
        stats.branches_pruned = 0;
        stats.wall_clock = deadline.elapsed();
        stats.termination = deadline.termination();

        let schedules = finalize(candidates, search, inputs.limits, inputs.prefs, inputs.transcript);
        (schedules, stats)
    }
}
