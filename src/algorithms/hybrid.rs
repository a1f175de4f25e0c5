//! Hybrid algorithm (spec.md §4.5.4): a memetic genetic algorithm, i.e. a
//! genetic algorithm whose elite individuals are locally refined by
//! hill-climbing every generation before becoming parents, combining the
//! population-based family's global exploration with the local-search
//! family's fast convergence around a good individual.

use crate::algorithms::{
    chromosome_is_feasible, chromosome_score, chromosome_to_sections, neighbors,
    random_chromosome, seeded_rng, Chromosome,
};
use crate::builder::PreparedSearch;
use crate::model::{Limits, TranscriptView};
use crate::scheduler::{
    finalize, AlgorithmCategory, AlgorithmMetadata, ProgressEvent, RunDeadline, RunInputs,
    Scheduler,
};
use crate::scorer::SchedulerPrefs;
use crate::stats::RunStats;
use crate::workerpool::{default_num_threads, parallel_map};
use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub struct HybridConfig {
    pub population_size: usize,
    pub generations: u32,
    pub tournament_size: usize,
    /// Per-gene probability of taking that gene from the second parent in
    /// uniform crossover.
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub elite_count: usize,
    /// How many hill-climbing steps each elite gets per generation.
    pub local_refinement_steps: u32,
}

impl Default for HybridConfig {
    fn default() -> Self {
        HybridConfig {
            population_size: 40,
            generations: 80,
            tournament_size: 3,
            crossover_rate: 0.5,
            mutation_rate: 0.08,
            elite_count: 4,
            local_refinement_steps: 10,
        }
    }
}

#[derive(Debug, Default)]
pub struct Hybrid {
    pub config: HybridConfig,
}

fn evaluate_population(
    population: &[Chromosome],
    search: &PreparedSearch,
    limits: &Limits,
    prefs: &SchedulerPrefs,
    transcript: Option<&TranscriptView>,
) -> Vec<f64> {
    let items: Vec<Chromosome> = population.to_vec();
    parallel_map(items, default_num_threads(), |chromosome| {
        chromosome_score(chromosome, search, limits, prefs, transcript)
    })
}

/// Hill-climb `chromosome` for at most `steps` strictly-improving moves.
fn local_refine(
    chromosome: &Chromosome,
    search: &PreparedSearch,
    limits: &Limits,
    prefs: &SchedulerPrefs,
    transcript: Option<&TranscriptView>,
    steps: u32,
) -> Chromosome {
    let mut current = chromosome.clone();
    let mut current_score = chromosome_score(&current, search, limits, prefs, transcript);
    for _ in 0..steps {
        let mut improved = false;
        for (_, neighbor) in neighbors(&current, search) {
            let neighbor_score = chromosome_score(&neighbor, search, limits, prefs, transcript);
            if neighbor_score > current_score {
                current = neighbor;
                current_score = neighbor_score;
                improved = true;
            }
        }
        if !improved {
            break;
        }
    }
    current
}

fn tournament_select<'a>(
    population: &'a [Chromosome],
    fitness: &[f64],
    tournament_size: usize,
    rng: &mut impl Rng,
) -> &'a Chromosome {
    let mut best_idx = rng.gen_range(0..population.len());
    for _ in 1..tournament_size {
        let candidate_idx = rng.gen_range(0..population.len());
        if fitness[candidate_idx] > fitness[best_idx] {
            best_idx = candidate_idx;
        }
    }
    &population[best_idx]
}

/// Uniform crossover: each gene independently comes from `b` with
/// probability `rate`, from `a` otherwise.
fn crossover(a: &Chromosome, b: &Chromosome, rate: f64, rng: &mut impl Rng) -> Chromosome {
    a.iter()
        .zip(b.iter())
        .map(|(&gene_a, &gene_b)| if rng.gen::<f64>() < rate { gene_b } else { gene_a })
        .collect()
}

fn mutate(chromosome: &mut Chromosome, search: &PreparedSearch, rate: f64, rng: &mut impl Rng) {
    for (group_idx, gene) in chromosome.iter_mut().enumerate() {
        if rng.gen::<f64>() < rate {
            let option_count = search.groups[group_idx].options.len();
            if option_count > 0 {
                *gene = rng.gen_range(0..option_count);
            }
        }
    }
}

impl Scheduler for Hybrid {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            name: "hybrid",
            category: AlgorithmCategory::Hybrid,
            is_optimal: false,
            supports_preferences: true,
            complexity_hint: "population_size * generations evaluations plus per-elite local refinement",
            good_for: "cases where neither pure population search nor pure local search converges fast enough alone",
        }
    }

    fn run(&self, inputs: RunInputs<'_>) -> (Vec<crate::model::Schedule>, RunStats) {
        let deadline = RunDeadline::new(inputs.limits.timeout, inputs.cancel.clone());
        let search = inputs.search;
        let mut rng = seeded_rng(inputs.seed);
        let max_results = inputs.limits.max_results as usize;

        let mut population: Vec<Chromosome> = (0..self.config.population_size)
            .map(|_| random_chromosome(search, &mut rng))
            .collect();

        let mut nodes_explored: u64 = 0;
        let mut generation = 0u32;

        while generation < self.config.generations && !deadline.should_stop() {
            let mut fitness = evaluate_population(
                &population,
                search,
                inputs.limits,
                inputs.prefs,
                inputs.transcript,
            );
            nodes_explored += population.len() as u64;

            let mut ranked: Vec<usize> = (0..population.len()).collect();
            ranked.sort_by(|&a, &b| fitness[b].partial_cmp(&fitness[a]).unwrap_or(std::cmp::Ordering::Equal));

            for &idx in ranked.iter().take(self.config.elite_count) {
                let refined = local_refine(
                    &population[idx],
                    search,
                    inputs.limits,
                    inputs.prefs,
                    inputs.transcript,
                    self.config.local_refinement_steps,
                );
                let refined_score = chromosome_score(&refined, search, inputs.limits, inputs.prefs, inputs.transcript);
                population[idx] = refined;
                fitness[idx] = refined_score;
            }

            let mut next_generation = Vec::with_capacity(population.len());
            for &idx in ranked.iter().take(self.config.elite_count) {
                next_generation.push(population[idx].clone());
            }
            while next_generation.len() < population.len() {
                let parent_a = tournament_select(&population, &fitness, self.config.tournament_size, &mut rng);
                let parent_b = tournament_select(&population, &fitness, self.config.tournament_size, &mut rng);
                let mut child = crossover(parent_a, parent_b, self.config.crossover_rate, &mut rng);
                mutate(&mut child, search, self.config.mutation_rate, &mut rng);
                next_generation.push(child);
            }
            population = next_generation;
            generation += 1;

            if generation % 8 == 0 {
                let best = fitness.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                inputs.progress.emit(ProgressEvent {
                    algorithm_name: "hybrid".to_owned(),
                    nodes_explored,
                    branches_pruned: 0,
                    current_best_score: best.max(0.0),
                    elapsed_ms: deadline.elapsed().as_millis() as u64,
                });
            }
        }

        let final_fitness = evaluate_population(
            &population,
            search,
            inputs.limits,
            inputs.prefs,
            inputs.transcript,
        );
        let mut ranked: Vec<usize> = (0..population.len()).collect();
        ranked.sort_by(|&a, &b| {
            final_fitness[b]
                .partial_cmp(&final_fitness[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut candidates: Vec<Vec<usize>> = Vec::new();
        let mut seen_chromosomes: std::collections::HashSet<Chromosome> =
            std::collections::HashSet::new();
        for &idx in &ranked {
            if candidates.len() >= max_results {
                break;
            }
            let chromosome = &population[idx];
            if chromosome_is_feasible(chromosome, search, inputs.limits, inputs.transcript)
                && seen_chromosomes.insert(chromosome.clone())
            {
                candidates.push(chromosome_to_sections(chromosome, search));
            }
        }

        let mut stats = RunStats::new("hybrid");
        stats.nodes_explored = nodes_explored;
        stats.branches_pruned = 0;
        stats.wall_clock = deadline.elapsed();
        stats.termination = deadline.termination();

        let schedules = finalize(candidates, search, inputs.limits, inputs.prefs, inputs.transcript);
        (schedules, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseType, Day, Limits, SelectionPolicy, TimeSlot};
    use crate::scheduler::CancelToken;
    use crate::scheduler::ProgressSink;
    use std::collections::HashMap;

    #[test]
    fn hybrid_finds_a_trivial_feasible_schedule() {
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

        let hybrid = Hybrid {
            config: HybridConfig {
                population_size: 8,
                generations: 5,
                ..HybridConfig::default()
            },
        };
        let (schedules, stats) = hybrid.run(RunInputs {
            search: &search,
            limits: &limits,
            prefs: &prefs,
            transcript: None,
            cancel: CancelToken::new(),
            progress: &progress,
            seed: 11,
        });

        assert_eq!(schedules.len(), 1);
        assert_eq!(stats.algorithm_name, "hybrid");
    }
}
