//! Particle swarm optimization (spec.md §4.5.3), adapted to the discrete
//! chromosome representation: each particle is a chromosome plus a
//! per-gene "velocity" expressed as a probability of copying that gene from
//! its personal best or the swarm's global best, following the common
//! discrete-PSO adaptation (continuous velocity has no natural meaning over
//! option indices).
//!
//! Fitness evaluation is parallelized the same way as `genetic.rs`.

use crate::algorithms::{
    chromosome_is_feasible, chromosome_score, chromosome_to_sections, random_chromosome,
    seeded_rng, Chromosome,
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
pub struct ParticleSwarmConfig {
    pub swarm_size: usize,
    pub iterations: u32,
    /// Probability a gene is pulled toward the particle's own best.
    pub personal_pull: f64,
    /// Probability a gene is pulled toward the swarm's global best.
    pub global_pull: f64,
}

impl Default for ParticleSwarmConfig {
    fn default() -> Self {
        ParticleSwarmConfig {
            swarm_size: 40,
            iterations: 150,
            personal_pull: 0.3,
            global_pull: 0.4,
        }
    }
}

#[derive(Debug, Default)]
pub struct ParticleSwarm {
    pub config: ParticleSwarmConfig,
}

struct Particle {
    position: Chromosome,
    personal_best: Chromosome,
    personal_best_score: f64,
}

fn evaluate(
    positions: &[Chromosome],
    search: &PreparedSearch,
    limits: &Limits,
    prefs: &SchedulerPrefs,
    transcript: Option<&TranscriptView>,
) -> Vec<f64> {
    let items: Vec<Chromosome> = positions.to_vec();
    parallel_map(items, default_num_threads(), |chromosome| {
        chromosome_score(chromosome, search, limits, prefs, transcript)
    })
}

/// Move `position` one step toward `personal_best` and `global_best`: each
/// gene independently has a chance to be pulled toward one of them, or
/// otherwise stays put (no "momentum" term, since there is no continuous
/// velocity to carry over between discrete option indices).
fn step(
    position: &Chromosome,
    personal_best: &Chromosome,
    global_best: &Chromosome,
    config: &ParticleSwarmConfig,
    rng: &mut impl Rng,
) -> Chromosome {
    position
        .iter()
        .enumerate()
        .map(|(i, &gene)| {
            let roll: f64 = rng.gen();
            if roll < config.personal_pull {
                personal_best[i]
            } else if roll < config.personal_pull + config.global_pull {
                global_best[i]
            } else {
                gene
            }
        })
        .collect()
}

impl Scheduler for ParticleSwarm {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            name: "particle_swarm",
            category: AlgorithmCategory::PopulationBased,
            is_optimal: false,
            supports_preferences: true,
            complexity_hint: "swarm_size * iterations evaluations, parallel fitness pass",
            good_for: "preference landscapes that reward converging quickly on one good region",
        }
    }

    fn run(&self, inputs: RunInputs<'_>) -> (Vec<crate::model::Schedule>, RunStats) {
        let deadline = RunDeadline::new(inputs.limits.timeout, inputs.cancel.clone());
        let search = inputs.search;
        let mut rng = seeded_rng(inputs.seed);
        let max_results = inputs.limits.max_results as usize;

        let initial_positions: Vec<Chromosome> = (0..self.config.swarm_size)
            .map(|_| random_chromosome(search, &mut rng))
            .collect();
        let initial_scores = evaluate(
            &initial_positions,
            search,
            inputs.limits,
            inputs.prefs,
            inputs.transcript,
        );

        let mut particles: Vec<Particle> = initial_positions
            .into_iter()
            .zip(initial_scores)
            .map(|(position, score)| Particle {
                personal_best: position.clone(),
                personal_best_score: score,
                position,
            })
            .collect();

        let global_best_idx = (0..particles.len())
            .max_by(|&a, &b| {
                particles[a]
                    .personal_best_score
                    .partial_cmp(&particles[b].personal_best_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(0);
        let mut global_best = particles[global_best_idx].personal_best.clone();
        let mut global_best_score = particles[global_best_idx].personal_best_score;

        let mut nodes_explored: u64 = 0;
        let mut iteration = 0u32;

        while iteration < self.config.iterations && !deadline.should_stop() {
            let next_positions: Vec<Chromosome> = particles
                .iter()
                .map(|p| step(&p.position, &p.personal_best, &global_best, &self.config, &mut rng))
                .collect();
            let scores = evaluate(
                &next_positions,
                search,
                inputs.limits,
                inputs.prefs,
                inputs.transcript,
            );
            nodes_explored += particles.len() as u64;

            for (particle, (position, score)) in particles.iter_mut().zip(next_positions.into_iter().zip(scores)) {
                particle.position = position;
                if score > particle.personal_best_score {
                    particle.personal_best = particle.position.clone();
                    particle.personal_best_score = score;
                }
                if score > global_best_score {
                    global_best = particle.position.clone();
                    global_best_score = score;
                }
            }

            iteration += 1;
            if iteration % 8 == 0 {
                inputs.progress.emit(ProgressEvent {
                    algorithm_name: "particle_swarm".to_owned(),
                    nodes_explored,
                    branches_pruned: 0,
                    current_best_score: global_best_score.max(0.0),
                    elapsed_ms: deadline.elapsed().as_millis() as u64,
                });
            }
        }

        let mut candidates: Vec<Vec<usize>> = Vec::new();
        let mut seen_chromosomes: std::collections::HashSet<Chromosome> =
            std::collections::HashSet::new();

        let mut ranked: Vec<&Particle> = particles.iter().collect();
        ranked.sort_by(|a, b| {
            b.personal_best_score
                .partial_cmp(&a.personal_best_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for particle in ranked {
            if candidates.len() >= max_results {
                break;
            }
            if chromosome_is_feasible(&particle.personal_best, search, inputs.limits, inputs.transcript)
                && seen_chromosomes.insert(particle.personal_best.clone())
            {
                candidates.push(chromosome_to_sections(&particle.personal_best, search));
            }
        }
        if candidates.len() < max_results
            && chromosome_is_feasible(&global_best, search, inputs.limits, inputs.transcript)
            && seen_chromosomes.insert(global_best.clone())
        {
            candidates.push(chromosome_to_sections(&global_best, search));
        }

        let mut stats = RunStats::new("particle_swarm");
        stats.nodes_explored = nodes_explored;
        stats.branches_pruned = 0;
        stats.wall_clock = deadline.elapsed();
        stats.termination = deadline.termination();

        let schedules = finalize(candidates, search, inputs.limits, inputs.prefs, inputs.transcript);
        (schedules, stats)
    }
}
