//! Simulated annealing (spec.md §4.5.2): like hill-climbing, but worse moves
//! are accepted with probability `exp(delta / temperature)`, and temperature
//! decays geometrically each step so the search cools from exploratory to
//! greedy.

use crate::algorithms::{
    chromosome_is_feasible, chromosome_score, chromosome_to_sections, neighbors,
    random_chromosome, seeded_rng, Chromosome,
};
use crate::scheduler::{
    finalize, AlgorithmCategory, AlgorithmMetadata, ProgressEvent, RunDeadline, RunInputs,
    Scheduler,
};
use crate::stats::RunStats;
use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub struct AnnealingSchedule {
    pub initial_temperature: f64,
    pub cooling_rate: f64,
    pub steps_per_run: u32,
}

impl Default for AnnealingSchedule {
    fn default() -> Self {
        AnnealingSchedule {
            initial_temperature: 1.0,
            cooling_rate: 0.995,
            steps_per_run: 2000,
        }
    }
}

#[derive(Debug, Default)]
pub struct SimulatedAnnealing {
    pub schedule: AnnealingSchedule,
}

impl Scheduler for SimulatedAnnealing {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            name: "simulated_annealing",
            category: AlgorithmCategory::LocalSearch,
            is_optimal: false,
            supports_preferences: true,
            complexity_hint: "polynomial per run, escapes local optima more often than plain hill-climbing",
            good_for: "large catalogs with a rugged preference landscape and many local optima",
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

        let mut run_index = 0u32;
        const MAX_RUNS: u32 = 50;

        while candidates.len() < max_results && run_index < MAX_RUNS && !deadline.should_stop() {
            let mut current = random_chromosome(search, &mut rng);
            let mut current_score = chromosome_score(
                &current,
                search,
                inputs.limits,
                inputs.prefs,
                inputs.transcript,
            );
            let mut temperature = self.schedule.initial_temperature;
            let mut best_seen = current.clone();
            let mut best_seen_score = current_score;

            for step in 0..self.schedule.steps_per_run {
                if deadline.should_stop() {
                    break;
                }
                let options = neighbors(&current, search);
                if options.is_empty() {
                    break;
                }
                let (_, candidate) = &options[rng.gen_range(0..options.len())];
                nodes_explored += 1;
                let candidate_score = chromosome_score(
                    candidate,
                    search,
                    inputs.limits,
                    inputs.prefs,
                    inputs.transcript,
                );

                let delta = candidate_score - current_score;
                let accept = if delta > 0.0 {
                    true
                } else if candidate_score.is_finite() && current_score.is_finite() {
                    let threshold = (delta / temperature.max(1e-9)).exp();
                    rng.gen::<f64>() < threshold
                } else {
                    false
                };

                if accept {
                    current = candidate.clone();
                    current_score = candidate_score;
                    if current_score > best_seen_score {
                        best_seen = current.clone();
                        best_seen_score = current_score;
                    }
                }

                temperature *= self.schedule.cooling_rate;

                if step % 64 == 0 {
                    inputs.progress.emit(ProgressEvent {
                        algorithm_name: "simulated_annealing".to_owned(),
                        nodes_explored,
                        branches_pruned: 0,
                        current_best_score: best_seen_score.max(0.0),
                        elapsed_ms: deadline.elapsed().as_millis() as u64,
                    });
                }
            }

            if chromosome_is_feasible(&best_seen, search, inputs.limits, inputs.transcript)
                && seen_chromosomes.insert(best_seen.clone())
            {
                candidates.push(chromosome_to_sections(&best_seen, search));
            }
            run_index += 1;
        }

        let mut stats = RunStats::new("simulated_annealing");
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
    use crate::scorer::SchedulerPrefs;
    use std::collections::HashMap;

    #[test]
    fn simulated_annealing_finds_a_trivial_feasible_schedule() {
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

        let (schedules, stats) = SimulatedAnnealing::default().run(RunInputs {
            search: &search,
            limits: &limits,
            prefs: &prefs,
            transcript: None,
            cancel: CancelToken::new(),
            progress: &progress,
            seed: 7,
        });

        assert_eq!(schedules.len(), 1);
        assert_eq!(stats.algorithm_name, "simulated_annealing");
    }
}
