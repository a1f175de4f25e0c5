//! Tabu search (spec.md §4.5.2): hill-climbing augmented with a short-term
//! memory of recently visited chromosomes, so the search can step onto a
//! non-improving neighbor to escape a plateau without immediately stepping
//! back onto the chromosome it just left.

use crate::algorithms::{
    chromosome_is_feasible, chromosome_score, chromosome_to_sections, neighbors,
    random_chromosome, seeded_rng, Chromosome,
};
use crate::scheduler::{
    finalize, AlgorithmCategory, AlgorithmMetadata, ProgressEvent, RunDeadline, RunInputs,
    Scheduler,
};
use crate::stats::RunStats;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
pub struct TabuConfig {
    pub tenure: usize,
    pub steps_per_run: u32,
}

impl Default for TabuConfig {
    fn default() -> Self {
        TabuConfig {
            tenure: 20,
            steps_per_run: 2000,
        }
    }
}

#[derive(Debug, Default)]
pub struct TabuSearch {
    pub config: TabuConfig,
}

impl Scheduler for TabuSearch {
    fn metadata(&self) -> AlgorithmMetadata {
        AlgorithmMetadata {
            name: "tabu_search",
            category: AlgorithmCategory::LocalSearch,
            is_optimal: false,
            supports_preferences: true,
            complexity_hint: "polynomial per run, tenure-bounded memory avoids short cycles",
            good_for: "preference landscapes with plateaus where plain hill-climbing stalls",
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
            let mut best_seen = current.clone();
            let mut best_seen_score = current_score;

            let mut tabu: VecDeque<Chromosome> = VecDeque::new();
            tabu.push_back(current.clone());

            for step in 0..self.config.steps_per_run {
                if deadline.should_stop() {
                    break;
                }
                let options = neighbors(&current, search);
                if options.is_empty() {
                    break;
                }

                let mut best_move: Option<(Chromosome, f64)> = None;
                for (_, candidate) in &options {
                    nodes_explored += 1;
                    if tabu.contains(candidate) {
                        continue;
                    }
                    let candidate_score = chromosome_score(
                        candidate,
                        search,
                        inputs.limits,
                        inputs.prefs,
                        inputs.transcript,
                    );
                    if best_move.as_ref().map(|(_, s)| candidate_score > *s).unwrap_or(true) {
                        best_move = Some((candidate.clone(), candidate_score));
                    }
                }

                let (next, next_score) = match best_move {
                    Some(m) => m,
                    None => break,
                };

                current = next;
                current_score = next_score;
                if current_score > best_seen_score {
                    best_seen = current.clone();
                    best_seen_score = current_score;
                }

                tabu.push_back(current.clone());
                while tabu.len() > self.config.tenure {
                    tabu.pop_front();
                }

                if step % 64 == 0 {
                    inputs.progress.emit(ProgressEvent {
                        algorithm_name: "tabu_search".to_owned(),
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

        let mut stats = RunStats::new("tabu_search");
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
    fn tabu_search_finds_a_trivial_feasible_schedule() {
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

        let (schedules, stats) = TabuSearch::default().run(RunInputs {
            search: &search,
            limits: &limits,
            prefs: &prefs,
            transcript: None,
            cancel: CancelToken::new(),
            progress: &progress,
            seed: 3,
        });

        assert_eq!(schedules.len(), 1);
        assert_eq!(stats.algorithm_name, "tabu_search");
    }
}
