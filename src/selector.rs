//! Algorithm selection and benchmarking (spec.md §4.6/§4.7).
//!
//! `AlgorithmChoice::Auto` scores the prepared search against a small
//! problem-profile rubric and names a single algorithm; `CompareAll` races
//! every algorithm against the same problem with the teacher's worker-pool
//! idiom (`workerpool::parallel_map` generalized here to heterogeneous
//! tasks via `std::thread::scope`, since every racer returns a different
//! concrete `Scheduler` run rather than the same closure over different
//! data) and keeps the best result; `Benchmark` runs every algorithm the
//! same way but keeps every result instead of just the winner, for
//! reporting rather than dispatch.

use crate::algorithms::{
    a_star::AStar, bfs::Bfs, dfs::Dfs, genetic::Genetic, hill_climbing::HillClimbing,
    hybrid::Hybrid, iddfs::Iddfs, particle_swarm::ParticleSwarm,
    simulated_annealing::SimulatedAnnealing, tabu_search::TabuSearch,
};
use crate::builder::PreparedSearch;
use crate::model::Schedule;
use crate::scheduler::{AlgorithmMetadata, RunInputs, Scheduler};
use crate::stats::RunStats;

/// Which algorithm(s) a `generate` call should use (spec.md §4.6).
#[derive(Debug, Clone, Default)]
pub enum AlgorithmChoice {
    /// Run exactly the named algorithm. Unknown names are an `EngineError`
    /// at the call site (spec.md §6), not handled here.
    Named(String),
    /// Pick one algorithm automatically from the problem profile.
    #[default]
    Auto,
    /// Race every algorithm and keep the best-scoring result.
    CompareAll,
}

/// Every concrete scheduler, in the fixed order used for both `CompareAll`
/// and `Benchmark` (spec.md §4.7: "results are reported in a stable order").
pub fn all_schedulers() -> Vec<Box<dyn Scheduler>> {
    vec![
        Box::new(Dfs),
        Box::new(Bfs),
        Box::new(Iddfs),
        Box::new(AStar),
        Box::new(HillClimbing),
        Box::new(SimulatedAnnealing::default()),
        Box::new(TabuSearch::default()),
        Box::new(Genetic::default()),
        Box::new(ParticleSwarm::default()),
        Box::new(Hybrid::default()),
    ]
}

/// Resolve a name from `PREFERENCE_NAMES`-style external input (e.g. a CLI
/// flag or a config file) to a scheduler instance.
pub fn by_name(name: &str) -> Option<Box<dyn Scheduler>> {
    all_schedulers()
        .into_iter()
        .find(|s| s.metadata().name == name)
}

/// Cheap, non-search-running summary of a prepared problem, used by `Auto`
/// to pick a family without actually running anything.
#[derive(Debug, Clone, Copy)]
pub struct ProblemProfile {
    pub group_count: usize,
    /// Product of each group's option count, saturating at `u64::MAX` —
    /// an estimate of the full search-space size.
    pub estimated_space: u64,
    pub has_preferences: bool,
}

impl ProblemProfile {
    pub fn compute(search: &PreparedSearch, prefs: &crate::scorer::SchedulerPrefs) -> Self {
        let mut estimated_space: u64 = 1;
        for group in &search.groups {
            estimated_space = estimated_space.saturating_mul(group.options.len().max(1) as u64);
        }
        ProblemProfile {
            group_count: search.groups.len(),
            estimated_space,
            has_preferences: !prefs.is_trivial(),
        }
    }
}

/// Pick one algorithm name for `Auto` (spec.md §4.6's size-fit rubric):
/// small search spaces get an exact complete search (favoring A* when
/// preferences are in play, since its frontier order exploits them; plain
/// DFS otherwise), large search spaces fall back to population-based or
/// hybrid search since a complete search would not finish in the timeout.
pub fn auto_select(profile: &ProblemProfile) -> &'static str {
    const SMALL_SPACE: u64 = 50_000;
    const MEDIUM_SPACE: u64 = 5_000_000;

    if profile.estimated_space <= SMALL_SPACE {
        if profile.has_preferences {
            "a_star"
        } else {
            "dfs"
        }
    } else if profile.estimated_space <= MEDIUM_SPACE {
        if profile.has_preferences {
            "hybrid"
        } else {
            "hill_climbing"
        }
    } else {
        "genetic"
    }
}

/// Run every `schedulers` entry to completion against the same `inputs`,
/// concurrently. Each racer gets the same cancel token (so cancelling one
/// run cancels all of them) and its own progress sink, since `ProgressEvent`
/// carries an `algorithm_name` already and racers would otherwise trample
/// each other's ring buffer.
fn run_all(
    schedulers: &[Box<dyn Scheduler>],
    search: &PreparedSearch,
    limits: &crate::model::Limits,
    prefs: &crate::scorer::SchedulerPrefs,
    transcript: Option<&crate::model::TranscriptView>,
    cancel: crate::scheduler::CancelToken,
    seed: u64,
) -> Vec<(AlgorithmMetadata, Vec<Schedule>, RunStats)> {
    let sinks: Vec<crate::scheduler::ProgressSink> =
        schedulers.iter().map(|_| crate::scheduler::ProgressSink::default()).collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = schedulers
            .iter()
            .zip(sinks.iter())
            .enumerate()
            .map(|(i, (scheduler, sink))| {
                let cancel = cancel.clone();
                scope.spawn(move || {
                    let metadata = scheduler.metadata();
                    let (schedules, stats) = scheduler.run(RunInputs {
                        search,
                        limits,
                        prefs,
                        transcript,
                        cancel,
                        progress: sink,
                        seed: seed.wrapping_add(i as u64),
                    });
                    (metadata, schedules, stats)
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().expect("scheduler thread panicked")).collect()
    })
}

/// The winning race result: the best top-1 score among non-empty result
/// sets (spec.md §4.6); ties break on fewer nodes explored.
pub fn compare_all(
    search: &PreparedSearch,
    limits: &crate::model::Limits,
    prefs: &crate::scorer::SchedulerPrefs,
    transcript: Option<&crate::model::TranscriptView>,
    cancel: crate::scheduler::CancelToken,
    seed: u64,
) -> (Vec<Schedule>, RunStats) {
    let schedulers = all_schedulers();
    let results = run_all(&schedulers, search, limits, prefs, transcript, cancel, seed);

    let top_score = |schedules: &[Schedule]| -> f64 {
        schedules
            .first()
            .map(|s| crate::scorer::score(s, prefs, limits))
            .unwrap_or(f64::NEG_INFINITY)
    };

    results
        .into_iter()
        .filter(|(_, schedules, _)| !schedules.is_empty())
        .max_by(|(_, a_schedules, a_stats), (_, b_schedules, b_stats)| {
            top_score(a_schedules)
                .partial_cmp(&top_score(b_schedules))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b_stats.nodes_explored.cmp(&a_stats.nodes_explored))
        })
        .map(|(_, schedules, stats)| (schedules, stats))
        .unwrap_or_else(|| (Vec::new(), RunStats::new("compare_all")))
}

/// One algorithm's result in a `BenchmarkReport`.
#[derive(Debug, Clone)]
pub struct BenchmarkEntry {
    pub metadata: AlgorithmMetadata,
    pub stats: RunStats,
    pub schedule_count: usize,
    pub top_score: Option<f64>,
}

/// Every algorithm's result against the same problem, for comparative
/// reporting rather than dispatch (spec.md §4.7).
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub entries: Vec<BenchmarkEntry>,
}

pub fn run_benchmark(
    search: &PreparedSearch,
    limits: &crate::model::Limits,
    prefs: &crate::scorer::SchedulerPrefs,
    transcript: Option<&crate::model::TranscriptView>,
    cancel: crate::scheduler::CancelToken,
    seed: u64,
) -> BenchmarkReport {
    let schedulers = all_schedulers();
    let results = run_all(&schedulers, search, limits, prefs, transcript, cancel, seed);

    let entries = results
        .into_iter()
        .map(|(metadata, schedules, stats)| {
            let top_score = schedules.first().map(|s| crate::scorer::score(s, prefs, limits));
            BenchmarkEntry {
                metadata,
                stats,
                schedule_count: schedules.len(),
                top_score,
            }
        })
        .collect();

    BenchmarkReport { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_select_prefers_complete_search_for_small_spaces() {
        let profile = ProblemProfile {
            group_count: 3,
            estimated_space: 100,
            has_preferences: false,
        };
        assert_eq!(auto_select(&profile), "dfs");
    }

    #[test]
    fn auto_select_prefers_a_star_when_preferences_matter() {
        let profile = ProblemProfile {
            group_count: 3,
            estimated_space: 100,
            has_preferences: true,
        };
        assert_eq!(auto_select(&profile), "a_star");
    }

    #[test]
    fn auto_select_falls_back_to_genetic_for_huge_spaces() {
        let profile = ProblemProfile {
            group_count: 40,
            estimated_space: u64::MAX,
            has_preferences: true,
        };
        assert_eq!(auto_select(&profile), "genetic");
    }

    #[test]
    fn by_name_resolves_every_known_algorithm() {
        for name in [
            "dfs",
            "bfs",
            "iddfs",
            "a_star",
            "hill_climbing",
            "simulated_annealing",
            "tabu_search",
            "genetic",
            "particle_swarm",
            "hybrid",
        ] {
            assert!(by_name(name).is_some(), "missing scheduler: {}", name);
        }
        assert!(by_name("not_a_real_algorithm").is_none());
    }
}
