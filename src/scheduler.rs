//! The uniform scheduler contract (spec.md §4.5): metadata, the `run`
//! template, cancellation/progress primitives, and the shared finalizer.
//!
//! Grounded on the teacher's `bab.rs`: there, every Branch-and-Bound node
//! solver shares one generic `solve()` template and one `Statistics`
//! accumulator. Here every algorithm shares one `finalize()` template and one
//! `RunStats` accumulator instead of re-validating/sorting/deduping by hand.

use crate::error::InfeasibilityReason;
use crate::model::{Limits, Schedule, TranscriptView};
use crate::scorer::{score, SchedulerPrefs};
use crate::{builder::PreparedSearch, evaluator};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Cooperative cancellation handle. Cloning shares the same underlying flag
/// (`Arc`), matching how the teacher shares its `Arc<BranchAndBound<..>>`
/// shared state across worker threads.
#[derive(Debug, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks the deadline derived from `Limits::timeout` plus the cancel token,
/// so every scheduler checks both with one call (spec.md §5's suspension
/// points).
pub struct RunDeadline {
    start: Instant,
    timeout: Duration,
    cancel: CancelToken,
}

impl RunDeadline {
    pub fn new(timeout: Duration, cancel: CancelToken) -> Self {
        RunDeadline {
            start: Instant::now(),
            timeout,
            cancel,
        }
    }

    pub fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || self.start.elapsed() >= self.timeout
    }

    pub fn termination(&self) -> crate::stats::Termination {
        if self.cancel.is_cancelled() {
            crate::stats::Termination::Cancelled
        } else if self.start.elapsed() >= self.timeout {
            crate::stats::Termination::TimedOut
        } else {
            crate::stats::Termination::Completed
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// One progress update, emitted at bounded intervals by a running scheduler.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProgressEvent {
    pub algorithm_name: String,
    pub nodes_explored: u64,
    pub branches_pruned: u64,
    pub current_best_score: f64,
    pub elapsed_ms: u64,
}

/// A bounded, drop-oldest progress channel (spec.md §5: "if the consumer
/// does not drain, oldest events are dropped"). Implemented as a
/// mutex-guarded ring buffer rather than a channel, since we need
/// drop-oldest-on-overflow semantics a `mpsc::SyncSender` doesn't give us.
pub struct ProgressSink {
    capacity: usize,
    buffer: Mutex<VecDeque<ProgressEvent>>,
}

impl ProgressSink {
    pub fn new(capacity: usize) -> Self {
        ProgressSink {
            capacity: capacity.max(1),
            buffer: Mutex::new(VecDeque::new()),
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        let mut buffer = self.buffer.lock().unwrap();
        if buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(event);
    }

    pub fn drain(&self) -> Vec<ProgressEvent> {
        let mut buffer = self.buffer.lock().unwrap();
        buffer.drain(..).collect()
    }
}

impl Default for ProgressSink {
    fn default() -> Self {
        ProgressSink::new(64)
    }
}

/// Broad algorithm family, used by the selector's size-fit rubric
/// (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum AlgorithmCategory {
    CompleteSearch,
    LocalSearch,
    PopulationBased,
    Hybrid,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AlgorithmMetadata {
    pub name: &'static str,
    pub category: AlgorithmCategory,
    pub is_optimal: bool,
    pub supports_preferences: bool,
    pub complexity_hint: &'static str,
    pub good_for: &'static str,
}

/// Everything a scheduler's `run` needs that is not the search tree itself:
/// the prepared problem, limits/prefs, the optional transcript (used only to
/// re-check prerequisites at the finalizer, since the builder already
/// filtered sections), and the cancel/progress/seed plumbing.
pub struct RunInputs<'a> {
    pub search: &'a PreparedSearch,
    pub limits: &'a Limits,
    pub prefs: &'a SchedulerPrefs,
    pub transcript: Option<&'a TranscriptView>,
    pub cancel: CancelToken,
    pub progress: &'a ProgressSink,
    pub seed: u64,
}

/// Every scheduling algorithm implements this contract (spec.md §4.5).
pub trait Scheduler: Send + Sync {
    fn metadata(&self) -> AlgorithmMetadata;
    fn run(&self, inputs: RunInputs<'_>) -> (Vec<Schedule>, crate::stats::RunStats);
}

/// Build a `Schedule` from section indices into `search.catalog`, ordered by
/// the catalog's own order (stable, not re-sorted) so `code_tuple()` is the
/// only place ordering for display/tie-breaking happens.
pub fn schedule_from_indices(indices: &[usize], search: &PreparedSearch) -> Schedule {
    let courses = indices.iter().map(|&i| search.catalog[i].clone()).collect();
    Schedule::new(courses)
}

/// Shared result template (spec.md §4.5): validate each candidate with
/// `is_feasible_final`, score it, dedupe by course-code tuple, sort per
/// spec.md §3.2(6), and truncate to `max_results`.
///
/// Every algorithm's `run` should funnel its raw candidates (as index lists)
/// through this before returning, the way the teacher's Branch-and-Bound
/// `solve()` is always followed by score/quality reporting in `main.rs`.
pub fn finalize(
    candidates: Vec<Vec<usize>>,
    search: &PreparedSearch,
    limits: &Limits,
    prefs: &SchedulerPrefs,
    transcript: Option<&TranscriptView>,
) -> Vec<Schedule> {
    let mandatory = search.mandatory_main_codes();
    let mut seen_code_tuples: std::collections::HashSet<Vec<String>> = std::collections::HashSet::new();
    let mut results: Vec<(Schedule, f64)> = Vec::new();

    for indices in candidates {
        let schedule = schedule_from_indices(&indices, search);
        if is_final_feasible(&schedule, limits, &mandatory, transcript).is_err() {
            continue;
        }
        let tuple: Vec<String> = schedule.code_tuple().into_iter().map(String::from).collect();
        if !seen_code_tuples.insert(tuple) {
            continue;
        }
        let total = score(&schedule, prefs, limits);
        results.push((schedule, total));
    }

    results.sort_by(|(a, a_score), (b, b_score)| {
        b_score
            .partial_cmp(a_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.conflict_count.cmp(&b.conflict_count))
            .then_with(|| a.total_ects.cmp(&b.total_ects))
            .then_with(|| a.code_tuple().cmp(&b.code_tuple()))
    });

    results
        .into_iter()
        .take(limits.max_results as usize)
        .map(|(schedule, _)| schedule)
        .collect()
}

fn is_final_feasible(
    schedule: &Schedule,
    limits: &Limits,
    mandatory: &[String],
    transcript: Option<&TranscriptView>,
) -> Result<(), InfeasibilityReason> {
    evaluator::is_feasible_final(&schedule.courses, limits, mandatory, transcript)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_starts_uncancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_token_clone_shares_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn progress_sink_drops_oldest_when_full() {
        let sink = ProgressSink::new(2);
        for i in 0..5 {
            sink.emit(ProgressEvent {
                algorithm_name: "test".to_owned(),
                nodes_explored: i,
                branches_pruned: 0,
                current_best_score: 0.0,
                elapsed_ms: 0,
            });
        }
        let drained = sink.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].nodes_explored, 3);
        assert_eq!(drained[1].nodes_explored, 4);
    }

    #[test]
    fn deadline_reports_timed_out_after_elapsed_timeout() {
        let deadline = RunDeadline::new(Duration::from_millis(0), CancelToken::new());
        std::thread::sleep(Duration::from_millis(5));
        assert!(deadline.should_stop());
        assert_eq!(deadline.termination(), crate::stats::Termination::TimedOut);
    }
}
