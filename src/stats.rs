//! Performance/tracking (spec.md §2, §5): nodes explored, branches pruned,
//! wall-clock time, and how a run ended.
//!
//! Grounded on the teacher's `bab::Statistics`: a plain counter struct with
//! a hand-written `Display` impl, accumulated during the run and returned
//! alongside the result.

use std::fmt;
use std::time::Duration;

/// How a `run` ended. `TimeExhausted`/`Cancelled` are not errors — spec.md
/// §7's propagation policy always returns whatever is valid so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Termination {
    Completed,
    TimedOut,
    Cancelled,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunStats {
    pub algorithm_name: String,
    pub nodes_explored: u64,
    pub branches_pruned: u64,
    pub wall_clock: Duration,
    pub termination: Termination,
}

impl RunStats {
    pub fn new(algorithm_name: impl Into<String>) -> Self {
        RunStats {
            algorithm_name: algorithm_name.into(),
            nodes_explored: 0,
            branches_pruned: 0,
            wall_clock: Duration::ZERO,
            termination: Termination::Completed,
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} nodes explored, {} branches pruned, {:.3}s, termination={:?}",
            self.algorithm_name,
            self.nodes_explored,
            self.branches_pruned,
            self.wall_clock.as_secs_f64(),
            self.termination
        )
    }
}
