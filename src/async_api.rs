//! Async wrapper around the synchronous engine (spec.md §5's optional async
//! surface, feature-gated behind `async`).
//!
//! The core engine is CPU-bound and holds no I/O, so there is nothing for an
//! async runtime to do except keep the executor's thread free while a run is
//! in flight; `tokio::task::spawn_blocking` is the idiomatic way to do that,
//! grounded on `iqrahapp-iqrah-mobile`'s use of `tokio` for exactly this kind
//! of "call blocking work from an async context" boundary (the teacher crate
//! itself has no async precedent).

use crate::error::EngineError;
use crate::model::{Limits, Schedule, TranscriptView};
use crate::scheduler::{CancelToken, ProgressSink};
use crate::scorer::SchedulerPrefs;
use crate::selector::AlgorithmChoice;
use crate::stats::RunStats;
use std::collections::HashMap;
use std::sync::Arc;

/// `generate`'s result, see `crate::ScheduleList`.
pub type GenerateResult = Result<crate::ScheduleList, EngineError>;

/// Async counterpart to `crate::generate`: runs the same synchronous
/// pipeline on a blocking-pool thread and awaits its completion, so callers
/// on a tokio runtime never block their executor on a potentially
/// multi-minute search.
///
/// `cancel` is still the caller's cooperative cancellation handle: since it
/// is an `Arc`-backed flag, cancelling it from the async side stops the
/// blocking-pool run exactly as it would a synchronous one.
pub async fn generate_async(
    catalog: Vec<crate::model::Course>,
    selection: HashMap<String, crate::model::SelectionPolicy>,
    prefs: SchedulerPrefs,
    limits: Limits,
    transcript: Option<TranscriptView>,
    algorithm: AlgorithmChoice,
    cancel: CancelToken,
    progress: Arc<ProgressSink>,
) -> GenerateResult {
    tokio::task::spawn_blocking(move || {
        crate::generate(
            catalog,
            selection,
            prefs,
            limits,
            transcript,
            algorithm,
            cancel,
            progress.as_ref(),
        )
    })
    .await
    .unwrap_or_else(|_| {
        Err(EngineError::Internal(
            "generate_async worker thread panicked".to_owned(),
        ))
    })
}

#[allow(dead_code)]
fn assert_stats_is_send(_: &RunStats) {}
#[allow(dead_code)]
fn assert_schedule_is_send(_: &Schedule) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseType, Day, SelectionPolicy, TimeSlot};

    #[tokio::test]
    async fn generate_async_finds_a_trivial_feasible_schedule() {
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
        let progress = Arc::new(ProgressSink::default());

        let result = generate_async(
            catalog,
            selection,
            SchedulerPrefs::default(),
            Limits::default(),
            None,
            AlgorithmChoice::Named("dfs".to_owned()),
            CancelToken::new(),
            progress,
        )
        .await;

        let list = result.unwrap();
        assert_eq!(list.schedules.len(), 1);
    }
}
