//! Scheduling engine: generates feasible weekly course schedules from a
//! section catalog under hard constraints, ranked by a weighted preference
//! score (spec.md §1).
//!
//! [`generate`] is the single public entry point. Everything else in this
//! crate exists to support it: the data model, the conflict evaluator, the
//! search-space builder, the ten concrete scheduling algorithms and the
//! selector that picks or races between them.

pub mod algorithms;
pub mod async_api;
pub mod builder;
pub mod error;
pub mod evaluator;
pub mod filter;
pub mod model;
pub mod scheduler;
pub mod scorer;
pub mod selector;
pub mod stats;
pub mod util;
pub mod workerpool;

use error::{EngineError, InfeasibilityReason};
use model::{Course, Limits, Schedule, SelectionPolicy, TranscriptView};
use scheduler::{CancelToken, ProgressSink, RunInputs};
use scorer::SchedulerPrefs;
use selector::AlgorithmChoice;
use stats::{RunStats, Termination};
use std::collections::{HashMap, HashSet};

/// Result of a [`generate`] call: the ranked schedules found (possibly
/// fewer than `limits.max_results`, possibly empty), why none were found if
/// the problem turned out to be structurally infeasible before any search
/// ran, and the winning algorithm's run statistics.
#[derive(Debug, Clone)]
pub struct ScheduleList {
    pub schedules: Vec<Schedule>,
    /// Set when the search space itself was empty before any search ran (a
    /// mandatory group had no viable section, or no combination of groups
    /// existed at all), or when a completed search found nothing for a
    /// reason that can be named structurally (e.g. the ECTS cap is
    /// unreachable even by the cheapest mandatory pick). Left `None` when a
    /// search simply found nothing within its time budget for no nameable
    /// reason.
    pub infeasibility: Option<InfeasibilityReason>,
    /// Absent only in the structurally-infeasible case, where no scheduler
    /// ever ran.
    pub stats: Option<RunStats>,
}

fn validate_catalog(catalog: &[Course]) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    for course in catalog {
        if !seen.insert(course.code.as_str()) {
            return Err(EngineError::DuplicateCourseCode(course.code.clone()));
        }
        if course.slots.is_empty() {
            return Err(EngineError::EmptySlotsForCourse(course.code.clone()));
        }
    }
    Ok(())
}

/// Generate up to `limits.max_results` feasible weekly schedules from
/// `catalog`, honoring `selection`'s per-course-group policy, `prefs`'
/// preference weighting, and `transcript`'s prerequisite/GPA-based
/// filtering, using whichever algorithm `algorithm` names (spec.md §6).
///
/// Input errors (duplicate course codes, empty slot lists, out-of-range
/// limits, an unknown algorithm name, a prerequisite cycle in the catalog)
/// are rejected before any search work happens. Everything else — no
/// feasible schedule exists, the search timed out, the caller cancelled —
/// is reported inside a successful [`ScheduleList`], never as an `Err`
/// (spec.md §7).
pub fn generate(
    catalog: Vec<Course>,
    selection: HashMap<String, SelectionPolicy>,
    prefs: SchedulerPrefs,
    limits: Limits,
    transcript: Option<TranscriptView>,
    algorithm: AlgorithmChoice,
    cancel: CancelToken,
    progress: &ProgressSink,
) -> Result<ScheduleList, EngineError> {
    validate_catalog(&catalog)?;
    let limits = limits.validated()?;
    filter::detect_prerequisite_cycle(&catalog)?;

    // `Named` is resolved up front so an unknown name is rejected before any
    // filtering/building work happens (spec.md §7); `Auto` and `CompareAll`
    // need the prepared search space (to profile it, or to race every
    // scheduler against it) so they are resolved further down instead.
    if let AlgorithmChoice::Named(name) = &algorithm {
        if selector::by_name(name).is_none() {
            return Err(EngineError::UnknownAlgorithmName(name.clone()));
        }
    }

    let original_main_codes = builder::main_codes(&catalog);
    let (filtered_catalog, limits) = filter::apply_smart_filter(catalog, transcript.as_ref(), true, limits);

    let search = match builder::build(filtered_catalog, &original_main_codes, &selection) {
        Ok(search) => search,
        Err(reason) => {
            return Ok(ScheduleList {
                schedules: Vec::new(),
                infeasibility: Some(reason),
                stats: None,
            })
        }
    };

    let seed = 0;
    let (schedules, stats) = match &algorithm {
        AlgorithmChoice::Named(name) => {
            let scheduler = selector::by_name(name)
                .ok_or_else(|| EngineError::UnknownAlgorithmName(name.clone()))?;
            scheduler.run(RunInputs {
                search: &search,
                limits: &limits,
                prefs: &prefs,
                transcript: transcript.as_ref(),
                cancel,
                progress,
                seed,
            })
        }
        AlgorithmChoice::Auto => {
            let profile = selector::ProblemProfile::compute(&search, &prefs);
            let name = selector::auto_select(&profile);
            let scheduler = selector::by_name(name)
                .ok_or_else(|| EngineError::Internal(format!("auto_select picked unknown algorithm: {}", name)))?;
            scheduler.run(RunInputs {
                search: &search,
                limits: &limits,
                prefs: &prefs,
                transcript: transcript.as_ref(),
                cancel,
                progress,
                seed,
            })
        }
        AlgorithmChoice::CompareAll => selector::compare_all(
            &search,
            &limits,
            &prefs,
            transcript.as_ref(),
            cancel,
            seed,
        ),
    };

    // A completed search that found nothing is usually just "no feasible
    // combination under this timeout" and carries no structured reason; but
    // if the cheapest possible pick of every mandatory group already
    // exceeds the ECTS cap, no search could ever have found one, and that
    // is worth naming explicitly (spec.md §7/§8).
    let infeasibility = if schedules.is_empty() && stats.termination == Termination::Completed {
        match limits.max_ects {
            Some(cap) if search.minimum_mandatory_ects() > cap => {
                Some(InfeasibilityReason::EctsCapUnreachable)
            }
            _ => None,
        }
    } else {
        None
    };

    Ok(ScheduleList {
        schedules,
        infeasibility,
        stats: Some(stats),
    })
}
