//! Error and infeasibility taxonomies (spec.md §7).
//!
//! The teacher crate hand-writes `Display` impls rather than pulling in an
//! error-derive crate (see `caobab::solution_score::QualityInfo`); this
//! module follows the same idiom instead of introducing `thiserror`.

use std::fmt;

/// Input errors and internal invariant violations. Always surfaced as `Err`
/// before any search work happens (spec.md §7 "input errors reject before
/// search").
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The catalog contained the same section `code` more than once.
    DuplicateCourseCode(String),
    /// A course section had an empty slot list.
    EmptySlotsForCourse(String),
    /// `Limits` failed validation; the string names the offending field and
    /// the value that was out of range.
    InvalidLimits(String),
    /// A preference weight referred to an option name the scorer does not
    /// recognize.
    UnknownPreferenceName(String),
    /// A preference weight was negative.
    NegativePreferenceWeight(String),
    /// Prerequisite graph over main codes contains a cycle.
    PrerequisiteCycle(Vec<String>),
    /// `AlgorithmChoice::Named` referred to an algorithm that does not exist.
    UnknownAlgorithmName(String),
    /// Should not occur; a bug signal rather than a user-facing condition.
    Internal(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::DuplicateCourseCode(code) => {
                write!(f, "duplicate course code in catalog: {}", code)
            }
            EngineError::EmptySlotsForCourse(code) => {
                write!(f, "course {} has no time slots", code)
            }
            EngineError::InvalidLimits(msg) => write!(f, "invalid limits: {}", msg),
            EngineError::UnknownPreferenceName(name) => {
                write!(f, "unknown preference option name: {}", name)
            }
            EngineError::NegativePreferenceWeight(name) => {
                write!(f, "preference weight for {} must be non-negative", name)
            }
            EngineError::PrerequisiteCycle(codes) => {
                write!(f, "prerequisite cycle detected among: {}", codes.join(" -> "))
            }
            EngineError::UnknownAlgorithmName(name) => {
                write!(f, "unknown algorithm name: {}", name)
            }
            EngineError::Internal(tag) => write!(f, "internal invariant violation: {}", tag),
        }
    }
}

impl std::error::Error for EngineError {}

/// Why no schedule (or a smaller set than requested) could be produced.
/// Not an error — always carried inside an `Ok` result (spec.md §7).
#[derive(Debug, Clone, PartialEq)]
pub enum InfeasibilityReason {
    EctsCapExceeded,
    ConflictBudgetExceeded,
    PrerequisiteUnmet(String),
    DuplicateGroup(String),
    MandatoryMissing(String),
    EctsCapUnreachable,
    OptionProductEmpty,
}

impl fmt::Display for InfeasibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfeasibilityReason::EctsCapExceeded => write!(f, "ECTS cap exceeded"),
            InfeasibilityReason::ConflictBudgetExceeded => write!(f, "conflict budget exceeded"),
            InfeasibilityReason::PrerequisiteUnmet(code) => {
                write!(f, "prerequisite unmet: {}", code)
            }
            InfeasibilityReason::DuplicateGroup(code) => {
                write!(f, "duplicate group in schedule: {}", code)
            }
            InfeasibilityReason::MandatoryMissing(code) => {
                write!(f, "mandatory group missing from schedule: {}", code)
            }
            InfeasibilityReason::EctsCapUnreachable => {
                write!(f, "no feasible combination fits under the ECTS cap")
            }
            InfeasibilityReason::OptionProductEmpty => {
                write!(f, "no option combinations available to search")
            }
        }
    }
}
