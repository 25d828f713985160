//! Error taxonomy for the planner core.
//!
//! Partitions failures by which call sites can observe them: missing/ambiguous
//! inputs are raised by a caller-supplied reader and merely need a common type
//! to report through; domain-invariant violations and constraint breaches are
//! raised by this crate itself during search and verification.

use thiserror::Error;

use crate::plan_variable::Variable;

/// The planner's public error type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlannerError {
    /// A required file or directory was absent. Raised by a caller-supplied
    /// reader; this crate never raises it itself since it performs no file I/O.
    #[error("required input missing: {0}")]
    InputMissing(String),

    /// Multiple candidate files existed where exactly one was expected.
    #[error("ambiguous input, picked first candidate: {0}")]
    InputAmbiguous(String),

    /// A propagation step collapsed a domain to a non-`IDL` singleton, which
    /// should never happen. The rollout continues; this is surfaced for
    /// logging, not treated as fatal.
    #[error("domain invariant violated for {variable}: {detail}")]
    DomainInvariantViolation { variable: Variable, detail: String },

    /// Storage or energy left its legal range, detected by the post-run
    /// verifier. Fatal: a plan that breaches this was never feasible.
    #[error("constraint breach for {satellite} at tick {tick}: {detail}")]
    ConstraintBreach {
        satellite: String,
        tick: i64,
        detail: String,
    },

    /// `Config` construction failed a cross-field invariant.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// The payload carried when a worker thread panics mid-rollout.
///
/// Not a `PlannerError` variant: a worker crash is isolated to that worker and
/// never propagates to the caller as a `Result` the caller must handle — the
/// pool catches it, logs it, and excludes that worker from the max-score
/// comparison (SPEC_FULL §7, §4.5). Carries a plain `String` rather than the
/// `Any` payload `std::thread::Result` gives back, since by the time the pool
/// wants to log it the original payload's type has already been discarded.
#[derive(Debug, Clone)]
pub struct WorkerCrash {
    pub worker_id: usize,
    pub message: String,
}

impl std::fmt::Display for WorkerCrash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "worker {} crashed: {}", self.worker_id, self.message)
    }
}

impl std::error::Error for WorkerCrash {}
