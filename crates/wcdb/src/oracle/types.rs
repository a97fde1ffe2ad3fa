//! Oracle interface: targets, classified solver errors, and the solve trait.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::forest::Forest;
use crate::network::Network;

/// What a single solve computes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Delay bound of one flow of interest.
    Flow(usize),
    /// Delay bounds of every flow, in flow order, from one solve.
    AllFlows,
}

impl Target {
    /// Number of delay values a successful solve returns.
    pub fn arity(self, net: &Network) -> usize {
        match self {
            Target::Flow(_) => 1,
            Target::AllFlows => net.num_flows(),
        }
    }
}

/// Classified solver failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveErrorKind {
    /// Constraints could not be satisfied to the solver's accuracy.
    AccuracyError,
    /// The solver hit its time limit before finishing.
    TimeoutError,
    InfeasibleProblem,
    UnboundedProblem,
    /// The solver itself failed (or could not be run).
    SolverFailure,
    /// A feasible but not optimal solution was reached within the time limit.
    SuboptimalWithinTimeout,
    /// Output matched no known pattern and is not a valid result either.
    Unclassified,
}

/// What the retry adapter does after a failure of a given kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recovery {
    /// Retry with the next scale factor.
    Rescale,
    /// Retry with a larger timeout.
    GrowTimeout,
    /// Not retryable.
    GiveUp,
}

impl SolveErrorKind {
    pub fn recovery(self) -> Recovery {
        match self {
            SolveErrorKind::AccuracyError
            | SolveErrorKind::TimeoutError
            | SolveErrorKind::SolverFailure => Recovery::Rescale,
            SolveErrorKind::SuboptimalWithinTimeout => Recovery::GrowTimeout,
            SolveErrorKind::InfeasibleProblem
            | SolveErrorKind::UnboundedProblem
            | SolveErrorKind::Unclassified => Recovery::GiveUp,
        }
    }
}

impl fmt::Display for SolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveErrorKind::AccuracyError => "accuracy error",
            SolveErrorKind::TimeoutError => "timeout",
            SolveErrorKind::InfeasibleProblem => "infeasible problem",
            SolveErrorKind::UnboundedProblem => "unbounded problem",
            SolveErrorKind::SolverFailure => "solver failure",
            SolveErrorKind::SuboptimalWithinTimeout => "suboptimal solution within timeout",
            SolveErrorKind::Unclassified => "unclassified solver output",
        };
        f.write_str(s)
    }
}

/// A failed solve attempt.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct SolveError {
    pub kind: SolveErrorKind,
    pub detail: String,
}

impl SolveError {
    pub fn new(kind: SolveErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl From<SolveErrorKind> for SolveError {
    fn from(kind: SolveErrorKind) -> Self {
        Self::new(kind, String::new())
    }
}

/// External delay computation for one `(network, forest, target)` under a time limit.
///
/// `Ok` carries `target.arity(net)` delay values. The network passed in may be a
/// rescaled copy of the analysed one.
pub trait DelayOracle {
    fn attempt_solve(
        &mut self,
        net: &Network,
        forest: &Forest,
        target: Target,
        timeout: Duration,
    ) -> Result<Vec<f64>, SolveError>;
}

impl<F> DelayOracle for F
where
    F: FnMut(&Network, &Forest, Target, Duration) -> Result<Vec<f64>, SolveError>,
{
    fn attempt_solve(
        &mut self,
        net: &Network,
        forest: &Forest,
        target: Target,
        timeout: Duration,
    ) -> Result<Vec<f64>, SolveError> {
        self(net, forest, target, timeout)
    }
}
