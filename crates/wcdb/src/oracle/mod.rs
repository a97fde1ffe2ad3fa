//! Delay oracle: the external solve step and its retry policy.
//!
//! Purpose
//! - Define what an oracle is ([`DelayOracle`]) and the closed set of failures it
//!   may report ([`SolveErrorKind`]).
//! - Wrap any oracle in [`DelayAdapter`], the only place that interprets failure
//!   kinds (rescale, grow the timeout, or give up with an infinite delay).
//! - Provide [`CommandOracle`], which runs an external lp_solve-style program.
//!
//! Layout
//! - `types.rs`: targets, errors, the oracle trait.
//! - `classify.rs`: text output classification.
//! - `command.rs`: external program oracle.
//! - `adapter.rs`: retry state machine and timeout sizing.

mod adapter;
mod classify;
mod command;
mod types;

pub use adapter::{AttemptState, DelayAdapter, RetryCfg, SearchStats, SolveOutcome, Step};
pub use classify::{classify_solver_output, parse_solver_output};
pub use command::{CommandOracle, DEFAULT_GRACE};
pub use types::{DelayOracle, Recovery, SolveError, SolveErrorKind, Target};
