//! Search orchestration over candidate forests.
//!
//! Purpose
//! - [`Analysis`]: evaluate the generated forests of a network through the retry
//!   adapter and keep, per flow, the results sorted by delay.
//! - [`Heuristic`]: skip enumeration and solve one heuristic forest.
//!
//! Why this design
//! - The timing history that sizes solver timeouts is owned by the orchestrator
//!   and reset at the start of every top-level search, so averages never leak
//!   across flows.
//! - A failed forest degrades to an infinite delay and the search continues;
//!   only structural and configuration errors abort a call, before any solve.

mod analysis;
mod heuristic;

pub use analysis::{Analysis, AnalysisCfg};
pub use heuristic::Heuristic;

#[cfg(test)]
mod tests;
