//! Network model: FIFO servers, flows, the derived server graph, and topology builders.
//!
//! Purpose
//! - Hold the immutable service/arrival-curve description that every forest and
//!   every solve refers to.
//! - Derive the directed edge set `{(path[i], path[i+1])}` once, in a stable order,
//!   because exhaustive enumeration and result relabelling depend on it.
//! - Report the rotational-symmetry fact that switches the search strategy.

mod topology;
mod types;

pub use topology::{custom, NetworkType, Topology, TopologyParams, ASYMMETRY_FACTOR};
pub use types::{Edge, Flow, Network, RateLatency, Server, TokenBucket};

#[cfg(test)]
mod tests;
