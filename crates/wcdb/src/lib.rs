//! Worst-case delay bounds for FIFO networks by forest search.
//!
//! A cyclic network is analysed by keeping only the edges of a forest (a
//! feed-forward cut of the server graph); each forest gives a valid delay bound
//! for a flow, and the search looks for the tightest one. The numeric solve is
//! external and reached through [`oracle::DelayOracle`].
//!
//! Modules
//! - `network`: curves, servers, flows, and topology builders.
//! - `forest`: validation, generation, rotations, and heuristic forests.
//! - `oracle`: oracle trait, solver output classification, retry adapter.
//! - `search`: exhaustive and heuristic search front ends.
//! - `store` / `report` / `stats`: persistence, tables, statistics.

pub mod api;
pub mod error;
pub mod forest;
pub mod network;
pub mod oracle;
pub mod progress;
pub mod report;
pub mod search;
pub mod stats;
pub mod store;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{Error, Result};

/// Common imports for callers driving a search.
pub mod prelude {
    pub use crate::forest::{Forest, ForestGeneration, GenerationCfg};
    pub use crate::network::{Edge, Network, NetworkType, Topology, TopologyParams};
    pub use crate::oracle::{
        CommandOracle, DelayOracle, RetryCfg, SolveError, SolveErrorKind, Target,
    };
    pub use crate::progress::{NoProgress, ProgressSink};
    pub use crate::search::{Analysis, AnalysisCfg, Heuristic};
    pub use crate::store::{ResultEntry, Results, SavedResults};
}
