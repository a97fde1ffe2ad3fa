//! Crate-wide error type.
//!
//! Only structural and configuration problems surface here. Solver-side failures
//! never do: the retry adapter resolves them or degrades the affected forest to an
//! infinite delay (see `oracle::DelayAdapter`).

use std::path::PathBuf;

use crate::forest::Forest;
use crate::network::Edge;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("flow {foi} out of range (network has {num_flows} flows)")]
    FlowOutOfRange { foi: usize, num_flows: usize },

    #[error("forest index {index} out of range ({num_forests} forests generated)")]
    ForestIndexOutOfRange { index: usize, num_forests: usize },

    #[error("edge {0} is not an edge of this network")]
    EdgeNotInNetwork(Edge),

    #[error("edge set is not a valid forest")]
    NotAForest,

    #[error("requested {requested} forests but only {found} distinct valid forests were sampled before {limit} consecutive failures")]
    SamplingExhausted {
        requested: usize,
        found: usize,
        limit: usize,
    },

    #[error("`{0}` needs generated forests but forest generation is set to Empty")]
    NoForests(&'static str),

    #[error("no results recorded for flow {0}")]
    NoResults(usize),

    #[error("forest {0} is not among the recorded results")]
    ForestNotInResults(Forest),

    #[error("saved results belong to a different network")]
    NetworkMismatch,

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
