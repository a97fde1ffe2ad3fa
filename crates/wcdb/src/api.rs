//! Curated API surface.
//!
//! Flat re-exports of everything a front end (the CLI, benches, scripts) needs,
//! so callers do not depend on the module layout.

// Network model
pub use crate::network::{
    custom as custom_network, Edge, Flow, Network, NetworkType, RateLatency, Server, TokenBucket,
    Topology, TopologyParams, ASYMMETRY_FACTOR,
};
// Forests
pub use crate::forest::{
    all_forests, exhaustive_combination_count, flow_preserving_min_depth_forest,
    generate_forests, is_forest, quick_min_depth_tree, sample_forests, symmetric_forests,
    symmetric_order, Forest, ForestGeneration, GenerationCfg, DEFAULT_FAIL_LIMIT,
};
// Oracle and retry policy
pub use crate::oracle::{
    classify_solver_output, parse_solver_output, CommandOracle, DelayAdapter, DelayOracle,
    RetryCfg, SearchStats, SolveError, SolveErrorKind, SolveOutcome, Target,
};
// Search
pub use crate::search::{Analysis, AnalysisCfg, Heuristic};
// Results
pub use crate::report::{results_table, DisplayUnit};
pub use crate::stats::{
    correlations, forest_ranking, heuristic_rankings, Correlations, ForestRanking,
    HeuristicRankings,
};
pub use crate::store::{ResultEntry, Results, SavedResults};
