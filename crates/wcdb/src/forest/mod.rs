//! Forests: feed-forward decompositions of the server graph.
//!
//! Purpose
//! - Decide validity (out-degree ≤ 1, acyclic) before anything reaches a solver.
//! - Produce candidate sets for search: exhaustive, sampled, or empty.
//! - Expand a forest into its rotations on symmetric cycles.
//! - Build one good forest directly when search is too expensive.
//!
//! Layout
//! - `types.rs` (canonical `Forest`), `validate.rs`, `generate.rs`,
//!   `symmetry.rs`, `heuristic.rs`.

mod generate;
mod heuristic;
mod symmetry;
mod types;
mod validate;

pub use generate::{
    all_forests, exhaustive_combination_count, generate_forests, sample_forests,
    ForestGeneration, GenerationCfg, DEFAULT_FAIL_LIMIT,
};
pub use heuristic::{flow_preserving_min_depth_forest, quick_min_depth_tree};
pub use symmetry::{symmetric_forests, symmetric_order};
pub use types::Forest;
pub use validate::is_forest;
