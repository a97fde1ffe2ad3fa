//! Single-forest front end: build one forest with a heuristic and solve it.

use std::time::Instant;

use crate::error::{Error, Result};
use crate::forest::{
    flow_preserving_min_depth_forest, is_forest, quick_min_depth_tree, Forest,
};
use crate::network::{Edge, Network};
use crate::oracle::{DelayAdapter, DelayOracle, RetryCfg, SearchStats, Target};
use crate::store::ResultEntry;

/// Delay bounds from heuristic forests, without any enumeration.
///
/// Each call solves with an empty timing history, so every attempt gets the
/// hard timeout.
pub struct Heuristic<O> {
    net: Network,
    oracle: O,
    adapter: DelayAdapter,
}

impl<O: DelayOracle> Heuristic<O> {
    pub fn new(net: Network, retry: RetryCfg, oracle: O) -> Result<Self> {
        Ok(Self {
            net,
            oracle,
            adapter: DelayAdapter::new(retry)?,
        })
    }

    pub fn network(&self) -> &Network {
        &self.net
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Maximal forest keeping the path of `foi`, with unbounded depth.
    pub fn min_cut_forest(&mut self, foi: usize) -> Result<ResultEntry> {
        self.run(foi, |edges, n, path| {
            flow_preserving_min_depth_forest(edges, n, path, None)
        })
    }

    /// Like [`min_cut_forest`](Self::min_cut_forest) with components no deeper
    /// than `max_depth` (`None` for unbounded).
    pub fn min_cut_forest_with_restricted_depth(
        &mut self,
        foi: usize,
        max_depth: Option<usize>,
    ) -> Result<ResultEntry> {
        self.run(foi, |edges, n, path| {
            flow_preserving_min_depth_forest(edges, n, path, max_depth)
        })
    }

    /// Single-component variant: nothing past the first cut of a branch is kept.
    pub fn min_cut_tree_with_restricted_depth(
        &mut self,
        foi: usize,
        max_depth: Option<usize>,
    ) -> Result<ResultEntry> {
        self.run(foi, |edges, n, path| {
            quick_min_depth_tree(edges, n, path, max_depth)
        })
    }

    fn run(
        &mut self,
        foi: usize,
        build: impl FnOnce(&[Edge], usize, &[usize]) -> Forest,
    ) -> Result<ResultEntry> {
        let path = &self.net.flow(foi)?.path;
        let start = Instant::now();
        let forest = build(self.net.edges(), self.net.num_servers(), path);
        if !is_forest(forest.edges(), self.net.num_servers()) {
            return Err(Error::NotAForest);
        }
        let out = self.adapter.solve(
            &mut self.oracle,
            &self.net,
            &forest,
            Target::Flow(foi),
            &SearchStats::default(),
        );
        let elapsed = start.elapsed();
        tracing::info!(foi, %forest, delay = out.delay(), ?elapsed, "heuristic forest solved");
        Ok(ResultEntry {
            forest,
            delay: out.delay(),
            elapsed,
            failure: out.failure,
        })
    }
}
