//! Forest search for the tightest delay bound.

use std::collections::HashSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::forest::{
    generate_forests, is_forest, symmetric_forests, symmetric_order, Forest, ForestGeneration,
    GenerationCfg,
};
use crate::network::Network;
use crate::oracle::{DelayAdapter, DelayOracle, RetryCfg, SearchStats, Target};
use crate::progress::ProgressSink;
use crate::store::{sort_entries, ResultEntry, Results, SavedResults};

/// Configuration of an [`Analysis`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalysisCfg {
    pub generation: GenerationCfg,
    pub retry: RetryCfg,
}

/// One network, its candidate forests, and the delays found so far.
///
/// Forests are generated once in [`Analysis::new`]. Searches evaluate them in
/// generation order and keep per-flow results sorted ascending by delay.
pub struct Analysis<O> {
    net: Network,
    cfg: AnalysisCfg,
    forests: Vec<Forest>,
    oracle: O,
    adapter: DelayAdapter,
    stats: SearchStats,
    results: Results,
}

impl<O: DelayOracle> Analysis<O> {
    pub fn new(
        net: Network,
        cfg: AnalysisCfg,
        oracle: O,
        progress: &mut dyn ProgressSink,
    ) -> Result<Self> {
        let adapter = DelayAdapter::new(cfg.retry.clone())?;
        let forests = generate_forests(&net, &cfg.generation, progress)?;
        tracing::info!(
            servers = net.num_servers(),
            flows = net.num_flows(),
            edges = net.edges().len(),
            forests = forests.len(),
            "analysis ready"
        );
        Ok(Self {
            net,
            cfg,
            forests,
            oracle,
            adapter,
            stats: SearchStats::default(),
            results: Results::new(),
        })
    }

    pub fn network(&self) -> &Network {
        &self.net
    }

    pub fn cfg(&self) -> &AnalysisCfg {
        &self.cfg
    }

    pub fn forests(&self) -> &[Forest] {
        &self.forests
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// Delay bound of flow `foi` when only the edges of `forest` are kept.
    ///
    /// The flow, every edge, and the forest property are checked before any
    /// solve; an unsolvable forest yields `f64::INFINITY`.
    pub fn delay(&mut self, foi: usize, forest: &Forest) -> Result<f64> {
        self.net.flow(foi)?;
        if let Some(&e) = forest.edges().iter().find(|e| !self.net.contains_edge(**e)) {
            return Err(Error::EdgeNotInNetwork(e));
        }
        if !is_forest(forest.edges(), self.net.num_servers()) {
            return Err(Error::NotAForest);
        }
        let out = self.adapter.solve(
            &mut self.oracle,
            &self.net,
            forest,
            Target::Flow(foi),
            &self.stats,
        );
        Ok(out.delay())
    }

    /// Delay bound of flow `foi` with the `index`-th generated forest.
    pub fn delay_by_index(&mut self, foi: usize, index: usize) -> Result<f64> {
        let forest = self
            .forests
            .get(index)
            .cloned()
            .ok_or(Error::ForestIndexOutOfRange {
                index,
                num_forests: self.forests.len(),
            })?;
        self.delay(foi, &forest)
    }

    /// Evaluate every generated forest for flow `foi`.
    ///
    /// On a rotationally symmetric cycle this runs the batch search, which fills
    /// the results of every flow at once.
    pub fn exhaustive_search(
        &mut self,
        foi: usize,
        progress: &mut dyn ProgressSink,
    ) -> Result<&[ResultEntry]> {
        self.require_forests("exhaustive_search")?;
        self.net.flow(foi)?;
        match self.net.symmetric_cycle() {
            Some(n) => self.symmetric_search(n, progress),
            None => self.flow_search(foi, progress),
        }
        Ok(self.results.get(&foi).map(Vec::as_slice).unwrap_or_default())
    }

    /// [`exhaustive_search`](Self::exhaustive_search) for every flow.
    pub fn exhaustive_search_all_flows(
        &mut self,
        progress: &mut dyn ProgressSink,
    ) -> Result<&Results> {
        self.require_forests("exhaustive_search_all_flows")?;
        match self.net.symmetric_cycle() {
            Some(n) => self.symmetric_search(n, progress),
            None => {
                for foi in 0..self.net.num_flows() {
                    self.flow_search(foi, progress);
                }
            }
        }
        Ok(&self.results)
    }

    pub fn results(&self) -> &Results {
        &self.results
    }

    pub fn results_for(&self, foi: usize) -> Option<&[ResultEntry]> {
        self.results.get(&foi).map(Vec::as_slice)
    }

    pub fn take_results(&mut self) -> Results {
        std::mem::take(&mut self.results)
    }

    /// Snapshot for [`SavedResults::save`].
    pub fn saved_results(&self) -> SavedResults {
        SavedResults {
            network: self.net.clone(),
            results: self.results.clone(),
        }
    }

    /// Replace the results with previously saved ones for the same network.
    pub fn load_results(&mut self, saved: SavedResults) -> Result<()> {
        if saved.network != self.net {
            return Err(Error::NetworkMismatch);
        }
        self.results = saved.results;
        Ok(())
    }

    fn require_forests(&self, op: &'static str) -> Result<()> {
        if self.cfg.generation.mode == ForestGeneration::Empty {
            return Err(Error::NoForests(op));
        }
        Ok(())
    }

    fn flow_search(&mut self, foi: usize, progress: &mut dyn ProgressSink) {
        self.stats.reset();
        tracing::info!(foi, forests = self.forests.len(), "searching forests");
        progress.start("computing delays", self.forests.len() as u64);
        let mut entries = Vec::with_capacity(self.forests.len());
        for forest in &self.forests {
            let start = Instant::now();
            let out = self.adapter.solve(
                &mut self.oracle,
                &self.net,
                forest,
                Target::Flow(foi),
                &self.stats,
            );
            let elapsed = start.elapsed();
            if out.is_solved() {
                self.stats.record(elapsed, 1);
            }
            tracing::debug!(foi, %forest, delay = out.delay(), ?elapsed, "forest evaluated");
            entries.push(ResultEntry {
                forest: forest.clone(),
                delay: out.delay(),
                elapsed,
                failure: out.failure,
            });
            progress.advance(1);
        }
        progress.finish();
        sort_entries(&mut entries);
        log_best(foi, &entries);
        self.results.insert(foi, entries);
    }

    /// Batch search on an `n`-server symmetric cycle.
    ///
    /// Each solve returns the delays of all flows for one forest. The delay of
    /// flow `j` equals flow 0's delay under the forest rotated by `-j`, so one
    /// solve covers every rotation of the forest for flow 0. Other flows get flow
    /// 0's results relabelled by `+foi mod n`.
    fn symmetric_search(&mut self, n: usize, progress: &mut dyn ProgressSink) {
        self.stats.reset();
        tracing::info!(
            servers = n,
            forests = self.forests.len(),
            "searching forests on a symmetric cycle"
        );
        progress.start("computing delays", self.forests.len() as u64);
        let mut covered: HashSet<Forest> = HashSet::new();
        let mut entries = Vec::with_capacity(self.forests.len());
        for forest in &self.forests {
            if covered.contains(forest) {
                progress.advance(1);
                continue;
            }
            let rotations = symmetric_order(symmetric_forests(forest, n));
            let start = Instant::now();
            let out = self.adapter.solve(
                &mut self.oracle,
                &self.net,
                forest,
                Target::AllFlows,
                &self.stats,
            );
            let elapsed = start.elapsed();
            let share = elapsed / rotations.len() as u32;
            if out.is_solved() {
                self.stats.record(elapsed, rotations.len() as u64);
            }
            tracing::debug!(%forest, rotations = rotations.len(), ?elapsed, "forest evaluated");
            for (rotated, &delay) in rotations.into_iter().zip(&out.delays) {
                covered.insert(rotated.clone());
                entries.push(ResultEntry {
                    forest: rotated,
                    delay,
                    elapsed: share,
                    failure: out.failure,
                });
            }
            progress.advance(1);
        }
        progress.finish();
        sort_entries(&mut entries);
        log_best(0, &entries);
        for foi in 1..self.net.num_flows() {
            let copied = entries
                .iter()
                .map(|e| ResultEntry {
                    forest: e.forest.rotated(foi, n),
                    ..e.clone()
                })
                .collect();
            self.results.insert(foi, copied);
        }
        self.results.insert(0, entries);
    }
}

fn log_best(foi: usize, entries: &[ResultEntry]) {
    let failed = entries.iter().filter(|e| !e.is_solved()).count();
    match entries.first() {
        Some(best) => tracing::info!(
            foi,
            delay = best.delay,
            forest = %best.forest,
            evaluated = entries.len(),
            failed,
            "search finished"
        ),
        None => tracing::info!(foi, "search finished without forests"),
    }
}
