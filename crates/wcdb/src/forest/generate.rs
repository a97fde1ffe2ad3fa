//! Candidate forest generation: exhaustive, sampled, or none.
//!
//! Exhaustive enumeration tests every edge combination of size `>= min_edges`
//! and is the dominant cost for larger networks; the progress sink receives one
//! step per combination tested. Sampling is seeded so a run can be replayed.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::types::Forest;
use super::validate::is_forest;
use crate::error::{Error, Result};
use crate::network::{Edge, Network};
use crate::progress::ProgressSink;

/// Consecutive rejected samples tolerated before giving up.
///
/// A heuristic guard: graphs with very few valid forests relative to their edge
/// count can trip it even though more forests exist.
pub const DEFAULT_FAIL_LIMIT: usize = 10_000;

/// Which forests to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForestGeneration {
    /// No forests; only ad-hoc delay queries are possible.
    Empty,
    /// `num_forests` distinct valid forests drawn at random (the empty forest first).
    Partial { num_forests: usize },
    /// Every valid forest with at least `min_edges` edges.
    All,
}

/// Forest generation configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GenerationCfg {
    pub mode: ForestGeneration,
    pub min_edges: usize,
    pub seed: u64,
    pub fail_limit: usize,
}

impl Default for GenerationCfg {
    fn default() -> Self {
        Self {
            mode: ForestGeneration::All,
            min_edges: 0,
            seed: 0,
            fail_limit: DEFAULT_FAIL_LIMIT,
        }
    }
}

impl GenerationCfg {
    pub fn validate(&self, net: &Network) -> Result<()> {
        if self.min_edges > net.edges().len() {
            return Err(Error::InvalidConfig(format!(
                "min_edges = {} exceeds the {} edges of the network",
                self.min_edges,
                net.edges().len()
            )));
        }
        Ok(())
    }
}

/// Generate the candidate forests for `net` according to `cfg`.
pub fn generate_forests(
    net: &Network,
    cfg: &GenerationCfg,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<Forest>> {
    cfg.validate(net)?;
    match cfg.mode {
        ForestGeneration::Empty => Ok(Vec::new()),
        ForestGeneration::Partial { num_forests } => sample_forests(
            net.edges(),
            net.num_servers(),
            cfg.min_edges,
            num_forests,
            cfg.seed,
            cfg.fail_limit,
            progress,
        ),
        ForestGeneration::All => Ok(all_forests(
            net.edges(),
            net.num_servers(),
            cfg.min_edges,
            progress,
        )),
    }
}

/// Number of combinations exhaustive enumeration tests: `2^m - Σ_{i<min} C(m, i)`.
///
/// Saturates at `u128::MAX` for edge counts of 120 and above.
pub fn exhaustive_combination_count(num_edges: usize, min_edges: usize) -> u128 {
    if num_edges >= 120 {
        return u128::MAX;
    }
    let mut total = 1u128 << num_edges;
    let mut binom = 1u128; // C(m, 0)
    for i in 0..min_edges.min(num_edges + 1) {
        total -= binom;
        binom = binom * (num_edges - i) as u128 / (i + 1) as u128;
    }
    total
}

/// All valid forests, grouped by size ascending, each size in lexicographic
/// combination order over `edges`.
pub fn all_forests(
    edges: &[Edge],
    num_servers: usize,
    min_edges: usize,
    progress: &mut dyn ProgressSink,
) -> Vec<Forest> {
    let total = exhaustive_combination_count(edges.len(), min_edges);
    progress.start(
        "selecting all valid forests from all cuts",
        u64::try_from(total).unwrap_or(u64::MAX),
    );
    let mut forests = Vec::new();
    let mut subset = Vec::with_capacity(edges.len());
    for k in min_edges..=edges.len() {
        let mut comb = Combinations::new(edges.len(), k);
        while let Some(idx) = comb.next_indices() {
            subset.clear();
            subset.extend(idx.iter().map(|&i| edges[i]));
            if is_forest(&subset, num_servers) {
                forests.push(Forest::new(subset.iter().copied()));
            }
            progress.advance(1);
        }
    }
    progress.finish();
    forests
}

/// `num_forests` distinct valid forests sampled uniformly by size then subset.
///
/// The empty forest is always entry zero. The result is stably sorted by size so
/// cheaper forests are evaluated first.
pub fn sample_forests(
    edges: &[Edge],
    num_servers: usize,
    min_edges: usize,
    num_forests: usize,
    seed: u64,
    fail_limit: usize,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<Forest>> {
    if num_forests == 0 {
        return Ok(Vec::new());
    }
    if min_edges > edges.len() {
        return Err(Error::InvalidConfig(format!(
            "min_edges = {min_edges} exceeds the {} edges",
            edges.len()
        )));
    }
    progress.start("selecting a subset of forests at random", num_forests as u64);
    progress.advance(1);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut forests = vec![Forest::default()];
    let mut seen: HashSet<Forest> = forests.iter().cloned().collect();
    let mut fails = 0usize;
    while forests.len() < num_forests {
        let k = rng.gen_range(min_edges..=edges.len());
        let candidate = Forest::new(edges.choose_multiple(&mut rng, k).copied());
        if !seen.contains(&candidate) && is_forest(candidate.edges(), num_servers) {
            seen.insert(candidate.clone());
            forests.push(candidate);
            fails = 0;
            progress.advance(1);
        } else {
            fails += 1;
            if fails > fail_limit {
                return Err(Error::SamplingExhausted {
                    requested: num_forests,
                    found: forests.len(),
                    limit: fail_limit,
                });
            }
        }
    }
    progress.finish();
    forests.sort_by_key(Forest::len);
    Ok(forests)
}

/// Lexicographic k-combinations of `0..n`, yielded as index slices.
struct Combinations {
    n: usize,
    idx: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            idx: (0..k).collect(),
            started: false,
            done: k > n,
        }
    }

    fn next_indices(&mut self) -> Option<&[usize]> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(&self.idx);
        }
        let k = self.idx.len();
        // Rightmost position that can still move right.
        let Some(i) = (0..k).rev().find(|&i| self.idx[i] != i + self.n - k) else {
            self.done = true;
            return None;
        };
        self.idx[i] += 1;
        for j in i + 1..k {
            self.idx[j] = self.idx[j - 1] + 1;
        }
        Some(&self.idx)
    }
}

#[cfg(test)]
mod comb_tests {
    use super::*;

    fn collect(n: usize, k: usize) -> Vec<Vec<usize>> {
        let mut c = Combinations::new(n, k);
        let mut out = Vec::new();
        while let Some(s) = c.next_indices() {
            out.push(s.to_vec());
        }
        out
    }

    #[test]
    fn combinations_lexicographic() {
        assert_eq!(
            collect(4, 2),
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(collect(3, 0), vec![Vec::<usize>::new()]);
        assert_eq!(collect(3, 3), vec![vec![0, 1, 2]]);
        assert!(collect(2, 3).is_empty());
    }

    #[test]
    fn combination_count_matches_binomials() {
        assert_eq!(exhaustive_combination_count(4, 0), 16);
        assert_eq!(exhaustive_combination_count(4, 1), 15);
        assert_eq!(exhaustive_combination_count(4, 2), 11);
        assert_eq!(exhaustive_combination_count(4, 4), 1);
        assert_eq!(exhaustive_combination_count(0, 0), 1);
    }
}
