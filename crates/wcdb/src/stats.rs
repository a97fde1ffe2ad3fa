//! Statistics over recorded search results.
//!
//! Correlations drop entries with an infinite delay. Rankings locate a forest in
//! a flow's delay-sorted result list.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::forest::{flow_preserving_min_depth_forest, quick_min_depth_tree, Forest};
use crate::network::Network;
use crate::store::{ResultEntry, Results};

/// Pearson correlation coefficient; `None` for fewer than two points or a
/// constant series.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mean = |v: &[f64]| v.iter().sum::<f64>() / n as f64;
    let (mx, my) = (mean(xs), mean(ys));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Correlations {
    pub delay_runtime: Option<f64>,
    pub size_delay: Option<f64>,
    pub size_runtime: Option<f64>,
}

pub fn correlations(entries: &[ResultEntry]) -> Correlations {
    let solved: Vec<&ResultEntry> = entries.iter().filter(|e| e.delay.is_finite()).collect();
    let delays: Vec<f64> = solved.iter().map(|e| e.delay).collect();
    let runtimes: Vec<f64> = solved.iter().map(|e| e.elapsed.as_secs_f64()).collect();
    let sizes: Vec<f64> = solved.iter().map(|e| e.forest.len() as f64).collect();
    Correlations {
        delay_runtime: pearson(&delays, &runtimes),
        size_delay: pearson(&sizes, &delays),
        // Runtime is finite even when the delay is not.
        size_runtime: pearson(
            &entries
                .iter()
                .map(|e| e.forest.len() as f64)
                .collect::<Vec<_>>(),
            &entries
                .iter()
                .map(|e| e.elapsed.as_secs_f64())
                .collect::<Vec<_>>(),
        ),
    }
}

/// Where a forest sits among a flow's results.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ForestRanking {
    /// 1-based position in the delay-sorted results.
    pub position: usize,
    /// `position / len`: the forest is in the top `100 * top_fraction` percent.
    pub top_fraction: f64,
    pub delay: f64,
    /// Forest runtime divided by the median runtime.
    pub runtime_vs_median: f64,
}

/// Median runtime in seconds (mean of the middle pair for even counts).
pub fn median_runtime(entries: &[ResultEntry]) -> Option<f64> {
    let mut v: Vec<f64> = entries.iter().map(|e| e.elapsed.as_secs_f64()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    Some(if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    })
}

pub fn forest_ranking(entries: &[ResultEntry], forest: &Forest) -> Result<ForestRanking> {
    let index = entries
        .iter()
        .position(|e| &e.forest == forest)
        .ok_or_else(|| Error::ForestNotInResults(forest.clone()))?;
    let median = median_runtime(entries).unwrap_or_default();
    let runtime = entries[index].elapsed.as_secs_f64();
    Ok(ForestRanking {
        position: index + 1,
        top_fraction: (index + 1) as f64 / entries.len() as f64,
        delay: entries[index].delay,
        runtime_vs_median: if median > 0.0 { runtime / median } else { 1.0 },
    })
}

/// Rankings of the three heuristic forests of a flow.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HeuristicRankings {
    /// Unbounded-depth flow-preserving forest.
    pub best: ForestRanking,
    /// Depth-bounded flow-preserving forest.
    pub bounded: ForestRanking,
    /// Depth-bounded single-component tree.
    pub quick: ForestRanking,
}

/// Rank each heuristic forest of `foi` among the recorded results.
///
/// Fails if a heuristic forest was not evaluated, e.g. after a partial search.
pub fn heuristic_rankings(
    net: &Network,
    results: &Results,
    foi: usize,
    max_depth: Option<usize>,
) -> Result<HeuristicRankings> {
    let path = &net.flow(foi)?.path;
    let entries = results.get(&foi).ok_or(Error::NoResults(foi))?;
    let (edges, n) = (net.edges(), net.num_servers());
    Ok(HeuristicRankings {
        best: forest_ranking(
            entries,
            &flow_preserving_min_depth_forest(edges, n, path, None),
        )?,
        bounded: forest_ranking(
            entries,
            &flow_preserving_min_depth_forest(edges, n, path, max_depth),
        )?,
        quick: forest_ranking(entries, &quick_min_depth_tree(edges, n, path, max_depth))?,
    })
}
