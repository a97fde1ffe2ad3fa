use std::time::Duration;

use super::*;
use crate::error::Error;
use crate::forest::{is_forest, Forest, ForestGeneration, GenerationCfg};
use crate::network::{
    custom, Edge, Network, NetworkType, RateLatency, Topology, TokenBucket, TopologyParams,
};
use crate::oracle::{DelayOracle, SolveError, SolveErrorKind, Target};
use crate::progress::NoProgress;
use crate::store::SavedResults;

/// Oracle computing delays from a function of the forest; logs every call.
struct Fake {
    n: usize,
    delay: fn(&Forest) -> Result<f64, SolveErrorKind>,
    calls: Vec<(Forest, Target, Duration)>,
}

impl Fake {
    fn new(n: usize, delay: fn(&Forest) -> Result<f64, SolveErrorKind>) -> Self {
        Self {
            n,
            delay,
            calls: Vec::new(),
        }
    }
}

impl DelayOracle for Fake {
    fn attempt_solve(
        &mut self,
        net: &Network,
        forest: &Forest,
        target: Target,
        timeout: Duration,
    ) -> Result<Vec<f64>, SolveError> {
        self.calls.push((forest.clone(), target, timeout));
        // Flow j sees the forest as flow 0 sees it rotated by -j.
        let one = |j: usize| (self.delay)(&forest.rotated(self.n - j % self.n, self.n));
        match target {
            Target::Flow(foi) => Ok(vec![one(foi)?]),
            Target::AllFlows => (0..net.num_flows())
                .map(|j| one(j).map_err(SolveError::from))
                .collect(),
        }
    }
}

fn weighted(f: &Forest) -> Result<f64, SolveErrorKind> {
    Ok(10.0 - f.edges().iter().map(|e| (e.src + 1) as f64 * 0.1).sum::<f64>())
}

fn ring(n: usize) -> Network {
    Topology::RingFull
        .build(&TopologyParams {
            servers: n,
            network_type: NetworkType::Symmetric,
            ..Default::default()
        })
        .unwrap()
}

fn tandem() -> Network {
    Topology::TandemSinkTree
        .build(&TopologyParams::default())
        .unwrap()
}

fn analysis(net: Network, delay: fn(&Forest) -> Result<f64, SolveErrorKind>) -> Analysis<Fake> {
    let n = net.num_servers();
    Analysis::new(net, AnalysisCfg::default(), Fake::new(n, delay), &mut NoProgress).unwrap()
}

#[test]
fn flow_search_sorts_by_delay_and_records_stats() {
    let mut a = analysis(tandem(), weighted);
    let num_forests = a.forests().len();
    assert_eq!(num_forests, 8);
    let mut advanced = 0u64;
    let entries = a
        .exhaustive_search(1, &mut |d: u64| advanced += d)
        .unwrap()
        .to_vec();
    assert_eq!(advanced, 8);
    assert_eq!(entries.len(), num_forests);
    assert!(entries.windows(2).all(|w| w[0].delay <= w[1].delay));
    assert_eq!(entries[0].forest, Forest::new(a.network().edges().iter().copied()));
    assert_eq!(a.stats().count, num_forests as u64);
    assert_eq!(a.oracle().calls.len(), num_forests);
    // No history for the first solve, then timeouts sized from fast solves.
    assert_eq!(a.oracle().calls[0].2, Duration::from_secs(600));
    assert!(a.oracle().calls[1..]
        .iter()
        .all(|c| c.2 < Duration::from_secs(600)));

    // A second search starts from a fresh history.
    a.exhaustive_search(2, &mut NoProgress).unwrap();
    assert_eq!(a.stats().count, num_forests as u64);
    assert_eq!(a.oracle().calls[num_forests].2, Duration::from_secs(600));
    assert_eq!(a.results().len(), 2);
}

#[test]
fn ties_keep_generation_order() {
    let mut a = analysis(tandem(), |_| Ok(1.0));
    let forests = a.forests().to_vec();
    let entries = a.exhaustive_search(0, &mut NoProgress).unwrap();
    let order: Vec<&Forest> = entries.iter().map(|e| &e.forest).collect();
    assert_eq!(order, forests.iter().collect::<Vec<_>>());
}

#[test]
fn failed_forests_degrade_to_infinity() {
    fn fails_on_first_edge(f: &Forest) -> Result<f64, SolveErrorKind> {
        if f.contains(Edge::new(0, 1)) {
            Err(SolveErrorKind::InfeasibleProblem)
        } else {
            Ok(f.len() as f64)
        }
    }
    let mut a = analysis(tandem(), fails_on_first_edge);
    let entries = a.exhaustive_search(0, &mut NoProgress).unwrap().to_vec();
    assert_eq!(entries.len(), 8);
    let (ok, failed): (Vec<_>, Vec<_>) = entries.iter().partition(|e| e.is_solved());
    assert_eq!(ok.len(), 4);
    assert!(failed
        .iter()
        .all(|e| e.delay.is_infinite() && e.failure == Some(SolveErrorKind::InfeasibleProblem)));
    // Infinite entries sort last.
    assert!(entries[4..].iter().all(|e| !e.is_solved()));
    // Failures are not part of the timing history.
    assert_eq!(a.stats().count, 4);
}

#[test]
fn symmetric_search_solves_each_rotation_class_once() {
    let mut a = analysis(ring(4), weighted);
    assert_eq!(a.forests().len(), 15);
    let results = a.exhaustive_search_all_flows(&mut NoProgress).unwrap().clone();
    // Classes: empty, single edge, adjacent pair, opposite pair, triple.
    assert_eq!(a.oracle().calls.len(), 5);
    assert!(a
        .oracle()
        .calls
        .iter()
        .all(|c| c.1 == Target::AllFlows));
    assert_eq!(results.len(), 4);
    let flow0 = &results[&0];
    assert_eq!(flow0.len(), 15);
    // Every delay belongs to the forest it is recorded with.
    for e in flow0 {
        assert_eq!(e.delay, weighted(&e.forest).unwrap());
    }
    assert!(flow0.windows(2).all(|w| w[0].delay <= w[1].delay));
}

#[test]
fn symmetric_copies_are_relabelled_flow_zero_results() {
    let mut a = analysis(ring(5), weighted);
    a.exhaustive_search(0, &mut NoProgress).unwrap();
    let results = a.results();
    let flow0 = &results[&0];
    for k in 0..5 {
        let flow_k = &results[&k];
        assert_eq!(flow_k.len(), flow0.len());
        for (e0, ek) in flow0.iter().zip(flow_k) {
            assert_eq!(ek.forest, e0.forest.rotated(k, 5));
            assert_eq!(ek.delay, e0.delay);
            assert_eq!(ek.elapsed, e0.elapsed);
        }
    }
    // The relabelled delay matches a direct single-flow solve.
    let probe = results[&3][4].clone();
    assert_eq!(a.delay(3, &probe.forest).unwrap(), probe.delay);
}

#[test]
fn ad_hoc_delay_rejects_structural_errors_before_solving() {
    let mut a = analysis(ring(4), weighted);
    let cycle = Forest::new(a.network().edges().iter().copied());
    assert!(matches!(
        a.delay(9, &Forest::default()),
        Err(Error::FlowOutOfRange { foi: 9, .. })
    ));
    assert!(matches!(
        a.delay(0, &Forest::new([Edge::new(0, 2)])),
        Err(Error::EdgeNotInNetwork(_))
    ));
    assert!(matches!(a.delay(0, &cycle), Err(Error::NotAForest)));
    assert!(matches!(
        a.delay_by_index(0, 99),
        Err(Error::ForestIndexOutOfRange { index: 99, .. })
    ));
    assert!(a.oracle().calls.is_empty());
    let d = a.delay_by_index(0, 0).unwrap();
    assert_eq!(d, 10.0);
}

#[test]
fn empty_generation_allows_only_ad_hoc_queries() {
    let cfg = AnalysisCfg {
        generation: GenerationCfg {
            mode: ForestGeneration::Empty,
            ..Default::default()
        },
        ..Default::default()
    };
    let net = tandem();
    let mut a = Analysis::new(net, cfg, Fake::new(4, weighted), &mut NoProgress).unwrap();
    assert!(a.forests().is_empty());
    assert!(matches!(
        a.exhaustive_search(0, &mut NoProgress),
        Err(Error::NoForests(_))
    ));
    assert!(matches!(
        a.exhaustive_search_all_flows(&mut NoProgress),
        Err(Error::NoForests(_))
    ));
    let f = Forest::new([Edge::new(0, 1)]);
    assert!((a.delay(0, &f).unwrap() - 9.9).abs() < 1e-12);
}

#[test]
fn all_flows_on_asymmetric_network_searches_each_flow() {
    let mut a = analysis(tandem(), weighted);
    let results = a.exhaustive_search_all_flows(&mut NoProgress).unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(a.oracle().calls.len(), 4 * 8);
}

#[test]
fn results_reload_only_onto_the_same_network() {
    let mut a = analysis(tandem(), weighted);
    a.exhaustive_search(0, &mut NoProgress).unwrap();
    let saved = a.saved_results();
    let taken = a.take_results();
    assert!(a.results().is_empty());
    assert_eq!(taken, saved.results);
    a.load_results(saved.clone()).unwrap();
    assert_eq!(a.results_for(0).map(<[_]>::len), Some(8));

    let mut other = analysis(ring(4), weighted);
    assert!(matches!(
        other.load_results(SavedResults {
            network: tandem(),
            results: taken,
        }),
        Err(Error::NetworkMismatch)
    ));
}

#[test]
fn heuristic_front_end_solves_one_forest() {
    let net = tandem();
    let mut h = Heuristic::new(net, Default::default(), Fake::new(4, weighted)).unwrap();
    let full = h.min_cut_forest(0).unwrap();
    assert_eq!(full.forest.len(), 3);
    assert_eq!(full.delay, weighted(&full.forest).unwrap());
    let bounded = h.min_cut_forest_with_restricted_depth(0, Some(1)).unwrap();
    assert_eq!(
        bounded.forest,
        Forest::new([Edge::new(0, 1), Edge::new(2, 3)])
    );
    let quick = h.min_cut_tree_with_restricted_depth(0, Some(1)).unwrap();
    assert_eq!(quick.forest, Forest::new([Edge::new(2, 3)]));
    assert!(h.min_cut_forest(7).is_err());
}

#[test]
fn heuristic_never_solves_a_cyclic_edge_set() {
    let server = || (vec![RateLatency::new(10.0, 1.0)], vec![]);
    let net = custom(
        vec![server(), server(), server()],
        vec![
            (vec![TokenBucket::new(1.0, 1.0)], vec![0, 1, 2, 0]),
            (vec![TokenBucket::new(1.0, 1.0)], vec![1, 1]),
        ],
    )
    .unwrap();
    let mut h = Heuristic::new(net, Default::default(), Fake::new(3, weighted)).unwrap();
    let around = h.min_cut_forest(0).unwrap();
    assert_eq!(around.forest, Forest::new([Edge::new(1, 2), Edge::new(2, 0)]));
    let looped = h.min_cut_tree_with_restricted_depth(1, None).unwrap();
    assert_eq!(looped.forest, Forest::new([Edge::new(0, 1), Edge::new(2, 0)]));
    for (forest, _, _) in &h.oracle().calls {
        assert!(is_forest(forest.edges(), 3));
    }
}
