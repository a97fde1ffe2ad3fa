//! Single-pass forest construction around a flow of interest.
//!
//! Both builders keep the flow's own path edges (as far as the depth bound
//! allows) and grow the forest backwards through predecessors, always expanding
//! the shallowest frontier node first. Depth is the number of kept edges between
//! a node and the root of its component.
//!
//! Precondition: `flow_path` and `edges` only name servers `< num_servers`.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::types::Forest;
use crate::network::Edge;

/// Maximal forest of minimal depth that never cuts the flow's path.
///
/// With `max_depth = Some(d)` a node that would land at depth `d + 1` instead
/// starts a new component at depth 0, so path edges may be cut.
pub fn flow_preserving_min_depth_forest(
    edges: &[Edge],
    num_servers: usize,
    flow_path: &[usize],
    max_depth: Option<usize>,
) -> Forest {
    build(edges, num_servers, flow_path, max_depth, false)
}

/// Single-component variant: once an edge is excluded on a branch, nothing past
/// it on that branch is explored. Smaller forests, faster construction.
pub fn quick_min_depth_tree(
    edges: &[Edge],
    num_servers: usize,
    flow_path: &[usize],
    max_depth: Option<usize>,
) -> Forest {
    build(edges, num_servers, flow_path, max_depth, true)
}

/// Min-depth frontier; ties pop in insertion order.
struct Frontier {
    heap: BinaryHeap<Reverse<(usize, u64, usize)>>,
    seq: u64,
}

impl Frontier {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    fn push(&mut self, node: usize, depth: usize) {
        self.heap.push(Reverse((depth, self.seq, node)));
        self.seq += 1;
    }

    fn pop(&mut self) -> Option<(usize, usize)> {
        self.heap.pop().map(|Reverse((d, _, v))| (v, d))
    }
}

fn build(
    edges: &[Edge],
    num_servers: usize,
    flow_path: &[usize],
    max_depth: Option<usize>,
    quick: bool,
) -> Forest {
    let Some(&sink) = flow_path.last() else {
        return Forest::default();
    };
    let extendable = |depth: usize| max_depth.map_or(true, |m| depth < m);

    let mut preds = vec![Vec::new(); num_servers];
    for e in edges {
        preds[e.dst].push(e.src);
    }
    let mut visited = vec![false; num_servers];
    let mut path_depth = vec![0; num_servers];
    let mut kept = Vec::new();
    let mut frontier = Frontier::new();

    visited[sink] = true;
    frontier.push(sink, 0);
    let mut depth = 0;
    for w in flow_path.windows(2).rev() {
        let (u, v) = (w[0], w[1]);
        if visited[u] {
            // Revisited server: its out-edge is already decided.
            depth = path_depth[u];
            continue;
        }
        if extendable(depth) {
            depth += 1;
            kept.push(Edge::new(u, v));
        } else if quick {
            break;
        } else {
            depth = 0;
        }
        visited[u] = true;
        path_depth[u] = depth;
        frontier.push(u, depth);
    }

    while let Some((node, d)) = frontier.pop() {
        for &p in &preds[node] {
            if visited[p] {
                continue;
            }
            if extendable(d) {
                visited[p] = true;
                kept.push(Edge::new(p, node));
                frontier.push(p, d + 1);
            } else if !quick {
                visited[p] = true;
                frontier.push(p, 0);
            }
        }
    }
    Forest::new(kept)
}
