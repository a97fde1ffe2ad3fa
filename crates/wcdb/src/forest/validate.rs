//! Forest validity: out-degree ≤ 1 per server and no directed cycle.

use crate::network::Edge;

const UNSEEN: u8 = 0;
const ON_PATH: u8 = 1;
const DONE: u8 = 2;

/// True iff `edges` induce a forest on `num_servers` nodes.
///
/// Connectivity is not required. Edges with an endpoint `>= num_servers` are
/// rejected, and a self-loop is a cycle. Repeated copies of the same edge count
/// once.
pub fn is_forest(edges: &[Edge], num_servers: usize) -> bool {
    let mut succ: Vec<Option<usize>> = vec![None; num_servers];
    for e in edges {
        if e.src >= num_servers || e.dst >= num_servers {
            return false;
        }
        match succ[e.src] {
            Some(d) if d != e.dst => return false,
            _ => succ[e.src] = Some(e.dst),
        }
    }
    // Every node has at most one successor, so the traversal from a node is a
    // single chain; an explicit path stack keeps this iterative.
    let mut state = vec![UNSEEN; num_servers];
    let mut path = Vec::new();
    for start in 0..num_servers {
        if state[start] != UNSEEN {
            continue;
        }
        let mut cur = Some(start);
        while let Some(v) = cur {
            match state[v] {
                ON_PATH => return false,
                DONE => break,
                _ => {
                    state[v] = ON_PATH;
                    path.push(v);
                    cur = succ[v];
                }
            }
        }
        for v in path.drain(..) {
            state[v] = DONE;
        }
    }
    true
}
