//! Rotations of a forest on a rotationally symmetric cycle.

use super::types::Forest;

/// Distinct rotations of `forest` on an `n`-cycle, in production order.
///
/// Entry `i` is the forest with every server relabelled by `+i mod n`. Production
/// stops at the first rotation that reproduces an earlier one, so a forest with
/// period `p < n` yields exactly `p` entries.
pub fn symmetric_forests(forest: &Forest, n: usize) -> Vec<Forest> {
    let mut out = vec![forest.clone()];
    for i in 1..n {
        let r = forest.rotated(i, n);
        if out.contains(&r) {
            break;
        }
        out.push(r);
    }
    out
}

/// Reorder rotations so that position `j` holds the rotation by `-j`.
///
/// The original stays first and the remaining entries are reversed. A batch
/// solve returns the delay of flow `j` at position `j`, and on a symmetric cycle
/// that equals flow 0's delay under the forest rotated by `-j`; zipping the two
/// sequences therefore pairs each delay with the forest it belongs to for flow 0.
pub fn symmetric_order(mut rotations: Vec<Forest>) -> Vec<Forest> {
    if rotations.len() > 1 {
        rotations[1..].reverse();
    }
    rotations
}
