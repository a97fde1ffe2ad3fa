//! Canonical forest value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::network::Edge;

/// Edge subset of a network, kept sorted by `(src, dst)` and deduplicated.
///
/// Canonical storage makes equality and hashing set-based, which the symmetric
/// search relies on when it marks rotations as already covered. For a valid
/// forest (out-degree ≤ 1) the order coincides with "sorted by source".
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Vec<Edge>", into = "Vec<Edge>")]
pub struct Forest(Vec<Edge>);

impl Forest {
    pub fn new(edges: impl IntoIterator<Item = Edge>) -> Self {
        let mut v: Vec<Edge> = edges.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        Self(v)
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, e: Edge) -> bool {
        self.0.binary_search(&e).is_ok()
    }

    /// Relabel every server by `+k mod n`.
    pub fn rotated(&self, k: usize, n: usize) -> Self {
        Self::new(self.0.iter().map(|e| e.rotated(k, n)))
    }
}

impl FromIterator<Edge> for Forest {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<Edge>> for Forest {
    fn from(v: Vec<Edge>) -> Self {
        Self::new(v)
    }
}

impl From<Forest> for Vec<Edge> {
    fn from(f: Forest) -> Self {
        f.0
    }
}

impl fmt::Display for Forest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{e}")?;
        }
        write!(f, "]")
    }
}
