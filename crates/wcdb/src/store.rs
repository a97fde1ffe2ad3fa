//! Search results and their JSON persistence.
//!
//! A saved file carries the network next to the results so a later load can
//! check it is attached to the same network. Infinite delays are written as
//! `null`; finite delays and elapsed times round-trip exactly.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::forest::Forest;
use crate::network::Network;
use crate::oracle::SolveErrorKind;

/// One evaluated forest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub forest: Forest,
    /// Worst-case delay bound; `f64::INFINITY` when the solve gave up.
    #[serde(with = "delay_serde")]
    pub delay: f64,
    pub elapsed: Duration,
    /// Why the delay is infinite, if it is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<SolveErrorKind>,
}

impl ResultEntry {
    pub fn is_solved(&self) -> bool {
        self.failure.is_none() && self.delay.is_finite()
    }
}

/// Results per flow of interest, each list sorted ascending by delay.
pub type Results = BTreeMap<usize, Vec<ResultEntry>>;

/// Stable sort by delay; infinite delays go last.
pub fn sort_entries(entries: &mut [ResultEntry]) {
    entries.sort_by(|a, b| a.delay.total_cmp(&b.delay));
}

/// Results together with the network they were computed on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedResults {
    pub network: Network,
    pub results: Results,
}

impl SavedResults {
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut w = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut w, self)?;
        w.flush().map_err(|e| Error::io(path, e))?;
        tracing::info!(path = %path.display(), flows = self.results.len(), "saved results");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let saved: Self = serde_json::from_reader(BufReader::new(file))?;
        Ok(saved)
    }
}

mod delay_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(delay: &f64, s: S) -> Result<S::Ok, S::Error> {
        let v = delay.is_finite().then_some(*delay);
        v.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::INFINITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Edge, Topology, TopologyParams};

    fn entry(edges: &[(usize, usize)], delay: f64, ms: u64) -> ResultEntry {
        ResultEntry {
            forest: edges.iter().map(|&(a, b)| Edge::new(a, b)).collect(),
            delay,
            elapsed: Duration::from_millis(ms),
            failure: None,
        }
    }

    #[test]
    fn sort_is_stable_and_puts_infinite_last() {
        let mut v = vec![
            entry(&[(0, 1)], f64::INFINITY, 1),
            entry(&[], 2.0, 2),
            entry(&[(1, 2)], 1.0, 3),
            entry(&[(2, 3)], 2.0, 4),
        ];
        sort_entries(&mut v);
        let ms: Vec<u128> = v.iter().map(|e| e.elapsed.as_millis()).collect();
        assert_eq!(ms, vec![3, 2, 4, 1]);
    }

    #[test]
    fn infinite_delay_is_null_in_json() {
        let mut e = entry(&[(0, 1)], f64::INFINITY, 5);
        e.failure = Some(SolveErrorKind::Unclassified);
        let json = serde_json::to_value(&e).unwrap();
        assert!(json["delay"].is_null());
        assert_eq!(json["failure"], "Unclassified");
        let back: ResultEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, e);
        assert!(!back.is_solved());
    }

    #[test]
    fn save_and_load_round_trip() {
        let net = Topology::TandemSinkTree
            .build(&TopologyParams::default())
            .unwrap();
        let mut results = Results::new();
        results.insert(
            0,
            vec![
                entry(&[(0, 1)], 1.234_567_890_123_456_7e-4, 17),
                entry(&[], f64::INFINITY, 3),
            ],
        );
        let saved = SavedResults {
            network: net,
            results,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        saved.save(&path).unwrap();
        let back = SavedResults::load(&path).unwrap();
        assert_eq!(back, saved);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = SavedResults::load(Path::new("/nonexistent/results.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/results.json"));
    }
}
