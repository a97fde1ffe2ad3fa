//! Tabular export of search results with polars.

use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use wcdb::api::Results;

/// One row per `(flow, forest)`: `foi, edges, forest, delay_s, elapsed_s, failure`.
pub fn results_frame(results: &Results) -> PolarsResult<DataFrame> {
    let mut foi = Vec::new();
    let mut edges = Vec::new();
    let mut forest = Vec::new();
    let mut delay = Vec::new();
    let mut elapsed = Vec::new();
    let mut failure: Vec<Option<String>> = Vec::new();
    for (&f, entries) in results {
        for e in entries {
            foi.push(f as u64);
            edges.push(e.forest.len() as u64);
            forest.push(e.forest.to_string());
            delay.push(e.delay);
            elapsed.push(e.elapsed.as_secs_f64());
            failure.push(e.failure.map(|k| k.to_string()));
        }
    }
    DataFrame::new(vec![
        Series::new("foi".into(), foi),
        Series::new("edges".into(), edges),
        Series::new("forest".into(), forest),
        Series::new("delay_s".into(), delay),
        Series::new("elapsed_s".into(), elapsed),
        Series::new("failure".into(), failure),
    ])
}

/// Per-flow summary: forests evaluated, solved count, best delay, mean runtime.
pub fn summary(df: DataFrame) -> PolarsResult<DataFrame> {
    df.lazy()
        .group_by([col("foi")])
        .agg([
            col("forest").count().alias("forests"),
            col("failure").null_count().alias("solved"),
            col("delay_s").min().alias("best_delay_s"),
            col("elapsed_s").mean().alias("mean_elapsed_s"),
        ])
        .sort(["foi"], SortMultipleOptions::default())
        .collect()
}

pub fn write_csv(results: &Results, path: &Path) -> Result<()> {
    let mut df = results_frame(results)?;
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = df.height(), "csv written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wcdb::api::{Edge, Forest, ResultEntry, SolveErrorKind};

    fn results() -> Results {
        let mut r = Results::new();
        r.insert(
            0,
            vec![
                ResultEntry {
                    forest: Forest::new([Edge::new(0, 1)]),
                    delay: 1.5,
                    elapsed: Duration::from_millis(20),
                    failure: None,
                },
                ResultEntry {
                    forest: Forest::default(),
                    delay: f64::INFINITY,
                    elapsed: Duration::from_millis(40),
                    failure: Some(SolveErrorKind::InfeasibleProblem),
                },
            ],
        );
        r.insert(
            1,
            vec![ResultEntry {
                forest: Forest::default(),
                delay: 3.0,
                elapsed: Duration::from_millis(10),
                failure: None,
            }],
        );
        r
    }

    #[test]
    fn frame_has_one_row_per_entry() {
        let df = results_frame(&results()).unwrap();
        assert_eq!(df.shape(), (3, 6));
    }

    #[test]
    fn summary_groups_by_flow() {
        let s = summary(results_frame(&results()).unwrap()).unwrap();
        assert_eq!(s.height(), 2);
        let best = s.column("best_delay_s").unwrap().f64().unwrap();
        assert_eq!(best.get(0), Some(1.5));
        assert_eq!(best.get(1), Some(3.0));
    }

    #[test]
    fn csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        write_csv(&results(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("foi,edges,forest,delay_s,elapsed_s,failure")
        );
        assert_eq!(lines.count(), 3);
    }
}
