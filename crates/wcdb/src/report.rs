//! Human-readable result tables.

use std::fmt::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::ResultEntry;

/// Time unit used when displaying delays and runtimes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayUnit {
    MicroSecond,
    MilliSecond,
    #[default]
    Second,
    Minute,
    Hour,
}

impl DisplayUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            DisplayUnit::MicroSecond => "µs",
            DisplayUnit::MilliSecond => "ms",
            DisplayUnit::Second => "s",
            DisplayUnit::Minute => "min",
            DisplayUnit::Hour => "h",
        }
    }

    /// Multiplier from seconds to this unit.
    pub fn factor(self) -> f64 {
        match self {
            DisplayUnit::MicroSecond => 1e6,
            DisplayUnit::MilliSecond => 1e3,
            DisplayUnit::Second => 1.0,
            DisplayUnit::Minute => 1.0 / 60.0,
            DisplayUnit::Hour => 1.0 / 3600.0,
        }
    }

    pub fn scale_secs(self, secs: f64) -> f64 {
        secs * self.factor()
    }

    pub fn scale_duration(self, d: Duration) -> f64 {
        self.scale_secs(d.as_secs_f64())
    }
}

/// Column headers for the given units.
pub fn table_header(delay_unit: DisplayUnit, runtime_unit: DisplayUnit) -> [String; 4] {
    [
        "# of Edges".to_string(),
        "Edges Kept".to_string(),
        format!("Delay ({})", delay_unit.symbol()),
        format!("Elapsed Time ({})", runtime_unit.symbol()),
    ]
}

/// Results of flow `foi` as a framed text table, or `NOT COMPUTED!` without results.
pub fn results_table(
    foi: usize,
    entries: Option<&[ResultEntry]>,
    delay_unit: DisplayUnit,
    runtime_unit: DisplayUnit,
) -> String {
    let title = format!("###Results for flow {foi}###");
    let rule = "#".repeat(title.chars().count());
    let mut out = format!("{rule}\n{title}\n{rule}\n");
    let Some(entries) = entries else {
        out.push_str("NOT COMPUTED!\n");
        return out;
    };

    let header = table_header(delay_unit, runtime_unit);
    let rows: Vec<[String; 4]> = entries
        .iter()
        .map(|e| {
            [
                e.forest.len().to_string(),
                e.forest.to_string(),
                delay_unit.scale_secs(e.delay).to_string(),
                runtime_unit.scale_duration(e.elapsed).to_string(),
            ]
        })
        .collect();
    let mut widths = header.each_ref().map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |out: &mut String, cells: &[String; 4]| {
        for (cell, w) in cells.iter().zip(widths) {
            let pad = w - cell.chars().count();
            let _ = write!(out, "| {cell}{} ", " ".repeat(pad));
        }
        out.push_str("|\n");
    };
    line(&mut out, &header);
    for w in widths {
        let _ = write!(out, "|{}", "-".repeat(w + 2));
    }
    out.push_str("|\n");
    for row in &rows {
        line(&mut out, row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::Forest;
    use crate::network::Edge;

    #[test]
    fn unit_conversion() {
        assert_eq!(DisplayUnit::MicroSecond.scale_secs(0.5), 500_000.0);
        assert_eq!(DisplayUnit::MilliSecond.scale_duration(Duration::from_millis(3)), 3.0);
        assert_eq!(DisplayUnit::Minute.scale_secs(120.0), 2.0);
        assert_eq!(DisplayUnit::Hour.symbol(), "h");
    }

    #[test]
    fn table_lists_entries_in_order() {
        let entries = vec![
            ResultEntry {
                forest: Forest::new([Edge::new(0, 1)]),
                delay: 2e-6,
                elapsed: Duration::from_millis(4),
                failure: None,
            },
            ResultEntry {
                forest: Forest::default(),
                delay: f64::INFINITY,
                elapsed: Duration::from_millis(1),
                failure: None,
            },
        ];
        let t = results_table(
            2,
            Some(&entries),
            DisplayUnit::MicroSecond,
            DisplayUnit::MilliSecond,
        );
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines[1], "###Results for flow 2###");
        assert!(lines[3].starts_with("| # of Edges | Edges Kept |"));
        assert!(lines[3].contains("Delay (µs)") && lines[3].contains("Elapsed Time (ms)"));
        assert!(lines[5].starts_with("| 1 ") && lines[5].contains("[(0, 1)]"));
        assert!(lines[6].contains("inf"));
        // All rows share one width.
        let width = lines[3].chars().count();
        assert!(lines[3..].iter().all(|l| l.chars().count() == width));
    }

    #[test]
    fn missing_results_are_flagged() {
        let t = results_table(0, None, DisplayUnit::Second, DisplayUnit::Second);
        assert!(t.ends_with("NOT COMPUTED!\n"));
    }
}
