//! Classification of lp_solve-style text output.
//!
//! Known failures are recognised by a fixed first or last line. A success must
//! carry `Value of objective function:` on its second line; the delays are the
//! trailing whitespace-separated tokens. Everything else is `Unclassified`.

use super::types::{SolveError, SolveErrorKind};

const OBJECTIVE_PREFIX: &str = "Value of objective function:";

/// Map solver stdout to a failure kind, or `Ok(())` if it looks like a solution.
pub fn classify_solver_output(out: &str) -> Result<(), SolveError> {
    let lines: Vec<&str> = out.split('\n').collect();
    let first = lines.first().copied().unwrap_or("");
    // Output ends with a newline, so the last real line is second to last.
    let last = if lines.len() >= 2 {
        lines[lines.len() - 2]
    } else {
        ""
    };
    let kind = match (first, last) {
        (_, "Accuracy error") => Some(SolveErrorKind::AccuracyError),
        (_, "Timeout") => Some(SolveErrorKind::TimeoutError),
        ("This problem is infeasible", _) => Some(SolveErrorKind::InfeasibleProblem),
        ("This problem is unbounded", _) => Some(SolveErrorKind::UnboundedProblem),
        (_, "lp_solve failed") => Some(SolveErrorKind::SolverFailure),
        ("Suboptimal solution", _) => Some(SolveErrorKind::SuboptimalWithinTimeout),
        _ => None,
    };
    if let Some(kind) = kind {
        return Err(SolveError::new(kind, last_nonempty(&lines)));
    }
    match lines.get(1) {
        Some(l) if l.starts_with(OBJECTIVE_PREFIX) => Ok(()),
        _ => Err(SolveError::new(
            SolveErrorKind::Unclassified,
            last_nonempty(&lines),
        )),
    }
}

/// Classify `out` and extract the trailing `arity` delay values.
pub fn parse_solver_output(out: &str, arity: usize) -> Result<Vec<f64>, SolveError> {
    classify_solver_output(out)?;
    let tokens: Vec<&str> = out.split_whitespace().collect();
    if arity == 0 || tokens.len() < arity {
        return Err(SolveError::new(
            SolveErrorKind::Unclassified,
            format!("expected {arity} trailing values"),
        ));
    }
    tokens[tokens.len() - arity..]
        .iter()
        .map(|t| {
            t.parse::<f64>().map_err(|_| {
                SolveError::new(SolveErrorKind::Unclassified, format!("not a number: {t}"))
            })
        })
        .collect()
}

fn last_nonempty(lines: &[&str]) -> String {
    lines
        .iter()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(|l| l.trim().to_string())
        .unwrap_or_default()
}
