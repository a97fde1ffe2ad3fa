//! Retry adapter around a [`DelayOracle`].
//!
//! Purpose
//! - Turn a fallible external solve into a delay value: the delays on success,
//!   or the infinite sentinel once retrying cannot help.
//!
//! Why this design
//! - One attempt is a pure transition `AttemptState -> Step`; the driving loop in
//!   [`DelayAdapter::solve`] only repeats `step` until `Solved` or `GiveUp`.
//! - Within one call the scale index only moves forward and the timeout only
//!   grows, so the number of attempts is bounded by
//!   `scale_factors.len() + max_timeout_growth_steps`.
//! - Timeout sizing reads a [`SearchStats`] owned by the caller. Only successful
//!   solves are recorded there, and the caller resets it per top-level search.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{DelayOracle, Recovery, SolveError, SolveErrorKind, Target};
use crate::error::{Error, Result};
use crate::forest::Forest;
use crate::network::Network;

/// Retry and timeout policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryCfg {
    /// Multipliers on rates and bursts, tried in order.
    pub scale_factors: Vec<f64>,
    /// No attempt ever gets more than this.
    pub hard_timeout: Duration,
    /// Timeout factor over the average successful solve time, before any growth.
    pub initial_timeout_factor: f64,
    /// Multiplier applied to the timeout factor after a suboptimal result.
    pub timeout_growth: f64,
    /// Timeout growths allowed within one call.
    pub max_timeout_growth_steps: usize,
    /// Floor for history-derived timeouts.
    pub min_timeout: Duration,
}

impl Default for RetryCfg {
    fn default() -> Self {
        Self {
            scale_factors: vec![1.0, 0.1, 10.0],
            hard_timeout: Duration::from_secs(600),
            initial_timeout_factor: 2.0,
            timeout_growth: 2.0,
            max_timeout_growth_steps: 16,
            min_timeout: Duration::from_secs(1),
        }
    }
}

impl RetryCfg {
    pub fn validate(&self) -> Result<()> {
        if self.scale_factors.is_empty() {
            return Err(Error::InvalidConfig("scale_factors must not be empty".into()));
        }
        if let Some(f) = self
            .scale_factors
            .iter()
            .find(|f| !f.is_finite() || **f <= 0.0)
        {
            return Err(Error::InvalidConfig(format!(
                "scale factor {f} must be finite and positive"
            )));
        }
        if self.hard_timeout.is_zero() {
            return Err(Error::InvalidConfig("hard_timeout must be positive".into()));
        }
        if !self.initial_timeout_factor.is_finite() || self.initial_timeout_factor <= 0.0 {
            return Err(Error::InvalidConfig(
                "initial_timeout_factor must be finite and positive".into(),
            ));
        }
        if !self.timeout_growth.is_finite() || self.timeout_growth <= 1.0 {
            return Err(Error::InvalidConfig(
                "timeout_growth must be finite and greater than 1".into(),
            ));
        }
        Ok(())
    }

    /// Upper bound on oracle calls made by one [`DelayAdapter::solve`].
    pub fn max_attempts(&self) -> usize {
        self.scale_factors.len() + self.max_timeout_growth_steps
    }
}

/// Running totals over successful solves, used to size timeouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub total_time: Duration,
    pub count: u64,
}

impl SearchStats {
    /// Record `count` solved delays that took `elapsed` in total.
    pub fn record(&mut self, elapsed: Duration, count: u64) {
        self.total_time += elapsed;
        self.count += count;
    }

    pub fn average(&self) -> Option<Duration> {
        (self.count > 0).then(|| self.total_time.div_f64(self.count as f64))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Position of one call in the retry state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttemptState {
    pub scale_index: usize,
    pub growth_steps: usize,
}

/// Result of a single attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Solved(Vec<f64>),
    Retry(AttemptState),
    GiveUp(SolveErrorKind),
}

/// Final result of [`DelayAdapter::solve`].
#[derive(Clone, Debug, PartialEq)]
pub struct SolveOutcome {
    /// `target.arity` values; all `f64::INFINITY` when the solve gave up.
    pub delays: Vec<f64>,
    /// Kind of the failure that ended the call, if it gave up.
    pub failure: Option<SolveErrorKind>,
    pub attempts: usize,
}

impl SolveOutcome {
    pub fn is_solved(&self) -> bool {
        self.failure.is_none()
    }

    /// First delay: the flow of interest for a single-flow target.
    pub fn delay(&self) -> f64 {
        self.delays.first().copied().unwrap_or(f64::INFINITY)
    }
}

/// Drives a [`DelayOracle`] through the scale/timeout retry policy.
///
/// The timeout factor persists across calls: once a solve needed a longer
/// timeout, later solves start from it.
#[derive(Clone, Debug)]
pub struct DelayAdapter {
    cfg: RetryCfg,
    timeout_factor: f64,
}

impl DelayAdapter {
    pub fn new(cfg: RetryCfg) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            timeout_factor: cfg.initial_timeout_factor,
            cfg,
        })
    }

    pub fn cfg(&self) -> &RetryCfg {
        &self.cfg
    }

    pub fn timeout_factor(&self) -> f64 {
        self.timeout_factor
    }

    /// Timeout for the next attempt given the successful-solve history.
    pub fn timeout(&self, stats: &SearchStats, target: Target, num_flows: usize) -> Duration {
        let hard = self.cfg.hard_timeout;
        let Some(avg) = stats.average() else {
            return hard;
        };
        let mut secs = (avg.as_secs_f64() * self.timeout_factor).ceil();
        if let Target::AllFlows = target {
            secs *= num_flows.max(1) as f64;
        }
        let secs = secs.max(self.cfg.min_timeout.as_secs_f64());
        if secs.is_nan() || secs >= hard.as_secs_f64() {
            return hard;
        }
        Duration::from_secs_f64(secs)
    }

    /// Grow the factor so the next timeout is strictly longer than `current`.
    ///
    /// Rounding up and the `min_timeout` floor can swallow a plain multiplication
    /// when solves are short; the factor then jumps to the point where the
    /// timeout itself grows by `timeout_growth`.
    fn grow_timeout(
        &mut self,
        stats: &SearchStats,
        target: Target,
        num_flows: usize,
        current: Duration,
    ) {
        self.timeout_factor *= self.cfg.timeout_growth;
        if self.timeout(stats, target, num_flows) > current {
            return;
        }
        let Some(avg) = stats.average() else {
            return;
        };
        let mut per_unit = avg.as_secs_f64();
        if let Target::AllFlows = target {
            per_unit *= num_flows.max(1) as f64;
        }
        if per_unit > 0.0 {
            let needed = current.as_secs_f64() * self.cfg.timeout_growth / per_unit;
            self.timeout_factor = self.timeout_factor.max(needed);
        }
    }

    /// One attempt from `state`.
    pub fn step<O: DelayOracle + ?Sized>(
        &mut self,
        oracle: &mut O,
        net: &Network,
        forest: &Forest,
        target: Target,
        stats: &SearchStats,
        state: AttemptState,
    ) -> Step {
        let factor = self.cfg.scale_factors[state.scale_index];
        let scaled = net.scaled(factor);
        let timeout = self.timeout(stats, target, net.num_flows());
        let arity = target.arity(net);
        let err = match oracle
            .attempt_solve(&scaled, forest, target, timeout)
            .and_then(|d| check_delays(d, arity))
        {
            Ok(delays) => return Step::Solved(delays),
            Err(err) => err,
        };
        match err.kind.recovery() {
            Recovery::Rescale if state.scale_index + 1 < self.cfg.scale_factors.len() => {
                tracing::debug!(kind = %err.kind, scale = factor, "rescaling and retrying");
                Step::Retry(AttemptState {
                    scale_index: state.scale_index + 1,
                    ..state
                })
            }
            Recovery::GrowTimeout
                if timeout < self.cfg.hard_timeout
                    && state.growth_steps < self.cfg.max_timeout_growth_steps =>
            {
                self.grow_timeout(stats, target, net.num_flows(), timeout);
                tracing::debug!(
                    timeout_secs = timeout.as_secs_f64(),
                    factor = self.timeout_factor,
                    "suboptimal solution, growing timeout"
                );
                Step::Retry(AttemptState {
                    growth_steps: state.growth_steps + 1,
                    ..state
                })
            }
            _ => {
                if err.kind == SolveErrorKind::Unclassified {
                    tracing::warn!(%forest, detail = %err.detail, "unclassified solver output");
                } else {
                    tracing::debug!(%forest, kind = %err.kind, "giving up on forest");
                }
                Step::GiveUp(err.kind)
            }
        }
    }

    /// Repeat [`step`](Self::step) until the forest is solved or given up.
    pub fn solve<O: DelayOracle + ?Sized>(
        &mut self,
        oracle: &mut O,
        net: &Network,
        forest: &Forest,
        target: Target,
        stats: &SearchStats,
    ) -> SolveOutcome {
        let mut state = AttemptState::default();
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.step(oracle, net, forest, target, stats, state) {
                Step::Solved(delays) => {
                    return SolveOutcome {
                        delays,
                        failure: None,
                        attempts,
                    }
                }
                Step::Retry(next) => state = next,
                Step::GiveUp(kind) => {
                    return SolveOutcome {
                        delays: vec![f64::INFINITY; target.arity(net)],
                        failure: Some(kind),
                        attempts,
                    }
                }
            }
        }
    }
}

fn check_delays(delays: Vec<f64>, arity: usize) -> std::result::Result<Vec<f64>, SolveError> {
    if delays.len() != arity {
        return Err(SolveError::new(
            SolveErrorKind::Unclassified,
            format!("expected {arity} delays, got {}", delays.len()),
        ));
    }
    if let Some(d) = delays.iter().find(|d| d.is_nan() || **d < 0.0) {
        return Err(SolveError::new(
            SolveErrorKind::Unclassified,
            format!("invalid delay value {d}"),
        ));
    }
    Ok(delays)
}
