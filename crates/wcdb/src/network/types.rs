//! Curve, server, flow and network descriptors.
//!
//! A `Network` is immutable once built: scaling produces a new value and the
//! derived edge list is computed exactly once in `Network::new`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Rate-latency service curve `β(t) = R (t - T)_+`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateLatency {
    pub rate: f64,
    pub latency: f64,
}

impl RateLatency {
    #[inline]
    pub fn new(rate: f64, latency: f64) -> Self {
        Self { rate, latency }
    }
}

/// Token-bucket curve `γ(t) = σ + ρ t`, used for arrival curves and shapers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenBucket {
    pub sigma: f64,
    pub rho: f64,
}

impl TokenBucket {
    #[inline]
    pub fn new(sigma: f64, rho: f64) -> Self {
        Self { sigma, rho }
    }
}

/// Server: max of rate-latency service curves, min of token-bucket shapers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub service_curves: Vec<RateLatency>,
    pub shapers: Vec<TokenBucket>,
}

impl Server {
    pub fn new(service_curves: Vec<RateLatency>, shapers: Vec<TokenBucket>) -> Self {
        Self {
            service_curves,
            shapers,
        }
    }
}

/// Flow: min of token-bucket arrival curves plus the ordered servers it crosses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub arrival_curves: Vec<TokenBucket>,
    pub path: Vec<usize>,
}

impl Flow {
    pub fn new(arrival_curves: Vec<TokenBucket>, path: Vec<usize>) -> Self {
        Self {
            arrival_curves,
            path,
        }
    }

    /// Consecutive server pairs along the path.
    pub fn path_edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.path.windows(2).map(|w| Edge::new(w[0], w[1]))
    }
}

/// Directed server-to-server edge. Serialised as a `[src, dst]` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Edge {
    pub src: usize,
    pub dst: usize,
}

impl Edge {
    #[inline]
    pub const fn new(src: usize, dst: usize) -> Self {
        Self { src, dst }
    }

    /// Relabel both endpoints by `+k mod n`.
    #[inline]
    pub fn rotated(self, k: usize, n: usize) -> Self {
        Self::new((self.src + k) % n, (self.dst + k) % n)
    }
}

impl From<(usize, usize)> for Edge {
    fn from((src, dst): (usize, usize)) -> Self {
        Self::new(src, dst)
    }
}

impl From<Edge> for (usize, usize) {
    fn from(e: Edge) -> Self {
        (e.src, e.dst)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.src, self.dst)
    }
}

/// FIFO network: servers, flows and the derived edge set.
///
/// Edges appear in first-appearance order (flows in order, each path front to
/// back) without duplicates. Exhaustive forest enumeration follows this order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NetworkRepr", into = "NetworkRepr")]
pub struct Network {
    servers: Vec<Server>,
    flows: Vec<Flow>,
    edges: Vec<Edge>,
}

#[derive(Clone, Serialize, Deserialize)]
struct NetworkRepr {
    servers: Vec<Server>,
    flows: Vec<Flow>,
}

impl TryFrom<NetworkRepr> for Network {
    type Error = Error;

    fn try_from(r: NetworkRepr) -> Result<Self> {
        Network::new(r.servers, r.flows)
    }
}

impl From<Network> for NetworkRepr {
    fn from(n: Network) -> Self {
        Self {
            servers: n.servers,
            flows: n.flows,
        }
    }
}

fn check_param(value: f64, what: &str) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidNetwork(format!(
            "{what} must be finite and non-negative, got {value}"
        )));
    }
    Ok(())
}

impl Network {
    pub fn new(servers: Vec<Server>, flows: Vec<Flow>) -> Result<Self> {
        for s in &servers {
            for c in &s.service_curves {
                check_param(c.rate, "service rate")?;
                check_param(c.latency, "service latency")?;
            }
            for c in &s.shapers {
                check_param(c.sigma, "shaper burst")?;
                check_param(c.rho, "shaper rate")?;
            }
        }
        let mut edges = Vec::new();
        for (i, flow) in flows.iter().enumerate() {
            if flow.path.is_empty() {
                return Err(Error::InvalidNetwork(format!("flow {i} has an empty path")));
            }
            if let Some(&bad) = flow.path.iter().find(|&&s| s >= servers.len()) {
                return Err(Error::InvalidNetwork(format!(
                    "flow {i} crosses server {bad} but the network has {} servers",
                    servers.len()
                )));
            }
            for c in &flow.arrival_curves {
                check_param(c.sigma, "arrival burst")?;
                check_param(c.rho, "arrival rate")?;
            }
            for e in flow.path_edges() {
                if !edges.contains(&e) {
                    edges.push(e);
                }
            }
        }
        Ok(Self {
            servers,
            flows,
            edges,
        })
    }

    #[inline]
    pub fn num_servers(&self) -> usize {
        self.servers.len()
    }

    #[inline]
    pub fn num_flows(&self) -> usize {
        self.flows.len()
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn contains_edge(&self, e: Edge) -> bool {
        self.edges.contains(&e)
    }

    pub fn flow(&self, foi: usize) -> Result<&Flow> {
        self.flows.get(foi).ok_or(Error::FlowOutOfRange {
            foi,
            num_flows: self.flows.len(),
        })
    }

    /// Multiply every rate and burst by `factor`; latencies are left untouched.
    pub fn scaled(&self, factor: f64) -> Network {
        if factor == 1.0 {
            return self.clone();
        }
        let servers = self
            .servers
            .iter()
            .map(|s| Server {
                service_curves: s
                    .service_curves
                    .iter()
                    .map(|c| RateLatency::new(c.rate * factor, c.latency))
                    .collect(),
                shapers: s
                    .shapers
                    .iter()
                    .map(|c| TokenBucket::new(c.sigma * factor, c.rho * factor))
                    .collect(),
            })
            .collect();
        let flows = self
            .flows
            .iter()
            .map(|f| Flow {
                arrival_curves: f
                    .arrival_curves
                    .iter()
                    .map(|c| TokenBucket::new(c.sigma * factor, c.rho * factor))
                    .collect(),
                path: f.path.clone(),
            })
            .collect();
        Network {
            servers,
            flows,
            edges: self.edges.clone(),
        }
    }

    /// Rotation degree if the network is a rotationally symmetric cycle.
    ///
    /// Holds when there are as many flows as servers (at least two), all servers
    /// are identical, all flows share the same arrival curves, and flow `i` is
    /// flow 0 with every server relabelled by `+i mod N`.
    pub fn symmetric_cycle(&self) -> Option<usize> {
        let n = self.num_servers();
        if n < 2 || self.num_flows() != n {
            return None;
        }
        let s0 = &self.servers[0];
        if self.servers.iter().any(|s| s != s0) {
            return None;
        }
        let f0 = &self.flows[0];
        for (i, f) in self.flows.iter().enumerate() {
            if f.arrival_curves != f0.arrival_curves || f.path.len() != f0.path.len() {
                return None;
            }
            if f.path.iter().zip(&f0.path).any(|(&p, &q)| p != (q + i) % n) {
                return None;
            }
        }
        Some(n)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Network: {} servers, {} flows, {} edges",
            self.num_servers(),
            self.num_flows(),
            self.edges.len()
        )?;
        for (i, s) in self.servers.iter().enumerate() {
            write!(f, "  server {i}: β = max[")?;
            for c in &s.service_curves {
                write!(f, " {}(t - {})_+", c.rate, c.latency)?;
            }
            write!(f, " ]; σ = min[")?;
            for c in &s.shapers {
                write!(f, " {} + {}t", c.sigma, c.rho)?;
            }
            writeln!(f, " ]")?;
        }
        for (i, fl) in self.flows.iter().enumerate() {
            write!(f, "  flow {i}: α = min[")?;
            for c in &fl.arrival_curves {
                write!(f, " {} + {}t", c.sigma, c.rho)?;
            }
            writeln!(f, " ]; π = {:?}", fl.path)?;
        }
        Ok(())
    }
}
