//! Parametric builders for the common tandem, ring and mesh topologies.
//!
//! Conventions
//! - Latency is in seconds; rate and burst share any unit pair with
//!   `rate = burst / latency` (kb/s and kb keep solver inputs well scaled).
//! - Every server gets `RateLatency(R, L)` and shaper `TokenBucket(0, R)`; every
//!   flow gets `TokenBucket(S, load * R / max_flows)` where `max_flows` is the
//!   largest number of flows crossing one server in that topology.

use serde::{Deserialize, Serialize};

use super::types::{Flow, Network, RateLatency, Server, TokenBucket};
use crate::error::{Error, Result};

/// Rate multiplier applied to the "other" flows or servers in asymmetric variants.
pub const ASYMMETRY_FACTOR: f64 = 0.8;

/// How curve parameters vary across servers and flows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkType {
    Symmetric,
    /// Flow 0 keeps its rate; every other flow is slowed by `ASYMMETRY_FACTOR`.
    AsymmetricFlow,
    /// Server 0 keeps its rate; every other server is sped up by `1 / ASYMMETRY_FACTOR`.
    AsymmetricServer,
}

/// Named topology families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    /// One flow starting at each server, all ending at the sink.
    TandemSinkTree,
    /// One end-to-end flow plus 2-server flows between neighbours.
    TandemInterleaved,
    /// One end-to-end flow plus, for each split point, a head and a tail flow.
    TandemSourceSink,
    /// N circular flows of length N.
    RingFull,
    /// N circular flows of length N/2 + 1.
    RingSemi,
    /// Circular flows of every length 1..=N from every server.
    RingCompleteFull,
    /// Circular flows of every length 1..=N/2 + 1 from every server.
    RingCompleteSemi,
    /// Two rows of N servers feeding a sink; one flow per row choice sequence.
    MeshSimple,
}

/// Generic topology parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TopologyParams {
    pub rate: f64,
    pub latency: f64,
    pub burst: f64,
    /// Number of servers (mesh: length of each row).
    pub servers: usize,
    /// Maximum utilisation of a server, in `(0, 1]`.
    pub load: f64,
    pub network_type: NetworkType,
}

impl Default for TopologyParams {
    fn default() -> Self {
        Self {
            rate: 1e7,
            latency: 1e-5,
            burst: 8.0,
            servers: 4,
            load: 0.5,
            network_type: NetworkType::Symmetric,
        }
    }
}

impl TopologyParams {
    fn validate(&self) -> Result<()> {
        let bad = |reason: &str| Err(Error::InvalidNetwork(reason.to_string()));
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return bad("rate must be > 0");
        }
        if !(self.latency.is_finite() && self.latency >= 0.0) {
            return bad("latency must be >= 0");
        }
        if !(self.burst.is_finite() && self.burst >= 0.0) {
            return bad("burst must be >= 0");
        }
        if self.servers == 0 {
            return bad("need at least one server");
        }
        if !(self.load > 0.0 && self.load <= 1.0) {
            return bad("load must lie in (0, 1]");
        }
        Ok(())
    }
}

impl Topology {
    pub fn build(self, p: &TopologyParams) -> Result<Network> {
        p.validate()?;
        let n = p.servers;
        match self {
            Topology::TandemSinkTree => {
                let paths = (0..n).map(|i| (i..n).collect()).collect();
                generic(p, n, paths, n)
            }
            Topology::TandemInterleaved => {
                let mut paths: Vec<Vec<usize>> = vec![(0..n).collect()];
                paths.extend((0..n.saturating_sub(1)).map(|i| vec![i, i + 1]));
                generic(p, n, paths, 3)
            }
            Topology::TandemSourceSink => {
                let mut paths: Vec<Vec<usize>> = vec![(0..n).collect()];
                for i in 1..n {
                    paths.push((0..i).collect());
                    paths.push((i..n).collect());
                }
                generic(p, n, paths, n)
            }
            Topology::RingFull => {
                let paths = (0..n).map(|i| ring_path(i, n, n)).collect();
                generic(p, n, paths, n)
            }
            Topology::RingSemi => {
                let len = n / 2 + 1;
                let paths = (0..n).map(|i| ring_path(i, len, n)).collect();
                generic(p, n, paths, len)
            }
            Topology::RingCompleteFull => {
                let mut paths = Vec::with_capacity(n * n);
                for i in 0..n {
                    for len in (1..=n).rev() {
                        paths.push(ring_path(i, len, n));
                    }
                }
                generic(p, n, paths, n * (n + 1) / 2)
            }
            Topology::RingCompleteSemi => {
                let half = n / 2;
                let mut paths = Vec::with_capacity(n * (half + 1));
                for i in 0..n {
                    for len in (1..=half + 1).rev() {
                        paths.push(ring_path(i, len, n));
                    }
                }
                generic(p, n, paths, (half + 1) * (half + 2) / 2)
            }
            Topology::MeshSimple => mesh_simple(p),
        }
    }
}

/// `len` consecutive servers of an `n`-ring starting at `start`.
fn ring_path(start: usize, len: usize, n: usize) -> Vec<usize> {
    (start..start + len).map(|s| s % n).collect()
}

fn generic(p: &TopologyParams, n: usize, paths: Vec<Vec<usize>>, max_flows: usize) -> Result<Network> {
    let server = Server::new(
        vec![RateLatency::new(p.rate, p.latency)],
        vec![TokenBucket::new(0.0, p.rate)],
    );
    let mut servers = vec![server; n];
    let arrival = TokenBucket::new(p.burst, p.load * p.rate / max_flows as f64);
    let mut flows: Vec<Flow> = paths
        .into_iter()
        .map(|path| Flow::new(vec![arrival], path))
        .collect();
    match p.network_type {
        NetworkType::Symmetric => {}
        NetworkType::AsymmetricFlow => {
            for f in flows.iter_mut().skip(1) {
                let a = f.arrival_curves[0];
                f.arrival_curves = vec![TokenBucket::new(a.sigma, ASYMMETRY_FACTOR * a.rho)];
            }
        }
        NetworkType::AsymmetricServer => {
            for s in servers.iter_mut().skip(1) {
                let sc = s.service_curves[0];
                let sh = s.shapers[0];
                *s = Server::new(
                    vec![RateLatency::new(sc.rate / ASYMMETRY_FACTOR, sc.latency)],
                    vec![TokenBucket::new(0.0, sh.rho / ASYMMETRY_FACTOR)],
                );
            }
        }
    }
    Network::new(servers, flows)
}

fn mesh_simple(p: &TopologyParams) -> Result<Network> {
    if p.network_type != NetworkType::Symmetric {
        return Err(Error::InvalidNetwork(
            "asymmetric mesh networks are not supported".to_string(),
        ));
    }
    let n = p.servers;
    let sink = 2 * n;
    // One path per binary row choice in each column: column i uses server 2i or 2i+1.
    let mut paths = Vec::with_capacity(1 << n);
    for choice in 0..(1usize << n) {
        let mut path: Vec<usize> = (0..n)
            .map(|i| 2 * i + ((choice >> (n - 1 - i)) & 1))
            .collect();
        path.push(sink);
        paths.push(path);
    }
    let row = Server::new(
        vec![RateLatency::new(p.rate, p.latency)],
        vec![TokenBucket::new(0.0, p.rate)],
    );
    let sink_server = Server::new(
        vec![RateLatency::new(2.0 * p.rate, p.latency)],
        vec![TokenBucket::new(0.0, 2.0 * p.rate)],
    );
    let mut servers = vec![row; 2 * n];
    servers.push(sink_server);
    let arrival = TokenBucket::new(p.burst, p.load * p.rate / (1u64 << (n - 1)) as f64);
    let flows = paths
        .into_iter()
        .map(|path| Flow::new(vec![arrival], path))
        .collect();
    Network::new(servers, flows)
}

/// Explicit construction from `(service curves, shapers)` and `(arrival curves, path)` tuples.
pub fn custom(
    servers: Vec<(Vec<RateLatency>, Vec<TokenBucket>)>,
    flows: Vec<(Vec<TokenBucket>, Vec<usize>)>,
) -> Result<Network> {
    Network::new(
        servers
            .into_iter()
            .map(|(sc, sh)| Server::new(sc, sh))
            .collect(),
        flows
            .into_iter()
            .map(|(ac, path)| Flow::new(ac, path))
            .collect(),
    )
}
