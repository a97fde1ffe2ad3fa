use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::fmt::SubscriberBuilder;
use wcdb::api::{
    correlations, heuristic_rankings, results_table, Analysis, AnalysisCfg, CommandOracle,
    DisplayUnit, ForestGeneration, GenerationCfg, Heuristic, Network, NetworkType, RetryCfg,
    SavedResults, Topology, TopologyParams, DEFAULT_FAIL_LIMIT,
};

mod export;
mod progress;
mod provenance;

use progress::LogProgress;
use provenance::Payload;

#[derive(Parser)]
#[command(name = "wcdb")]
#[command(about = "Worst-case delay bounds for FIFO networks by forest search")]
struct Cmd {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Build a network and print it (or write it as JSON)
    Network {
        #[command(flatten)]
        net: NetArgs,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Search the generated forests for the tightest delay bounds
    Search {
        #[command(flatten)]
        net: NetArgs,
        #[command(flatten)]
        gen: GenArgs,
        #[command(flatten)]
        solver: SolverArgs,
        /// Flow of interest; all flows when omitted
        #[arg(long)]
        foi: Option<usize>,
        /// Results JSON to write
        #[arg(long)]
        out: PathBuf,
        /// Also export results as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        #[command(flatten)]
        units: UnitArgs,
    },
    /// Solve a single heuristic forest
    Heuristic {
        #[command(flatten)]
        net: NetArgs,
        #[command(flatten)]
        solver: SolverArgs,
        #[arg(long, default_value_t = 0)]
        foi: usize,
        #[arg(long, value_enum, default_value_t = HeuristicKind::Forest)]
        kind: HeuristicKind,
        /// Component depth bound; negative means unbounded
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        max_depth: i64,
    },
    /// Print result tables from a saved results file
    Table {
        #[arg(long)]
        results: PathBuf,
        #[arg(long)]
        foi: Option<usize>,
        #[command(flatten)]
        units: UnitArgs,
    },
    /// Correlations, heuristic rankings and a per-flow summary
    Stats {
        #[arg(long)]
        results: PathBuf,
        #[arg(long, default_value_t = 0)]
        foi: usize,
        /// Depth bound for the bounded heuristics; negative means unbounded
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        max_depth: i64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TopologyArg {
    TandemSinkTree,
    TandemInterleaved,
    TandemSourceSink,
    RingFull,
    RingSemi,
    RingCompleteFull,
    RingCompleteSemi,
    MeshSimple,
}

impl From<TopologyArg> for Topology {
    fn from(t: TopologyArg) -> Self {
        match t {
            TopologyArg::TandemSinkTree => Topology::TandemSinkTree,
            TopologyArg::TandemInterleaved => Topology::TandemInterleaved,
            TopologyArg::TandemSourceSink => Topology::TandemSourceSink,
            TopologyArg::RingFull => Topology::RingFull,
            TopologyArg::RingSemi => Topology::RingSemi,
            TopologyArg::RingCompleteFull => Topology::RingCompleteFull,
            TopologyArg::RingCompleteSemi => Topology::RingCompleteSemi,
            TopologyArg::MeshSimple => Topology::MeshSimple,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NetworkTypeArg {
    Symmetric,
    AsymmetricFlow,
    AsymmetricServer,
}

impl From<NetworkTypeArg> for NetworkType {
    fn from(t: NetworkTypeArg) -> Self {
        match t {
            NetworkTypeArg::Symmetric => NetworkType::Symmetric,
            NetworkTypeArg::AsymmetricFlow => NetworkType::AsymmetricFlow,
            NetworkTypeArg::AsymmetricServer => NetworkType::AsymmetricServer,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum HeuristicKind {
    /// Unbounded-depth flow-preserving forest
    Forest,
    /// Depth-bounded flow-preserving forest
    Bounded,
    /// Depth-bounded single-component tree
    Quick,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum UnitArg {
    Us,
    Ms,
    S,
    Min,
    H,
}

impl From<UnitArg> for DisplayUnit {
    fn from(u: UnitArg) -> Self {
        match u {
            UnitArg::Us => DisplayUnit::MicroSecond,
            UnitArg::Ms => DisplayUnit::MilliSecond,
            UnitArg::S => DisplayUnit::Second,
            UnitArg::Min => DisplayUnit::Minute,
            UnitArg::H => DisplayUnit::Hour,
        }
    }
}

#[derive(Args, Debug)]
struct NetArgs {
    /// Network JSON file; overrides the topology flags
    #[arg(long)]
    network: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = TopologyArg::RingFull)]
    topology: TopologyArg,
    #[arg(long, default_value_t = 4)]
    servers: usize,
    #[arg(long, value_enum, default_value_t = NetworkTypeArg::Symmetric)]
    network_type: NetworkTypeArg,
    /// Server rate
    #[arg(long, default_value_t = 1e7)]
    rate: f64,
    /// Server latency (s)
    #[arg(long, default_value_t = 1e-5)]
    latency: f64,
    /// Flow burst
    #[arg(long, default_value_t = 8.0)]
    burst: f64,
    /// Load of the most loaded server, in (0, 1)
    #[arg(long, default_value_t = 0.5)]
    load: f64,
}

impl NetArgs {
    fn build(&self) -> Result<Network> {
        if let Some(path) = &self.network {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            return serde_json::from_str(&text)
                .with_context(|| format!("parsing network {}", path.display()));
        }
        let params = TopologyParams {
            rate: self.rate,
            latency: self.latency,
            burst: self.burst,
            servers: self.servers,
            load: self.load,
            network_type: self.network_type.into(),
        };
        Ok(Topology::from(self.topology).build(&params)?)
    }

    fn params(&self) -> serde_json::Value {
        serde_json::json!({
            "network": self.network,
            "topology": format!("{:?}", self.topology),
            "servers": self.servers,
            "network_type": format!("{:?}", self.network_type),
            "rate": self.rate,
            "latency": self.latency,
            "burst": self.burst,
            "load": self.load,
        })
    }
}

#[derive(Args, Debug)]
struct GenArgs {
    /// Sample this many forests instead of enumerating all of them
    #[arg(long)]
    partial: Option<usize>,
    #[arg(long, default_value_t = 0)]
    min_edges: usize,
    /// Seed for partial sampling
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Consecutive rejected samples before giving up
    #[arg(long, default_value_t = DEFAULT_FAIL_LIMIT)]
    fail_limit: usize,
}

impl GenArgs {
    fn cfg(&self) -> GenerationCfg {
        GenerationCfg {
            mode: match self.partial {
                Some(num_forests) => ForestGeneration::Partial { num_forests },
                None => ForestGeneration::All,
            },
            min_edges: self.min_edges,
            seed: self.seed,
            fail_limit: self.fail_limit,
        }
    }
}

#[derive(Args, Debug)]
struct SolverArgs {
    /// Solver program, run as `<solver> [args] --timeout <secs> <request.json>`
    #[arg(long)]
    solver: PathBuf,
    /// Extra solver argument (repeatable)
    #[arg(long = "solver-arg")]
    solver_args: Vec<String>,
    /// Folder for solver request files
    #[arg(long)]
    temp_dir: Option<PathBuf>,
    /// Hard per-solve timeout (s)
    #[arg(long, default_value_t = 600)]
    hard_timeout: u64,
    /// Rate/burst scale factors tried in order
    #[arg(long, value_delimiter = ',', default_values_t = vec![1.0, 0.1, 10.0])]
    scale_factors: Vec<f64>,
    /// Seconds a solver may run past its timeout before it is killed
    #[arg(long, default_value_t = 5)]
    solver_grace: u64,
}

impl SolverArgs {
    fn oracle(&self) -> CommandOracle {
        let mut oracle =
            CommandOracle::new(&self.solver).grace(Duration::from_secs(self.solver_grace));
        for a in &self.solver_args {
            oracle = oracle.arg(a);
        }
        match &self.temp_dir {
            Some(dir) => oracle.temp_dir(dir),
            None => oracle,
        }
    }

    fn retry(&self) -> RetryCfg {
        RetryCfg {
            scale_factors: self.scale_factors.clone(),
            hard_timeout: Duration::from_secs(self.hard_timeout),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
struct UnitArgs {
    #[arg(long, value_enum, default_value_t = UnitArg::S)]
    delay_unit: UnitArg,
    #[arg(long, value_enum, default_value_t = UnitArg::S)]
    runtime_unit: UnitArg,
}

/// Negative depth bounds mean unbounded.
fn depth_bound(max_depth: i64) -> Option<usize> {
    usize::try_from(max_depth).ok()
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = match cmd.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    match cmd.action {
        Action::Network { net, out } => network(net, out),
        Action::Search {
            net,
            gen,
            solver,
            foi,
            out,
            csv,
            units,
        } => search(net, gen, solver, foi, out, csv, units),
        Action::Heuristic {
            net,
            solver,
            foi,
            kind,
            max_depth,
        } => heuristic(net, solver, foi, kind, max_depth),
        Action::Table {
            results,
            foi,
            units,
        } => table(results, foi, units),
        Action::Stats {
            results,
            foi,
            max_depth,
        } => stats(results, foi, max_depth),
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}

fn network(args: NetArgs, out: Option<PathBuf>) -> Result<()> {
    let net = args.build()?;
    tracing::info!(
        servers = net.num_servers(),
        flows = net.num_flows(),
        edges = net.edges().len(),
        symmetric = ?net.symmetric_cycle(),
        "network"
    );
    match out {
        Some(path) => {
            ensure_parent(&path)?;
            std::fs::write(&path, serde_json::to_vec_pretty(&net)?)
                .with_context(|| format!("writing {}", path.display()))?;
            provenance::write_sidecar(&path, Payload::new(args.params()))?;
        }
        None => println!("{net}"),
    }
    Ok(())
}

fn search(
    net_args: NetArgs,
    gen: GenArgs,
    solver: SolverArgs,
    foi: Option<usize>,
    out: PathBuf,
    csv: Option<PathBuf>,
    units: UnitArgs,
) -> Result<()> {
    let net = net_args.build()?;
    let cfg = AnalysisCfg {
        generation: gen.cfg(),
        retry: solver.retry(),
    };
    let mut progress = LogProgress::default();
    let mut analysis = Analysis::new(net, cfg, solver.oracle(), &mut progress)
        .context("preparing the analysis")?;
    match foi {
        Some(foi) => {
            analysis.exhaustive_search(foi, &mut progress)?;
        }
        None => {
            analysis.exhaustive_search_all_flows(&mut progress)?;
        }
    }

    let flows: Vec<usize> = match foi {
        Some(foi) => vec![foi],
        None => (0..analysis.network().num_flows()).collect(),
    };
    for f in flows {
        print!(
            "{}",
            results_table(
                f,
                analysis.results_for(f),
                units.delay_unit.into(),
                units.runtime_unit.into()
            )
        );
    }

    let params = serde_json::json!({
        "net": net_args.params(),
        "generation": analysis.cfg().generation,
        "retry": analysis.cfg().retry,
        "solver": solver.solver,
        "foi": foi,
    });
    let saved = analysis.saved_results();
    ensure_parent(&out)?;
    saved.save(&out)?;
    let mut payload = Payload::new(params.clone());
    if let Some(path) = &net_args.network {
        payload = payload.input(path);
    }
    provenance::write_sidecar(&out, payload)?;
    if let Some(csv) = csv {
        ensure_parent(&csv)?;
        export::write_csv(&saved.results, &csv)?;
        provenance::write_sidecar(&csv, Payload::new(params).input(&out))?;
    }
    Ok(())
}

fn heuristic(
    net_args: NetArgs,
    solver: SolverArgs,
    foi: usize,
    kind: HeuristicKind,
    max_depth: i64,
) -> Result<()> {
    let net = net_args.build()?;
    let mut h = Heuristic::new(net, solver.retry(), solver.oracle())?;
    let depth = depth_bound(max_depth);
    let entry = match kind {
        HeuristicKind::Forest => h.min_cut_forest(foi)?,
        HeuristicKind::Bounded => h.min_cut_forest_with_restricted_depth(foi, depth)?,
        HeuristicKind::Quick => h.min_cut_tree_with_restricted_depth(foi, depth)?,
    };
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}

fn table(results: PathBuf, foi: Option<usize>, units: UnitArgs) -> Result<()> {
    let saved = SavedResults::load(&results)?;
    let flows: Vec<usize> = match foi {
        Some(f) => vec![f],
        None => (0..saved.network.num_flows()).collect(),
    };
    for f in flows {
        if f >= saved.network.num_flows() {
            bail!(
                "flow {f} out of range (network has {} flows)",
                saved.network.num_flows()
            );
        }
        print!(
            "{}",
            results_table(
                f,
                saved.results.get(&f).map(Vec::as_slice),
                units.delay_unit.into(),
                units.runtime_unit.into()
            )
        );
    }
    Ok(())
}

fn stats(results: PathBuf, foi: usize, max_depth: i64) -> Result<()> {
    let saved = SavedResults::load(&results)?;
    let entries = saved
        .results
        .get(&foi)
        .with_context(|| format!("no results for flow {foi}"))?;
    let corr = correlations(entries);
    let depth = depth_bound(max_depth);
    let rankings = match heuristic_rankings(&saved.network, &saved.results, foi, depth) {
        Ok(r) => Some(r),
        Err(e) => {
            tracing::warn!(error = %e, "heuristic rankings unavailable");
            None
        }
    };
    let report = serde_json::json!({
        "foi": foi,
        "correlations": corr,
        "heuristic_rankings": rankings,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    let summary = export::summary(export::results_frame(&saved.results)?)?;
    println!("{summary}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cmd::command().debug_assert();
    }

    #[test]
    fn negative_depth_is_unbounded() {
        assert_eq!(depth_bound(-1), None);
        assert_eq!(depth_bound(0), Some(0));
        assert_eq!(depth_bound(3), Some(3));
    }

    #[test]
    fn search_args_map_onto_configs() {
        let cmd = Cmd::try_parse_from([
            "wcdb",
            "-v",
            "search",
            "--topology",
            "tandem-sink-tree",
            "--servers",
            "5",
            "--partial",
            "12",
            "--seed",
            "3",
            "--solver",
            "/bin/true",
            "--scale-factors",
            "1,0.5",
            "--out",
            "out/results.json",
        ])
        .unwrap();
        assert_eq!(cmd.verbose, 1);
        let Action::Search {
            net, gen, solver, ..
        } = cmd.action
        else {
            panic!("expected search");
        };
        assert_eq!(net.build().unwrap().num_servers(), 5);
        let g = gen.cfg();
        assert_eq!(g.mode, ForestGeneration::Partial { num_forests: 12 });
        assert_eq!(g.seed, 3);
        let r = solver.retry();
        assert_eq!(r.scale_factors, vec![1.0, 0.5]);
        assert_eq!(r.hard_timeout, Duration::from_secs(600));
    }

    #[test]
    fn network_file_overrides_topology() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.json");
        let net = Topology::MeshSimple
            .build(&TopologyParams::default())
            .unwrap();
        std::fs::write(&path, serde_json::to_vec(&net).unwrap()).unwrap();
        let cmd = Cmd::try_parse_from([
            "wcdb",
            "network",
            "--network",
            path.to_str().unwrap(),
        ])
        .unwrap();
        let Action::Network { net: args, .. } = cmd.action else {
            panic!("expected network");
        };
        assert_eq!(args.build().unwrap(), net);
    }

    #[test]
    fn heuristic_accepts_negative_depth() {
        let cmd = Cmd::try_parse_from([
            "wcdb",
            "heuristic",
            "--solver",
            "lp",
            "--kind",
            "quick",
            "--max-depth",
            "-1",
        ])
        .unwrap();
        let Action::Heuristic {
            kind, max_depth, ..
        } = cmd.action
        else {
            panic!("expected heuristic");
        };
        assert_eq!(kind, HeuristicKind::Quick);
        assert_eq!(depth_bound(max_depth), None);
    }
}
