//! Oracle backed by an external solver program.
//!
//! Protocol
//! - The request `{network, forest, target, timeout_secs}` is written as JSON to a
//!   temporary file, by default in the system temp dir.
//! - The program runs as `program [args..] --timeout <secs> <request-file>` and
//!   prints lp_solve-style output on stdout (see `classify`).
//! - The request file is removed when the attempt ends, whatever its outcome.
//! - A program still running `grace` after its timeout is killed and the attempt
//!   counts as a timeout.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::classify::parse_solver_output;
use super::types::{DelayOracle, SolveError, SolveErrorKind, Target};
use crate::forest::Forest;
use crate::network::Network;

#[derive(Serialize)]
struct SolveRequest<'a> {
    network: &'a Network,
    forest: &'a Forest,
    target: Target,
    timeout_secs: u64,
}

/// Slack past the requested timeout before the program is killed.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Clone, Debug)]
pub struct CommandOracle {
    program: PathBuf,
    args: Vec<String>,
    temp_dir: Option<PathBuf>,
    grace: Duration,
}

impl CommandOracle {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            temp_dir: None,
            grace: DEFAULT_GRACE,
        }
    }

    /// Extra argument passed before `--timeout`.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Folder for request files; must exist.
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// Whole seconds, rounded up.
fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

fn failure(what: &str, err: impl std::fmt::Display) -> SolveError {
    SolveError::new(SolveErrorKind::SolverFailure, format!("{what}: {err}"))
}

impl DelayOracle for CommandOracle {
    fn attempt_solve(
        &mut self,
        net: &Network,
        forest: &Forest,
        target: Target,
        timeout: Duration,
    ) -> Result<Vec<f64>, SolveError> {
        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("wcdb-request-").suffix(".json");
            b
        };
        let mut request = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| failure("creating request file", e))?;
        let timeout_secs = ceil_secs(timeout);
        let body = SolveRequest {
            network: net,
            forest,
            target,
            timeout_secs,
        };
        serde_json::to_writer(&mut request, &body).map_err(|e| failure("writing request", e))?;
        request
            .flush()
            .map_err(|e| failure("writing request", e))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("--timeout")
            .arg(timeout_secs.to_string())
            .arg(request.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| failure(&format!("running {}", self.program.display()), e))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| failure("capturing solver output", "no stdout pipe"))?;
        // Drain stdout while waiting on the child.
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        let deadline = Instant::now() + Duration::from_secs(timeout_secs) + self.grace;
        let status = loop {
            match child.try_wait().map_err(|e| failure("waiting for solver", e))? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::warn!(
                        program = %self.program.display(),
                        timeout_secs,
                        "solver overran its timeout, killed"
                    );
                    return Err(SolveError::new(
                        SolveErrorKind::TimeoutError,
                        format!("killed after {timeout_secs}s plus {:?} grace", self.grace),
                    ));
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };
        let stdout = reader
            .join()
            .map_err(|_| failure("reading solver output", "reader thread panicked"))?
            .map_err(|e| failure("reading solver output", e))?;
        tracing::trace!(status = ?status.code(), "solver exited");
        parse_solver_output(&String::from_utf8_lossy(&stdout), target.arity(net))
        // `request` drops here and deletes the file.
    }
}
