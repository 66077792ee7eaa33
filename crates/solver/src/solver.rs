use std::io::Write;
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

use basalt_smtlib::script::Script;

use crate::config::{SolverConfig, SolverKind};
use crate::error::SolverError;
use crate::parser::parse_solver_output;
use crate::result::SolverResult;

/// How often a timed query polls the solver process for exit.
const EXIT_POLL: Duration = Duration::from_millis(25);

/// Slack granted on top of the solver's own timeout flag before the process
/// is killed outright. Covers startup cost and solvers that ignore the flag
/// on hard problems.
const KILL_GRACE_MS: u64 = 2_000;

/// Generic CLI-based SMT solver interface.
///
/// Communicates with any SMT-LIB2 compatible solver (Z3, CVC5, Yices)
/// by spawning it as a subprocess and piping SMT-LIB2 text.
#[derive(Debug)]
pub struct CliSolver {
    config: SolverConfig,
}

impl CliSolver {
    /// Create a new `CliSolver` with the given configuration.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Create a `CliSolver` with auto-detected solver location.
    pub fn with_default_config_for(kind: SolverKind) -> Result<Self, SolverError> {
        let config = SolverConfig::auto_detect_for(kind)?;
        Ok(Self { config })
    }

    /// Create a Z3 solver with auto-detected location and default settings.
    pub fn with_default_config() -> Result<Self, SolverError> {
        Self::with_default_config_for(SolverKind::Z3)
    }

    /// Get a reference to the solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Get the solver kind.
    pub fn kind(&self) -> SolverKind {
        self.config.kind
    }

    /// Check satisfiability of a Script.
    ///
    /// The script renders itself as a complete query (it closes with
    /// `(check-sat)` and `(get-model)` as needed).
    pub fn check_sat(&self, script: &Script) -> Result<SolverResult, SolverError> {
        self.check_sat_raw(&script.to_query_text())
    }

    /// Check satisfiability from a raw SMT-LIB2 string.
    pub fn check_sat_raw(&self, smtlib: &str) -> Result<SolverResult, SolverError> {
        self.config.validate()?;

        let solver_name = self.config.kind.to_string();
        tracing::trace!(solver = %solver_name, bytes = smtlib.len(), "Dispatching SMT query");

        let mut child = Command::new(&self.config.solver_path)
            .args(self.config.build_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SolverError::ProcessError(format!("Failed to start {solver_name}: {e}"))
            })?;

        // Write the query and drop stdin so the solver sees EOF.
        {
            let mut stdin = child.stdin.take().ok_or_else(|| {
                SolverError::ProcessError(format!("Failed to open {solver_name} stdin"))
            })?;
            stdin.write_all(smtlib.as_bytes()).map_err(|e| {
                SolverError::ProcessError(format!("Failed to write to {solver_name} stdin: {e}"))
            })?;
        }

        let output = match self.await_exit(child, &solver_name)? {
            Some(output) => output,
            None => {
                return Ok(SolverResult::Unknown(format!(
                    "{solver_name} ignored its {}ms timeout and was killed",
                    self.config.timeout_ms
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if stderr.contains("timeout") || stdout.trim() == "timeout" {
            return Ok(SolverResult::Unknown("timeout".to_string()));
        }

        parse_solver_output(&stdout, &stderr)
    }

    /// Wait for the solver to exit, enforcing the configured timeout.
    ///
    /// The solver is passed its own timeout flag (see
    /// `SolverKind::args`) and is expected to report "unknown" by itself;
    /// this is the backstop for solvers that keep running anyway. Polls
    /// `try_wait` until the deadline, then kills and reaps the process.
    /// Returns `None` when the process had to be killed.
    fn await_exit(
        &self,
        mut child: Child,
        solver_name: &str,
    ) -> Result<Option<Output>, SolverError> {
        let wait_err = |e: std::io::Error| {
            SolverError::ProcessError(format!("Failed to wait for {solver_name}: {e}"))
        };

        if self.config.timeout_ms == 0 {
            return child.wait_with_output().map(Some).map_err(wait_err);
        }

        let deadline = Instant::now() + Duration::from_millis(self.config.timeout_ms + KILL_GRACE_MS);
        loop {
            match child.try_wait().map_err(wait_err)? {
                Some(_) => return child.wait_with_output().map(Some).map_err(wait_err),
                None if Instant::now() >= deadline => {
                    tracing::warn!(solver = %solver_name, "Solver exceeded its timeout; killing");
                    let _ = child.kill();
                    // Reap the killed process; its output is worthless.
                    let _ = child.wait_with_output();
                    return Ok(None);
                }
                None => std::thread::sleep(EXIT_POLL),
            }
        }
    }
}
