use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SolverError;

/// Directories searched for solver binaries when PATH lookup fails.
const COMMON_BIN_DIRS: &[&str] = &["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"];

/// Supported SMT solver backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverKind {
    /// Z3 from Microsoft Research.
    Z3,
    /// CVC5 from Stanford/Iowa.
    Cvc5,
    /// Yices2 from SRI International.
    Yices,
}

impl SolverKind {
    /// Binary name used for PATH lookup.
    pub fn binary_name(&self) -> &'static str {
        match self {
            SolverKind::Z3 => "z3",
            SolverKind::Cvc5 => "cvc5",
            SolverKind::Yices => "yices-smt2",
        }
    }

    /// CLI arguments for one stdin-piped query, including the solver's own
    /// timeout flag when a timeout is configured.
    pub fn args(&self, timeout_ms: u64) -> Vec<String> {
        let mut args: Vec<String> = match self {
            SolverKind::Z3 => vec!["-in".into()],
            SolverKind::Cvc5 => {
                vec!["--lang".into(), "smt2".into(), "--produce-models".into()]
            }
            SolverKind::Yices => vec![],
        };
        if timeout_ms > 0 {
            args.push(match self {
                SolverKind::Z3 => format!("-t:{timeout_ms}"),
                SolverKind::Cvc5 => format!("--tlimit={timeout_ms}"),
                // Yices counts whole seconds; round up so a small timeout
                // does not become "no timeout".
                SolverKind::Yices => format!("--timeout={}", timeout_ms.div_ceil(1000)),
            });
        }
        args
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Z3 => write!(f, "Z3"),
            SolverKind::Cvc5 => write!(f, "CVC5"),
            SolverKind::Yices => write!(f, "Yices"),
        }
    }
}

impl std::str::FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "z3" => Ok(SolverKind::Z3),
            "cvc5" => Ok(SolverKind::Cvc5),
            "yices" | "yices2" | "yices-smt2" => Ok(SolverKind::Yices),
            _ => Err(format!(
                "Unknown solver: {s}. Valid options: z3, cvc5, yices"
            )),
        }
    }
}

/// Solver configuration.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Which solver to use.
    pub kind: SolverKind,
    /// Path to the solver binary.
    pub solver_path: PathBuf,
    /// Timeout in milliseconds (0 = no timeout).
    pub timeout_ms: u64,
    /// Additional solver arguments.
    pub extra_args: Vec<String>,
}

impl SolverConfig {
    /// Create a new config with the given solver kind and path.
    pub fn new(kind: SolverKind, solver_path: PathBuf) -> Self {
        Self {
            kind,
            solver_path,
            timeout_ms: 0,
            extra_args: Vec::new(),
        }
    }

    /// Create config with a specific timeout (in milliseconds).
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Add extra arguments for the solver.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Auto-detect the solver binary for the given kind.
    ///
    /// Candidates are the `which` result followed by the common install
    /// directories; the first existing path wins.
    pub fn auto_detect_for(kind: SolverKind) -> Result<Self, SolverError> {
        let binary = kind.binary_name();

        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Ok(output) = std::process::Command::new("which").arg(binary).output() {
            if output.status.success() {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !found.is_empty() {
                    candidates.push(PathBuf::from(found));
                }
            }
        }
        candidates.extend(COMMON_BIN_DIRS.iter().map(|dir| Path::new(dir).join(binary)));

        candidates
            .into_iter()
            .find(|path| path.exists())
            .map(|path| Self::new(kind, path))
            .ok_or_else(|| SolverError::NotFound(kind, PathBuf::from(binary)))
    }

    /// Auto-detect Z3 location (the default solver).
    pub fn auto_detect() -> Result<Self, SolverError> {
        Self::auto_detect_for(SolverKind::Z3)
    }

    /// Build the full argument list for this solver invocation.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.kind.args(self.timeout_ms);
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Validate that the configured solver binary exists.
    pub fn validate(&self) -> Result<(), SolverError> {
        if !self.solver_path.exists() {
            return Err(SolverError::NotFound(self.kind, self.solver_path.clone()));
        }
        Ok(())
    }
}
