//! basalt-driver library: the end-to-end verification pipeline.
//!
//! [`apply`] takes a validated program and a solver backend, enumerates
//! basic paths, builds and discharges every verification condition, and
//! aggregates per-function results into a three-valued [`Verdict`].

pub mod output;

use std::fmt;

use serde::Serialize;

use basalt_solver::SolverBackend;
use basalt_verify::oracle::{Oracle, Validity};
use basalt_verify::path::enumerate_function_paths;
use basalt_verify::vcgen::generate_vcs;
use basalt_verify::{IrError, OracleError, Program};

use output::{FunctionResult, VerificationStatus};

/// The three-valued overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// Every verification condition is valid.
    Ok,
    /// At least one verification condition is refuted.
    Fail,
    /// No refutation, but the oracle answered "unknown" somewhere.
    Unknown,
}

impl Verdict {
    /// Integer convention: positive = all specifications hold, negative =
    /// some specification fails, zero = unknown.
    pub fn as_int(self) -> i32 {
        match self {
            Verdict::Ok => 1,
            Verdict::Fail => -1,
            Verdict::Unknown => 0,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ok => write!(f, "OK"),
            Verdict::Fail => write!(f, "FAIL"),
            Verdict::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Result of one whole verification run.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub verdict: Verdict,
    pub functions: Vec<FunctionResult>,
    /// Total number of verification conditions dispatched to the oracle.
    pub vcs_checked: usize,
}

/// Diagnostics switches. Path and VC dumps go to stderr; neither affects
/// the verdict.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub show_paths: bool,
    pub show_vcs: bool,
}

/// A fatal pipeline error: malformed IR or a failed oracle invocation.
///
/// Unprovable specifications are NOT errors; they surface in the
/// [`Outcome`].
#[derive(Debug)]
pub enum Error {
    Ir(IrError),
    Oracle(OracleError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Ir(e) => write!(f, "malformed IR: {e}"),
            Error::Oracle(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Ir(e) => Some(e),
            Error::Oracle(e) => Some(e),
        }
    }
}

impl From<IrError> for Error {
    fn from(e: IrError) -> Self {
        Error::Ir(e)
    }
}

impl From<OracleError> for Error {
    fn from(e: OracleError) -> Self {
        Error::Oracle(e)
    }
}

/// Verify a whole program.
///
/// Validates the IR (fatal on malformedness), registers user predicates
/// with the oracle once, then checks every verification condition of every
/// basic path of every function. A refuted condition makes the verdict
/// `Fail`; otherwise any `unknown` oracle answer makes it `Unknown`; a
/// fully proved run is `Ok`.
pub fn apply(
    program: &Program,
    backend: &dyn SolverBackend,
    options: &ApplyOptions,
) -> Result<Outcome, Error> {
    program.validate()?;

    let oracle = Oracle::new(backend, &program.predicates);

    let mut functions = Vec::new();
    let mut vcs_checked = 0;
    let mut any_failed = false;
    let mut any_unknown = false;

    for func in &program.functions {
        tracing::info!(function = %func.name, "Verifying");

        let paths = enumerate_function_paths(program, func)?;

        let mut vc_count = 0;
        let mut verified_count = 0;
        let mut messages: Vec<String> = Vec::new();
        let mut func_failed = false;
        let mut func_unknown = false;

        for path in &paths {
            if options.show_paths {
                eprint!("{path}");
            }

            for vc in generate_vcs(path)? {
                if options.show_vcs {
                    eprintln!("{vc}");
                }
                vc_count += 1;
                vcs_checked += 1;

                match oracle.check_valid(&vc.formula)? {
                    Validity::Valid => verified_count += 1,
                    Validity::Invalid(model) => {
                        any_failed = true;
                        func_failed = true;
                        let witness = model
                            .filter(|m| !m.is_empty())
                            .map(|m| format!(" [{}]", m.summary()))
                            .unwrap_or_default();
                        messages.push(format!("{}{witness}", vc.description));
                    }
                    Validity::Unknown(reason) => {
                        any_unknown = true;
                        func_unknown = true;
                        messages.push(format!("{} (unknown: {reason})", vc.description));
                    }
                }
            }
        }

        let status = if func_failed {
            VerificationStatus::Fail
        } else if func_unknown {
            VerificationStatus::Unknown
        } else {
            VerificationStatus::Ok
        };

        functions.push(FunctionResult {
            name: func.name.clone(),
            status,
            message: if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            },
            vc_count,
            verified_count,
        });
    }

    let verdict = if any_failed {
        Verdict::Fail
    } else if any_unknown {
        Verdict::Unknown
    } else {
        Verdict::Ok
    };

    tracing::info!(
        %verdict,
        vcs_checked,
        function_count = functions.len(),
        "Verification finished"
    );
    Ok(Outcome {
        verdict,
        functions,
        vcs_checked,
    })
}

impl Outcome {
    /// Machine-readable rendering of the whole run.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
