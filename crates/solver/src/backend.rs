//! Abstraction over SMT solver backends.
//!
//! The verification pipeline talks to the solver only through the
//! [`SolverBackend`] trait, which keeps it testable: integration tests can
//! substitute a canned backend, and alternative solvers plug in by
//! implementing one method.

use basalt_smtlib::script::Script;

use crate::error::SolverError;
use crate::result::SolverResult;
use crate::solver::CliSolver;

/// Trait abstracting over SMT solver backends.
pub trait SolverBackend {
    /// Check satisfiability of the given SMT script.
    ///
    /// Returns:
    /// - `Ok(SolverResult::Sat(model))` if satisfiable
    /// - `Ok(SolverResult::Unsat)` if unsatisfiable
    /// - `Ok(SolverResult::Unknown(reason))` if the solver couldn't determine
    /// - `Err(SolverError)` if the solver invocation itself failed
    fn check_sat(&self, script: &Script) -> Result<SolverResult, SolverError>;
}

impl SolverBackend for CliSolver {
    fn check_sat(&self, script: &Script) -> Result<SolverResult, SolverError> {
        CliSolver::check_sat(self, script)
    }
}
