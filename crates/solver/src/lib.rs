//! # basalt-solver
//!
//! SMT solver interface for the basalt verifier.
//!
//! This crate provides a clean interface to SMT-LIB2 compatible solvers
//! (Z3, CVC5, Yices) by spawning them as external processes and piping
//! SMT-LIB2 text.
//!
//! ## Usage
//!
//! ```no_run
//! use basalt_solver::{CliSolver, SolverResult};
//!
//! let solver = CliSolver::with_default_config().unwrap();
//! let result = solver.check_sat_raw("
//!     (declare-const x Int)
//!     (assert (> x 0))
//!     (assert (< x 10))
//!     (check-sat)
//!     (get-model)
//! ").unwrap();
//!
//! match result {
//!     SolverResult::Sat(model) => println!("SAT: {model:?}"),
//!     SolverResult::Unsat => println!("UNSAT (proved)"),
//!     SolverResult::Unknown(reason) => println!("Unknown: {reason}"),
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod model;
mod parser;
pub mod result;
pub mod solver;

// Re-export primary types for ergonomic use
pub use backend::SolverBackend;
pub use config::{SolverConfig, SolverKind};
pub use error::SolverError;
pub use model::Model;
pub use result::SolverResult;
pub use solver::CliSolver;
