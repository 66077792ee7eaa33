//! The validity oracle.
//!
//! One `Oracle` wraps one solver backend for the duration of one
//! verification run. User predicates are lowered to `define-fun` commands
//! exactly once, at construction; every validity query replays that
//! preamble, declares the formula's free variables, and asks the solver
//! whether the negation is satisfiable.

use basalt_smtlib::{Command, Script, Sort};
use basalt_solver::{Model, SolverBackend, SolverResult};

use crate::encode::{collect_declarations, encode_expr, predicate_params};
use crate::error::OracleError;
use crate::expr::Expr;
use crate::ir::PredicateDef;

/// Outcome of a validity query.
#[derive(Debug, Clone, PartialEq)]
pub enum Validity {
    /// The negation is unsatisfiable: the formula holds.
    Valid,
    /// The negation has a witness: the formula fails, with the witness when
    /// the solver produced one.
    Invalid(Option<Model>),
    /// The solver could not decide.
    Unknown(String),
}

/// A validity oracle over one solver backend.
///
/// Holds the per-run preamble (logic, options, predicate definitions).
/// Concurrent runs need independent oracles; there is no shared state
/// beyond the borrowed backend.
pub struct Oracle<'a> {
    backend: &'a dyn SolverBackend,
    preamble: Vec<Command>,
}

impl<'a> Oracle<'a> {
    /// Create an oracle, registering every user predicate once.
    pub fn new(backend: &'a dyn SolverBackend, predicates: &[PredicateDef]) -> Self {
        let mut preamble = vec![
            Command::SetLogic("ALL".to_string()),
            Command::SetOption("produce-models".to_string(), "true".to_string()),
        ];
        for pred in predicates {
            preamble.push(Command::DefineFun(
                pred.name.clone(),
                predicate_params(&pred.params),
                Sort::Bool,
                encode_expr(&pred.body),
            ));
        }
        tracing::debug!(
            predicate_count = predicates.len(),
            "Oracle initialized with predicate definitions"
        );
        Self { backend, preamble }
    }

    /// Check whether `formula` is valid by refuting its negation.
    ///
    /// The script stops at the asserted negation; rendering it as a query
    /// closes it with `(check-sat)` and `(get-model)`.
    pub fn check_valid(&self, formula: &Expr) -> Result<Validity, OracleError> {
        let mut script: Script = self.preamble.iter().cloned().collect();
        script.extend(collect_declarations(formula));
        script.push(Command::Assert(encode_expr(formula).negated()));

        let verdict = match self.backend.check_sat(&script)? {
            SolverResult::Unsat => Validity::Valid,
            SolverResult::Sat(model) => Validity::Invalid(model),
            SolverResult::Unknown(reason) => Validity::Unknown(reason),
        };
        tracing::trace!(?verdict, "Validity query answered");
        Ok(verdict)
    }
}
