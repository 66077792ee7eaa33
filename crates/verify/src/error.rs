use std::fmt;

use basalt_solver::SolverError;

use crate::ir::BlockId;

/// Malformed-IR diagnostics.
///
/// These are fatal: the IR comes from a front end that is expected to hand
/// over well-formed programs, so the verifier fails fast naming the
/// offending node instead of attempting partial verification.
#[derive(Debug, Clone, PartialEq)]
pub enum IrError {
    /// Two functions share a name.
    DuplicateFunction { function: String },
    /// Two predicate definitions share a name.
    DuplicatePredicate { predicate: String },
    /// A predicate body is not boolean.
    PredicateBodyNotBool { predicate: String },
    /// A predicate body mentions a variable that is not a parameter.
    UnboundPredicateParam { predicate: String, variable: String },
    /// A block id is out of range for its function.
    BlockOutOfRange { function: String, block: BlockId },
    /// The designated entry/exit block has the wrong kind.
    WrongCutpointKind {
        function: String,
        block: BlockId,
        expected: &'static str,
    },
    /// An interior block claims to be an entry or exit cut-point.
    MisplacedCutpoint { function: String, block: BlockId },
    /// An annotation condition is not boolean.
    NonBooleanCondition { function: String, block: BlockId },
    /// A ranking-function component is not integer-valued.
    NonIntegerRanking { function: String, block: BlockId },
    /// A statement is ill-formed (type mismatch, bad shape).
    MalformedStatement {
        function: String,
        block: BlockId,
        statement: usize,
        detail: String,
    },
    /// A call statement names a function that does not exist.
    UnknownCallee {
        function: String,
        block: BlockId,
        statement: usize,
        callee: String,
    },
    /// A call's argument or destination count does not match the callee.
    CallArity {
        function: String,
        callee: String,
        role: &'static str,
        expected: usize,
        found: usize,
    },
    /// A CFG cycle that passes through no cut-point; path enumeration would
    /// not terminate on it.
    UncutCycle { function: String, block: BlockId },
    /// Head and tail ranking tuples of one path differ in arity.
    RankingArity {
        function: String,
        head: BlockId,
        tail: BlockId,
        head_len: usize,
        tail_len: usize,
    },
}

impl fmt::Display for IrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrError::DuplicateFunction { function } => {
                write!(f, "duplicate function definition: {function}")
            }
            IrError::DuplicatePredicate { predicate } => {
                write!(f, "duplicate predicate definition: {predicate}")
            }
            IrError::PredicateBodyNotBool { predicate } => {
                write!(f, "predicate {predicate} has a non-boolean body")
            }
            IrError::UnboundPredicateParam {
                predicate,
                variable,
            } => write!(
                f,
                "predicate {predicate} mentions {variable}, which is not a parameter"
            ),
            IrError::BlockOutOfRange { function, block } => {
                write!(f, "{function}: block id {block} out of range")
            }
            IrError::WrongCutpointKind {
                function,
                block,
                expected,
            } => write!(f, "{function}: block {block} is not a {expected} block"),
            IrError::MisplacedCutpoint { function, block } => write!(
                f,
                "{function}: interior block {block} has an entry/exit annotation"
            ),
            IrError::NonBooleanCondition { function, block } => write!(
                f,
                "{function}: block {block} carries a non-boolean condition"
            ),
            IrError::NonIntegerRanking { function, block } => write!(
                f,
                "{function}: block {block} carries a non-integer ranking component"
            ),
            IrError::MalformedStatement {
                function,
                block,
                statement,
                detail,
            } => write!(
                f,
                "{function}: statement {statement} of block {block} is malformed: {detail}"
            ),
            IrError::UnknownCallee {
                function,
                block,
                statement,
                callee,
            } => write!(
                f,
                "{function}: statement {statement} of block {block} calls unknown function {callee}"
            ),
            IrError::CallArity {
                function,
                callee,
                role,
                expected,
                found,
            } => write!(
                f,
                "{function}: call to {callee} has {found} {role}(s), expected {expected}"
            ),
            IrError::UncutCycle { function, block } => write!(
                f,
                "{function}: cycle through block {block} passes no annotated cut-point"
            ),
            IrError::RankingArity {
                function,
                head,
                tail,
                head_len,
                tail_len,
            } => write!(
                f,
                "{function}: ranking tuple arity mismatch between blocks {head} ({head_len}) and {tail} ({tail_len})"
            ),
        }
    }
}

impl std::error::Error for IrError {}

/// Errors from the oracle layer: the SMT query itself went wrong
/// (as opposed to a specification being unprovable, which is an outcome).
#[derive(Debug)]
pub enum OracleError {
    /// The underlying solver invocation failed.
    Solver(SolverError),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::Solver(e) => write!(f, "oracle query failed: {e}"),
        }
    }
}

impl std::error::Error for OracleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OracleError::Solver(e) => Some(e),
        }
    }
}

impl From<SolverError> for OracleError {
    fn from(e: SolverError) -> Self {
        OracleError::Solver(e)
    }
}
