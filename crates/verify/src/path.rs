//! Basic paths and their enumeration.
//!
//! A basic path is a maximal cut-free fragment of a function: it starts at a
//! cut-point (the precondition block or a loop head), and ends at the next
//! cut-point reached, at an assertion, or at a call site. Each path carries
//! defensive copies of the head/tail annotations and ranking tuples; the
//! statements in between are restricted by construction to assumptions and
//! assignments.

use std::collections::HashMap;
use std::fmt;

use crate::error::IrError;
use crate::expr::{Expr, Variable, big_and};
use crate::ir::{Block, BlockId, BlockKind, Function, Program, Statement};

/// A statement that may appear inside a basic path.
///
/// Assertions and calls never appear here: they end paths instead.
#[derive(Debug, Clone, PartialEq)]
pub enum PathStatement {
    Assume(Expr),
    Assign { var: Variable, value: Expr },
    SubscriptAssign {
        array: Variable,
        index: Expr,
        value: Expr,
    },
}

/// What ended a basic path.
#[derive(Debug, Clone, PartialEq)]
pub enum TailKind {
    /// The next cut-point (postcondition or loop head).
    CutPoint,
    /// An assertion inside a block.
    Assertion,
    /// A call site; the tail conditions are the callee's instantiated
    /// preconditions and the tail ranking is its instantiated entry measure.
    Call { callee: String },
}

/// One cut-free program fragment with its surrounding annotations.
#[derive(Debug, Clone)]
pub struct BasicPath {
    /// Owning function, for diagnostics.
    pub function: String,
    pub head: BlockId,
    pub tail: BlockId,
    pub tail_kind: TailKind,
    pub head_conditions: Vec<Expr>,
    pub tail_conditions: Vec<Expr>,
    pub head_ranking: Vec<Expr>,
    pub tail_ranking: Vec<Expr>,
    pub statements: Vec<PathStatement>,
}

/// Enumerate the basic paths of every function in the program.
pub fn enumerate_paths(program: &Program) -> Result<Vec<BasicPath>, IrError> {
    let mut paths = Vec::new();
    for func in &program.functions {
        paths.extend(enumerate_function_paths(program, func)?);
    }
    Ok(paths)
}

/// Enumerate the basic paths of one function.
///
/// One DFS starts at the precondition block and one at every loop head; no
/// DFS starts at the postcondition. Termination is guaranteed because
/// cut-points end a branch and every cycle in a validated CFG passes
/// through a loop head.
pub fn enumerate_function_paths(
    program: &Program,
    func: &Function,
) -> Result<Vec<BasicPath>, IrError> {
    let mut paths = Vec::new();

    let mut starts = vec![func.precondition];
    starts.extend(func.loop_heads());

    for head in starts {
        let head_block = lookup(func, head)?;
        let mut walker = Walker {
            program,
            func,
            head,
            head_conditions: head_block.kind.conditions().unwrap_or(&[]).to_vec(),
            head_ranking: head_block.kind.ranking().to_vec(),
            statements: Vec::new(),
            paths: &mut paths,
        };
        walker.walk(head, 0)?;
    }

    tracing::debug!(
        function = %func.name,
        path_count = paths.len(),
        "Enumerated basic paths"
    );
    Ok(paths)
}

fn lookup(func: &Function, id: BlockId) -> Result<&Block, IrError> {
    func.block(id).ok_or(IrError::BlockOutOfRange {
        function: func.name.clone(),
        block: id,
    })
}

struct Walker<'a> {
    program: &'a Program,
    func: &'a Function,
    head: BlockId,
    head_conditions: Vec<Expr>,
    head_ranking: Vec<Expr>,
    /// The single mutable working list; strict push/truncate discipline
    /// across the DFS so sibling successors share the same prefix.
    statements: Vec<PathStatement>,
    paths: &'a mut Vec<BasicPath>,
}

impl Walker<'_> {
    fn emit(
        &mut self,
        tail: BlockId,
        tail_kind: TailKind,
        tail_conditions: Vec<Expr>,
        tail_ranking: Vec<Expr>,
    ) {
        self.paths.push(BasicPath {
            function: self.func.name.clone(),
            head: self.head,
            tail,
            tail_kind,
            head_conditions: self.head_conditions.clone(),
            tail_conditions,
            head_ranking: self.head_ranking.clone(),
            tail_ranking,
            statements: self.statements.clone(),
        });
    }

    fn walk(&mut self, id: BlockId, step: usize) -> Result<(), IrError> {
        let block = lookup(self.func, id)?;

        // A cut-point reached after the start ends the path; paths never
        // continue through cut-points.
        if step > 0 && block.kind.is_cut_point() {
            match &block.kind {
                BlockKind::Postcondition { conditions } => {
                    self.emit(id, TailKind::CutPoint, conditions.clone(), Vec::new());
                }
                BlockKind::LoopHead { invariants, ranking } => {
                    self.emit(id, TailKind::CutPoint, invariants.clone(), ranking.clone());
                }
                BlockKind::Precondition { .. } => {
                    return Err(IrError::MisplacedCutpoint {
                        function: self.func.name.clone(),
                        block: id,
                    });
                }
                BlockKind::Basic => unreachable!("basic blocks are not cut-points"),
            }
            return Ok(());
        }

        let mark = self.statements.len();

        for (stmt_idx, stmt) in block.statements.iter().enumerate() {
            match stmt {
                Statement::Assume(cond) => {
                    self.statements.push(PathStatement::Assume(cond.clone()));
                }
                Statement::Assign { var, value } => {
                    self.statements.push(PathStatement::Assign {
                        var: var.clone(),
                        value: value.clone(),
                    });
                }
                Statement::SubscriptAssign {
                    array,
                    index,
                    value,
                } => {
                    self.statements.push(PathStatement::SubscriptAssign {
                        array: array.clone(),
                        index: index.clone(),
                        value: value.clone(),
                    });
                }
                Statement::Assert(pred) => {
                    // Assertions impose no termination obligation, hence the
                    // empty tail ranking. The asserted predicate is checked
                    // but NOT assumed for the rest of the block; asserts are
                    // pure checks here (switching to assume-after-assert
                    // would mean pushing `pred` onto the working list).
                    self.emit(id, TailKind::Assertion, vec![pred.clone()], Vec::new());
                }
                Statement::Call {
                    destinations,
                    callee,
                    arguments,
                } => {
                    self.handle_call(id, stmt_idx, destinations, callee, arguments)?;
                }
            }
        }

        for succ in &block.successors {
            self.walk(*succ, step + 1)?;
        }

        // Back-track: drop exactly what this block appended.
        self.statements.truncate(mark);
        Ok(())
    }

    /// A call ends a path with the callee's instantiated precondition (and
    /// entry measure, for the "call decreases the measure" obligation), then
    /// continues with the callee's instantiated postcondition assumed.
    fn handle_call(
        &mut self,
        block: BlockId,
        stmt_idx: usize,
        destinations: &[Variable],
        callee: &str,
        arguments: &[Variable],
    ) -> Result<(), IrError> {
        let target = self
            .program
            .function(callee)
            .ok_or_else(|| IrError::UnknownCallee {
                function: self.func.name.clone(),
                block,
                statement: stmt_idx,
                callee: callee.to_string(),
            })?;
        let entry = lookup(target, target.precondition)?;

        // formals ↦ actuals, one map for conditions and measure alike
        let mut params_to_args: HashMap<String, Expr> = HashMap::new();
        for (param, arg) in target.params.iter().zip(arguments) {
            params_to_args.insert(param.name.clone(), Expr::Var(arg.clone()));
        }

        let pre_conditions: Vec<Expr> = entry
            .kind
            .conditions()
            .unwrap_or(&[])
            .iter()
            .map(|c| c.subst_map(&params_to_args))
            .collect();
        let pre_ranking: Vec<Expr> = entry
            .kind
            .ranking()
            .iter()
            .map(|r| r.subst_map(&params_to_args))
            .collect();

        self.emit(
            block,
            TailKind::Call {
                callee: callee.to_string(),
            },
            pre_conditions,
            pre_ranking,
        );

        // Past the call, the callee's contract is all that is known:
        // assume its postconditions with formals ↦ actuals and
        // returns ↦ destinations.
        let exit = lookup(target, target.postcondition)?;
        let mut post_map = params_to_args;
        for (ret, dst) in target.returns.iter().zip(destinations) {
            post_map.insert(ret.name.clone(), Expr::Var(dst.clone()));
        }
        let post = big_and(
            exit.kind
                .conditions()
                .unwrap_or(&[])
                .iter()
                .map(|c| c.subst_map(&post_map)),
        );
        self.statements.push(PathStatement::Assume(post));
        Ok(())
    }
}

impl fmt::Display for PathStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStatement::Assume(cond) => write!(f, "assume {cond}"),
            PathStatement::Assign { var, value } => write!(f, "{} := {value}", var.name),
            PathStatement::SubscriptAssign {
                array,
                index,
                value,
            } => write!(f, "{}[{index}] := {value}", array.name),
        }
    }
}

impl fmt::Display for BasicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail = match &self.tail_kind {
            TailKind::CutPoint => format!("block {}", self.tail),
            TailKind::Assertion => format!("assertion in block {}", self.tail),
            TailKind::Call { callee } => format!("call to {callee} in block {}", self.tail),
        };
        writeln!(
            f,
            "basic path in {}: block {} -> {tail}",
            self.function, self.head
        )?;
        for c in &self.head_conditions {
            writeln!(f, "  @head {c}")?;
        }
        for r in &self.head_ranking {
            writeln!(f, "  @head rank {r}")?;
        }
        for s in &self.statements {
            writeln!(f, "  {s}")?;
        }
        for c in &self.tail_conditions {
            writeln!(f, "  @tail {c}")?;
        }
        for r in &self.tail_ranking {
            writeln!(f, "  @tail rank {r}")?;
        }
        Ok(())
    }
}
