//! The annotated intermediate representation.
//!
//! A front end lowers the surface language to this IR: each function is a
//! graph of blocks with a distinguished entry (precondition) and exit
//! (postcondition) cut-point, interior loop-head cut-points carrying
//! invariants and ranking functions, and plain pass-through blocks. The IR
//! is read-only during verification.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::IrError;
use crate::expr::{Expr, Type, Variable};

/// Block index within a function.
pub type BlockId = usize;

/// A whole verification unit: functions plus shared predicate definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
    /// User-defined predicates, registered with the oracle once per run.
    #[serde(default)]
    pub predicates: Vec<PredicateDef>,
}

/// A named, sorted, defined predicate usable in annotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredicateDef {
    pub name: String,
    pub params: Vec<Variable>,
    pub body: Expr,
}

/// A function to be verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    /// Formal parameters, in declaration order.
    pub params: Vec<Variable>,
    /// Return variables, in declaration order.
    #[serde(default)]
    pub returns: Vec<Variable>,
    /// Entry cut-point; must be a `Precondition` block.
    pub precondition: BlockId,
    /// Exit cut-point; must be a `Postcondition` block.
    pub postcondition: BlockId,
    /// All blocks, indexed by `BlockId`.
    pub blocks: Vec<Block>,
}

impl Function {
    /// The block with the given id, if in range.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    /// Ids of all loop-head blocks, in order.
    pub fn loop_heads(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| matches!(b.kind, BlockKind::LoopHead { .. }))
            .map(|(id, _)| id)
    }
}

/// One node of the control-flow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    #[serde(default)]
    pub statements: Vec<Statement>,
    #[serde(default)]
    pub successors: Vec<BlockId>,
}

/// Block kinds. The first three are cut-points; `Basic` is pass-through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockKind {
    /// Entry cut-point: preconditions plus the entry ranking tuple.
    Precondition {
        conditions: Vec<Expr>,
        #[serde(default)]
        ranking: Vec<Expr>,
    },
    /// Exit cut-point: postconditions. Carries no ranking functions.
    Postcondition { conditions: Vec<Expr> },
    /// Interior cut-point: loop invariants plus the loop ranking tuple.
    LoopHead {
        invariants: Vec<Expr>,
        #[serde(default)]
        ranking: Vec<Expr>,
    },
    /// Unannotated pass-through block.
    Basic,
}

impl BlockKind {
    /// Whether this block breaks basic paths.
    pub fn is_cut_point(&self) -> bool {
        !matches!(self, BlockKind::Basic)
    }

    /// The annotation conditions carried by a cut-point, if any.
    pub fn conditions(&self) -> Option<&[Expr]> {
        match self {
            BlockKind::Precondition { conditions, .. } => Some(conditions),
            BlockKind::Postcondition { conditions } => Some(conditions),
            BlockKind::LoopHead { invariants, .. } => Some(invariants),
            BlockKind::Basic => None,
        }
    }

    /// The ranking tuple carried by a cut-point (empty for postconditions
    /// and basic blocks).
    pub fn ranking(&self) -> &[Expr] {
        match self {
            BlockKind::Precondition { ranking, .. } => ranking,
            BlockKind::LoopHead { ranking, .. } => ranking,
            BlockKind::Postcondition { .. } | BlockKind::Basic => &[],
        }
    }
}

/// An IR statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    /// Blocking assumption: execution continues only if the condition holds.
    Assume(Expr),
    /// Checked assertion: generates a proof obligation at this point.
    Assert(Expr),
    /// `var := value`
    Assign { var: Variable, value: Expr },
    /// `array[index] := value`
    SubscriptAssign {
        array: Variable,
        index: Expr,
        value: Expr,
    },
    /// `destinations := callee(arguments)`. Arguments are variables, and
    /// the call is verified against the callee's contract.
    Call {
        destinations: Vec<Variable>,
        callee: String,
        arguments: Vec<Variable>,
    },
}

impl Program {
    /// Look up a function by name.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Fail-fast structural validation.
    ///
    /// Checks everything path enumeration and VC generation rely on:
    /// cut-point kinds, block-id ranges, statement shapes, call contracts
    /// resolving, annotation sorts, and that every CFG cycle passes through
    /// a cut-point.
    pub fn validate(&self) -> Result<(), IrError> {
        let mut fn_names = HashSet::new();
        for func in &self.functions {
            if !fn_names.insert(func.name.as_str()) {
                return Err(IrError::DuplicateFunction {
                    function: func.name.clone(),
                });
            }
        }

        let mut pred_names = HashSet::new();
        for pred in &self.predicates {
            if !pred_names.insert(pred.name.as_str()) {
                return Err(IrError::DuplicatePredicate {
                    predicate: pred.name.clone(),
                });
            }
            if pred.body.ty() != Type::Bool {
                return Err(IrError::PredicateBodyNotBool {
                    predicate: pred.name.clone(),
                });
            }
            let params: HashSet<&str> = pred.params.iter().map(|p| p.name.as_str()).collect();
            for v in pred.body.free_vars() {
                if !params.contains(v.name.as_str()) {
                    return Err(IrError::UnboundPredicateParam {
                        predicate: pred.name.clone(),
                        variable: v.name,
                    });
                }
            }
        }

        for func in &self.functions {
            self.validate_function(func)?;
        }
        Ok(())
    }

    fn validate_function(&self, func: &Function) -> Result<(), IrError> {
        let name = &func.name;

        let entry = func.block(func.precondition).ok_or(IrError::BlockOutOfRange {
            function: name.clone(),
            block: func.precondition,
        })?;
        if !matches!(entry.kind, BlockKind::Precondition { .. }) {
            return Err(IrError::WrongCutpointKind {
                function: name.clone(),
                block: func.precondition,
                expected: "precondition",
            });
        }

        let exit = func.block(func.postcondition).ok_or(IrError::BlockOutOfRange {
            function: name.clone(),
            block: func.postcondition,
        })?;
        if !matches!(exit.kind, BlockKind::Postcondition { .. }) {
            return Err(IrError::WrongCutpointKind {
                function: name.clone(),
                block: func.postcondition,
                expected: "postcondition",
            });
        }

        for (id, block) in func.blocks.iter().enumerate() {
            // Entry/exit kinds may only appear at their designated ids
            match block.kind {
                BlockKind::Precondition { .. } if id != func.precondition => {
                    return Err(IrError::MisplacedCutpoint {
                        function: name.clone(),
                        block: id,
                    });
                }
                BlockKind::Postcondition { .. } if id != func.postcondition => {
                    return Err(IrError::MisplacedCutpoint {
                        function: name.clone(),
                        block: id,
                    });
                }
                _ => {}
            }

            if let Some(conditions) = block.kind.conditions() {
                for c in conditions {
                    if c.ty() != Type::Bool {
                        return Err(IrError::NonBooleanCondition {
                            function: name.clone(),
                            block: id,
                        });
                    }
                }
            }
            for r in block.kind.ranking() {
                if r.ty() != Type::Int {
                    return Err(IrError::NonIntegerRanking {
                        function: name.clone(),
                        block: id,
                    });
                }
            }

            for &succ in &block.successors {
                if succ >= func.blocks.len() {
                    return Err(IrError::BlockOutOfRange {
                        function: name.clone(),
                        block: succ,
                    });
                }
            }

            for (stmt_idx, stmt) in block.statements.iter().enumerate() {
                self.validate_statement(func, id, stmt_idx, stmt)?;
            }
        }

        check_cycles_are_cut(func)
    }

    fn validate_statement(
        &self,
        func: &Function,
        block: BlockId,
        statement: usize,
        stmt: &Statement,
    ) -> Result<(), IrError> {
        let malformed = |detail: String| IrError::MalformedStatement {
            function: func.name.clone(),
            block,
            statement,
            detail,
        };

        match stmt {
            Statement::Assume(cond) | Statement::Assert(cond) => {
                if cond.ty() != Type::Bool {
                    return Err(malformed("condition is not boolean".to_string()));
                }
            }
            Statement::Assign { var, value } => {
                if var.ty != value.ty() {
                    return Err(malformed(format!(
                        "cannot assign {:?} value to {:?} variable {}",
                        value.ty(),
                        var.ty,
                        var.name
                    )));
                }
            }
            Statement::SubscriptAssign {
                array,
                index,
                value,
            } => {
                if array.ty != Type::IntArray {
                    return Err(malformed(format!("{} is not an array", array.name)));
                }
                if index.ty() != Type::Int || value.ty() != Type::Int {
                    return Err(malformed("array index and value must be integers".into()));
                }
            }
            Statement::Call {
                destinations,
                callee,
                arguments,
            } => {
                let target =
                    self.function(callee)
                        .ok_or_else(|| IrError::UnknownCallee {
                            function: func.name.clone(),
                            block,
                            statement,
                            callee: callee.clone(),
                        })?;
                if arguments.len() != target.params.len() {
                    return Err(IrError::CallArity {
                        function: func.name.clone(),
                        callee: callee.clone(),
                        role: "argument",
                        expected: target.params.len(),
                        found: arguments.len(),
                    });
                }
                if destinations.len() != target.returns.len() {
                    return Err(IrError::CallArity {
                        function: func.name.clone(),
                        callee: callee.clone(),
                        role: "destination",
                        expected: target.returns.len(),
                        found: destinations.len(),
                    });
                }
                for (arg, param) in arguments.iter().zip(&target.params) {
                    if arg.ty != param.ty {
                        return Err(malformed(format!(
                            "argument {} has type {:?}, parameter {} expects {:?}",
                            arg.name, arg.ty, param.name, param.ty
                        )));
                    }
                }
                for (dst, ret) in destinations.iter().zip(&target.returns) {
                    if dst.ty != ret.ty {
                        return Err(malformed(format!(
                            "destination {} has type {:?}, return {} has {:?}",
                            dst.name, dst.ty, ret.name, ret.ty
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Verify that the subgraph of pass-through blocks is acyclic.
///
/// Path enumeration stops only at cut-points, so a cycle that never passes
/// one would make the DFS diverge. Three-color DFS over `Basic` blocks.
fn check_cycles_are_cut(func: &Function) -> Result<(), IrError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let mut colors: HashMap<BlockId, Color> = HashMap::new();

    fn visit(
        func: &Function,
        id: BlockId,
        colors: &mut HashMap<BlockId, Color>,
    ) -> Result<(), IrError> {
        match colors.get(&id).copied().unwrap_or(Color::White) {
            Color::Gray => {
                return Err(IrError::UncutCycle {
                    function: func.name.clone(),
                    block: id,
                });
            }
            Color::Black => return Ok(()),
            Color::White => {}
        }
        colors.insert(id, Color::Gray);
        if let Some(block) = func.block(id) {
            for &succ in &block.successors {
                let succ_is_basic = func
                    .block(succ)
                    .map(|b| !b.kind.is_cut_point())
                    .unwrap_or(false);
                if succ_is_basic {
                    visit(func, succ, colors)?;
                }
            }
        }
        colors.insert(id, Color::Black);
        Ok(())
    }

    for (id, block) in func.blocks.iter().enumerate() {
        if !block.kind.is_cut_point() {
            visit(func, id, &mut colors)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Variable {
        Variable::int("x")
    }

    /// pre(true) -> basic { x := 1 } -> post(x = 1)
    fn straight_line() -> Program {
        Program {
            functions: vec![Function {
                name: "set_one".into(),
                params: vec![],
                returns: vec![x()],
                precondition: 0,
                postcondition: 2,
                blocks: vec![
                    Block {
                        kind: BlockKind::Precondition {
                            conditions: vec![Expr::BoolLit(true)],
                            ranking: vec![],
                        },
                        statements: vec![],
                        successors: vec![1],
                    },
                    Block {
                        kind: BlockKind::Basic,
                        statements: vec![Statement::Assign {
                            var: x(),
                            value: Expr::IntLit(1),
                        }],
                        successors: vec![2],
                    },
                    Block {
                        kind: BlockKind::Postcondition {
                            conditions: vec![Expr::eq(Expr::var(x()), Expr::IntLit(1))],
                        },
                        statements: vec![],
                        successors: vec![],
                    },
                ],
            }],
            predicates: vec![],
        }
    }

    #[test]
    fn straight_line_validates() {
        assert_eq!(straight_line().validate(), Ok(()));
    }

    #[test]
    fn entry_must_be_precondition() {
        let mut program = straight_line();
        program.functions[0].precondition = 1;
        assert!(matches!(
            program.validate(),
            Err(IrError::WrongCutpointKind { block: 1, .. })
        ));
    }

    #[test]
    fn successor_out_of_range_is_rejected() {
        let mut program = straight_line();
        program.functions[0].blocks[1].successors = vec![9];
        assert!(matches!(
            program.validate(),
            Err(IrError::BlockOutOfRange { block: 9, .. })
        ));
    }

    #[test]
    fn non_boolean_condition_is_rejected() {
        let mut program = straight_line();
        program.functions[0].blocks[2].kind = BlockKind::Postcondition {
            conditions: vec![Expr::IntLit(3)],
        };
        assert!(matches!(
            program.validate(),
            Err(IrError::NonBooleanCondition { block: 2, .. })
        ));
    }

    #[test]
    fn non_integer_ranking_is_rejected() {
        let mut program = straight_line();
        program.functions[0].blocks[0].kind = BlockKind::Precondition {
            conditions: vec![Expr::BoolLit(true)],
            ranking: vec![Expr::BoolLit(true)],
        };
        assert!(matches!(
            program.validate(),
            Err(IrError::NonIntegerRanking { block: 0, .. })
        ));
    }

    #[test]
    fn ill_typed_assignment_is_rejected() {
        let mut program = straight_line();
        program.functions[0].blocks[1].statements = vec![Statement::Assign {
            var: x(),
            value: Expr::BoolLit(true),
        }];
        assert!(matches!(
            program.validate(),
            Err(IrError::MalformedStatement { block: 1, .. })
        ));
    }

    #[test]
    fn unknown_callee_is_rejected() {
        let mut program = straight_line();
        program.functions[0].blocks[1].statements = vec![Statement::Call {
            destinations: vec![x()],
            callee: "missing".into(),
            arguments: vec![],
        }];
        assert!(matches!(
            program.validate(),
            Err(IrError::UnknownCallee { .. })
        ));
    }

    #[test]
    fn uncut_cycle_is_rejected() {
        let mut program = straight_line();
        // basic block 1 loops to itself without a loop head
        program.functions[0].blocks[1].successors = vec![1];
        assert!(matches!(
            program.validate(),
            Err(IrError::UncutCycle { block: 1, .. })
        ));
    }

    #[test]
    fn cycle_through_loop_head_is_accepted() {
        let mut program = straight_line();
        let f = &mut program.functions[0];
        // pre -> loop head -> body -> loop head; loop head -> post
        f.blocks = vec![
            Block {
                kind: BlockKind::Precondition {
                    conditions: vec![Expr::BoolLit(true)],
                    ranking: vec![],
                },
                statements: vec![],
                successors: vec![1],
            },
            Block {
                kind: BlockKind::LoopHead {
                    invariants: vec![Expr::BoolLit(true)],
                    ranking: vec![Expr::var(x())],
                },
                statements: vec![],
                successors: vec![2, 3],
            },
            Block {
                kind: BlockKind::Basic,
                statements: vec![Statement::Assign {
                    var: x(),
                    value: Expr::sub(Expr::var(x()), Expr::IntLit(1)),
                }],
                successors: vec![1],
            },
            Block {
                kind: BlockKind::Postcondition {
                    conditions: vec![Expr::BoolLit(true)],
                },
                statements: vec![],
                successors: vec![],
            },
        ];
        f.postcondition = 3;
        assert_eq!(program.validate(), Ok(()));
    }

    #[test]
    fn predicate_with_unbound_param_is_rejected() {
        let mut program = straight_line();
        program.predicates = vec![PredicateDef {
            name: "positive".into(),
            params: vec![Variable::int("v")],
            body: Expr::gt(Expr::var(Variable::int("w")), Expr::IntLit(0)),
        }];
        assert!(matches!(
            program.validate(),
            Err(IrError::UnboundPredicateParam { .. })
        ));
    }

    #[test]
    fn loop_heads_enumerates_in_order() {
        let mut program = straight_line();
        program.functions[0].blocks[1].kind = BlockKind::LoopHead {
            invariants: vec![Expr::BoolLit(true)],
            ranking: vec![],
        };
        let heads: Vec<BlockId> = program.functions[0].loop_heads().collect();
        assert_eq!(heads, vec![1]);
    }
}
