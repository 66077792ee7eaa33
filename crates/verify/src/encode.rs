//! Lowering from the expression algebra to SMT-LIB terms.
//!
//! Integers map to `Int`, booleans to `Bool`, and arrays to
//! `(Array Int Int)` with a companion integer constant `<name>_len` holding
//! the array's length. `update(a, i, v, ℓ)` lowers to `(store a i v)`, and
//! `length` applied to an update lowers to the update's own length
//! expression. That rewrite is what makes `length(update(a, i, v, ℓ)) = ℓ`
//! hold inside the array theory, which only knows `select` and `store`.

use std::collections::BTreeMap;

use basalt_smtlib::{Command, Sort, Term};

use crate::expr::{Expr, Type, Variable};

/// Sort of a program type.
pub fn encode_type(ty: Type) -> Sort {
    match ty {
        Type::Int => Sort::Int,
        Type::Bool => Sort::Bool,
        Type::IntArray => Sort::int_array(),
    }
}

/// Name of the companion length constant for an array variable.
pub fn length_const(array: &str) -> String {
    format!("{array}_len")
}

/// Lower an expression to an SMT term.
pub fn encode_expr(expr: &Expr) -> Term {
    let go = |e: &Expr| Box::new(encode_expr(e));
    match expr {
        Expr::Var(v) => Term::Const(v.name.clone()),
        Expr::IntLit(n) => Term::IntLit(*n),
        Expr::BoolLit(b) => Term::BoolLit(*b),

        Expr::Neg(a) => Term::IntNeg(go(a)),
        Expr::Add(a, b) => Term::IntAdd(go(a), go(b)),
        Expr::Sub(a, b) => Term::IntSub(go(a), go(b)),
        Expr::Mul(a, b) => Term::IntMul(go(a), go(b)),
        Expr::Div(a, b) => Term::IntDiv(go(a), go(b)),
        Expr::Mod(a, b) => Term::IntMod(go(a), go(b)),

        Expr::Lt(a, b) => Term::IntLt(go(a), go(b)),
        Expr::Le(a, b) => Term::IntLe(go(a), go(b)),
        Expr::Gt(a, b) => Term::IntGt(go(a), go(b)),
        Expr::Ge(a, b) => Term::IntGe(go(a), go(b)),
        Expr::Eq(a, b) => Term::Eq(go(a), go(b)),
        Expr::Ne(a, b) => Term::Eq(go(a), go(b)).negated(),

        Expr::Not(a) => Term::Not(go(a)),
        Expr::And(es) => Term::And(es.iter().map(encode_expr).collect()),
        Expr::Or(es) => Term::Or(es.iter().map(encode_expr).collect()),
        Expr::Implies(a, b) => Term::Implies(go(a), go(b)),

        Expr::Select(a, i) => Term::Select(go(a), go(i)),
        Expr::Update {
            array,
            index,
            value,
            ..
        } => Term::Store(go(array), go(index), go(value)),
        Expr::Length(inner) => encode_length(inner),

        Expr::Pred(name, es) => Term::App(name.clone(), encode_pred_args(es)),
    }
}

/// Lower predicate arguments.
///
/// Array-typed arguments are passed as two terms, the array followed by its
/// length, matching the implicit length parameter in the predicate's
/// definition (see `predicate_params`).
fn encode_pred_args(args: &[Expr]) -> Vec<Term> {
    let mut terms = Vec::new();
    for arg in args {
        terms.push(encode_expr(arg));
        if arg.ty() == Type::IntArray {
            terms.push(encode_length(arg));
        }
    }
    terms
}

/// Sorted parameter list for a predicate definition.
///
/// Mirrors `encode_pred_args`: every array parameter is followed by an
/// implicit `<name>_len` integer parameter, which is also what `length`
/// of that parameter lowers to inside the body.
pub fn predicate_params(params: &[Variable]) -> Vec<(String, Sort)> {
    let mut sorted_params = Vec::new();
    for p in params {
        sorted_params.push((p.name.clone(), encode_type(p.ty)));
        if p.ty == Type::IntArray {
            sorted_params.push((length_const(&p.name), Sort::Int));
        }
    }
    sorted_params
}

/// Lower `length(inner)`.
///
/// Array-valued expressions are variables or updates; anything else under
/// `length` is ill-typed and rejected by IR validation.
fn encode_length(inner: &Expr) -> Term {
    match inner {
        Expr::Var(v) => Term::Const(length_const(&v.name)),
        Expr::Update { length, .. } => encode_expr(length),
        other => unreachable!("length applied to non-array expression: {other}"),
    }
}

/// Declarations for every free variable of a formula, in name order.
///
/// Array variables get two constants: the array itself and its length.
pub fn collect_declarations(formula: &Expr) -> Vec<Command> {
    let mut sorted: BTreeMap<String, Variable> = BTreeMap::new();
    for v in formula.free_vars() {
        sorted.insert(v.name.clone(), v);
    }

    let mut commands = Vec::new();
    for (name, var) in sorted {
        commands.push(Command::DeclareConst(name.clone(), encode_type(var.ty)));
        if var.ty == Type::IntArray {
            commands.push(Command::DeclareConst(length_const(&name), Sort::Int));
        }
    }
    commands
}
