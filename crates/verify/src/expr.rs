//! The logical expression algebra.
//!
//! Expressions appear in two roles: inside the IR (annotation conditions,
//! ranking functions, right-hand sides) and as verification conditions built
//! from them. The language is quantifier-free and three-sorted: integers,
//! booleans, and integer arrays. Typing, free-variable enumeration,
//! substitution, and printing all live here.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// The three sorts of the expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Int,
    Bool,
    /// Integer-indexed integer array with an explicit length.
    IntArray,
}

/// A typed program variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Integer variable shorthand.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, Type::Int)
    }

    /// Boolean variable shorthand.
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, Type::Bool)
    }

    /// Array variable shorthand.
    pub fn array(name: impl Into<String>) -> Self {
        Self::new(name, Type::IntArray)
    }
}

/// A quantifier-free logical term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Variable reference
    Var(Variable),
    /// Integer literal
    IntLit(i64),
    /// Boolean literal
    BoolLit(bool),

    // === Integer arithmetic ===
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Mod(Box<Expr>, Box<Expr>),

    // === Comparisons ===
    Lt(Box<Expr>, Box<Expr>),
    Le(Box<Expr>, Box<Expr>),
    Gt(Box<Expr>, Box<Expr>),
    Ge(Box<Expr>, Box<Expr>),
    /// Equality over any sort (both sides must share it)
    Eq(Box<Expr>, Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),

    // === Boolean connectives ===
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Implies(Box<Expr>, Box<Expr>),

    // === Arrays ===
    /// `select(array, index)` — the element at `index`
    Select(Box<Expr>, Box<Expr>),
    /// `update(array, index, value, length)` — functional array update.
    ///
    /// The update term carries the array's length expression so length
    /// invariance (`length(update(a, i, v, ℓ)) = ℓ`) survives lowering to
    /// the SMT array theory. The length is semantic content, not metadata.
    Update {
        array: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
        length: Box<Expr>,
    },
    /// `length(array)`
    Length(Box<Expr>),

    // === Predicates ===
    /// Application of a user-defined predicate
    Pred(String, Vec<Expr>),
}

impl Expr {
    /// Variable reference shorthand.
    pub fn var(v: Variable) -> Self {
        Expr::Var(v)
    }

    /// `a ⇒ b`
    pub fn implies(a: Expr, b: Expr) -> Self {
        Expr::Implies(Box::new(a), Box::new(b))
    }

    /// `a = b`
    pub fn eq(a: Expr, b: Expr) -> Self {
        Expr::Eq(Box::new(a), Box::new(b))
    }

    /// `a > b`
    pub fn gt(a: Expr, b: Expr) -> Self {
        Expr::Gt(Box::new(a), Box::new(b))
    }

    /// `a ≥ b`
    pub fn ge(a: Expr, b: Expr) -> Self {
        Expr::Ge(Box::new(a), Box::new(b))
    }

    /// `a − b`
    pub fn sub(a: Expr, b: Expr) -> Self {
        Expr::Sub(Box::new(a), Box::new(b))
    }

    /// The sort of this expression.
    ///
    /// Purely structural: operators determine their result sort, variables
    /// carry theirs. Operand sorts are checked separately by IR validation.
    pub fn ty(&self) -> Type {
        match self {
            Expr::Var(v) => v.ty,
            Expr::IntLit(_) => Type::Int,
            Expr::BoolLit(_) => Type::Bool,

            Expr::Neg(_)
            | Expr::Add(..)
            | Expr::Sub(..)
            | Expr::Mul(..)
            | Expr::Div(..)
            | Expr::Mod(..) => Type::Int,

            Expr::Lt(..)
            | Expr::Le(..)
            | Expr::Gt(..)
            | Expr::Ge(..)
            | Expr::Eq(..)
            | Expr::Ne(..)
            | Expr::Not(_)
            | Expr::And(_)
            | Expr::Or(_)
            | Expr::Implies(..) => Type::Bool,

            Expr::Select(..) => Type::Int,
            Expr::Update { .. } => Type::IntArray,
            Expr::Length(_) => Type::Int,

            Expr::Pred(..) => Type::Bool,
        }
    }

    /// All variables occurring in this expression.
    ///
    /// The language is quantifier-free, so every occurrence is free.
    pub fn free_vars(&self) -> HashSet<Variable> {
        let mut vars = HashSet::new();
        self.collect_vars(&mut vars);
        vars
    }

    fn collect_vars(&self, vars: &mut HashSet<Variable>) {
        match self {
            Expr::Var(v) => {
                vars.insert(v.clone());
            }
            Expr::IntLit(_) | Expr::BoolLit(_) => {}

            Expr::Neg(a) | Expr::Not(a) | Expr::Length(a) => a.collect_vars(vars),

            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Mod(a, b)
            | Expr::Lt(a, b)
            | Expr::Le(a, b)
            | Expr::Gt(a, b)
            | Expr::Ge(a, b)
            | Expr::Eq(a, b)
            | Expr::Ne(a, b)
            | Expr::Implies(a, b)
            | Expr::Select(a, b) => {
                a.collect_vars(vars);
                b.collect_vars(vars);
            }

            Expr::And(es) | Expr::Or(es) | Expr::Pred(_, es) => {
                for e in es {
                    e.collect_vars(vars);
                }
            }

            Expr::Update {
                array,
                index,
                value,
                length,
            } => {
                array.collect_vars(vars);
                index.collect_vars(vars);
                value.collect_vars(vars);
                length.collect_vars(vars);
            }
        }
    }

    /// Substitute `replacement` for every occurrence of the variable `name`.
    pub fn subst(&self, name: &str, replacement: &Expr) -> Expr {
        let mut map = HashMap::new();
        map.insert(name.to_string(), replacement.clone());
        self.subst_map(&map)
    }

    /// Simultaneous substitution through one map.
    ///
    /// Simultaneity matters: the ranking-function snapshot and the call
    /// contract instantiation rename whole tuples through a single map, so
    /// `{x ↦ y, y ↦ x}` swaps rather than chains.
    pub fn subst_map(&self, map: &HashMap<String, Expr>) -> Expr {
        let go = |e: &Expr| Box::new(e.subst_map(map));
        match self {
            Expr::Var(v) => match map.get(&v.name) {
                Some(e) => e.clone(),
                None => self.clone(),
            },
            Expr::IntLit(_) | Expr::BoolLit(_) => self.clone(),

            Expr::Neg(a) => Expr::Neg(go(a)),
            Expr::Add(a, b) => Expr::Add(go(a), go(b)),
            Expr::Sub(a, b) => Expr::Sub(go(a), go(b)),
            Expr::Mul(a, b) => Expr::Mul(go(a), go(b)),
            Expr::Div(a, b) => Expr::Div(go(a), go(b)),
            Expr::Mod(a, b) => Expr::Mod(go(a), go(b)),

            Expr::Lt(a, b) => Expr::Lt(go(a), go(b)),
            Expr::Le(a, b) => Expr::Le(go(a), go(b)),
            Expr::Gt(a, b) => Expr::Gt(go(a), go(b)),
            Expr::Ge(a, b) => Expr::Ge(go(a), go(b)),
            Expr::Eq(a, b) => Expr::Eq(go(a), go(b)),
            Expr::Ne(a, b) => Expr::Ne(go(a), go(b)),

            Expr::Not(a) => Expr::Not(go(a)),
            Expr::And(es) => Expr::And(es.iter().map(|e| e.subst_map(map)).collect()),
            Expr::Or(es) => Expr::Or(es.iter().map(|e| e.subst_map(map)).collect()),
            Expr::Implies(a, b) => Expr::Implies(go(a), go(b)),

            Expr::Select(a, i) => Expr::Select(go(a), go(i)),
            Expr::Update {
                array,
                index,
                value,
                length,
            } => Expr::Update {
                array: go(array),
                index: go(index),
                value: go(value),
                length: go(length),
            },
            Expr::Length(a) => Expr::Length(go(a)),

            Expr::Pred(name, es) => {
                Expr::Pred(name.clone(), es.iter().map(|e| e.subst_map(map)).collect())
            }
        }
    }
}

/// Conjunction folded over a `true` seed.
///
/// `big_and([]) = true` and `big_and([e]) = true ∧ e`, so the result is a
/// boolean expression even for empty condition lists; the solver simplifies.
pub fn big_and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
    let mut conjuncts = vec![Expr::BoolLit(true)];
    conjuncts.extend(exprs);
    Expr::And(conjuncts)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var(v) => write!(f, "{}", v.name),
            Expr::IntLit(n) => write!(f, "{n}"),
            Expr::BoolLit(b) => write!(f, "{b}"),

            Expr::Neg(a) => write!(f, "-{a}"),
            Expr::Add(a, b) => write!(f, "({a} + {b})"),
            Expr::Sub(a, b) => write!(f, "({a} - {b})"),
            Expr::Mul(a, b) => write!(f, "({a} * {b})"),
            Expr::Div(a, b) => write!(f, "({a} / {b})"),
            Expr::Mod(a, b) => write!(f, "({a} % {b})"),

            Expr::Lt(a, b) => write!(f, "({a} < {b})"),
            Expr::Le(a, b) => write!(f, "({a} <= {b})"),
            Expr::Gt(a, b) => write!(f, "({a} > {b})"),
            Expr::Ge(a, b) => write!(f, "({a} >= {b})"),
            Expr::Eq(a, b) => write!(f, "({a} = {b})"),
            Expr::Ne(a, b) => write!(f, "({a} != {b})"),

            Expr::Not(a) => write!(f, "!{a}"),
            Expr::And(es) => write_joined(f, es, " && "),
            Expr::Or(es) => write_joined(f, es, " || "),
            Expr::Implies(a, b) => write!(f, "({a} -> {b})"),

            Expr::Select(a, i) => write!(f, "{a}[{i}]"),
            Expr::Update {
                array,
                index,
                value,
                length,
            } => write!(f, "update({array}, {index}, {value}, {length})"),
            Expr::Length(a) => write!(f, "length({a})"),

            Expr::Pred(name, es) => {
                write!(f, "{name}(")?;
                for (i, e) in es.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, es: &[Expr], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, e) in es.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{e}")?;
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::var(Variable::int("x"))
    }

    fn y() -> Expr {
        Expr::var(Variable::int("y"))
    }

    #[test]
    fn types_of_operators() {
        assert_eq!(Expr::Add(Box::new(x()), Box::new(y())).ty(), Type::Int);
        assert_eq!(Expr::gt(x(), y()).ty(), Type::Bool);
        assert_eq!(Expr::var(Variable::array("a")).ty(), Type::IntArray);
        assert_eq!(
            Expr::Length(Box::new(Expr::var(Variable::array("a")))).ty(),
            Type::Int
        );
        assert_eq!(Expr::Pred("p".into(), vec![x()]).ty(), Type::Bool);
    }

    #[test]
    fn free_vars_collects_all_occurrences() {
        let e = Expr::implies(Expr::gt(x(), y()), Expr::eq(x(), Expr::IntLit(0)));
        let vars = e.free_vars();
        assert_eq!(vars.len(), 2);
        assert!(vars.contains(&Variable::int("x")));
        assert!(vars.contains(&Variable::int("y")));
    }

    #[test]
    fn free_vars_of_update_include_length() {
        let e = Expr::Update {
            array: Box::new(Expr::var(Variable::array("a"))),
            index: Box::new(x()),
            value: Box::new(y()),
            length: Box::new(Expr::var(Variable::int("n"))),
        };
        let vars = e.free_vars();
        assert!(vars.contains(&Variable::array("a")));
        assert!(vars.contains(&Variable::int("x")));
        assert!(vars.contains(&Variable::int("y")));
        assert!(vars.contains(&Variable::int("n")));
    }

    #[test]
    fn subst_replaces_variable() {
        let e = Expr::gt(x(), y());
        let subbed = e.subst("x", &Expr::IntLit(3));
        assert_eq!(subbed, Expr::gt(Expr::IntLit(3), y()));
    }

    #[test]
    fn subst_identity() {
        let e = Expr::implies(Expr::gt(x(), y()), Expr::eq(x(), Expr::IntLit(0)));
        assert_eq!(e.subst("x", &x()), e);
    }

    #[test]
    fn subst_free_var_bound() {
        // free(E[v ↦ t]) ⊆ (free(E) \ {v}) ∪ free(t)
        let e = Expr::gt(x(), y());
        let t = Expr::Add(Box::new(Expr::var(Variable::int("z"))), Box::new(Expr::IntLit(1)));
        let subbed = e.subst("x", &t);
        let vars = subbed.free_vars();
        assert!(!vars.contains(&Variable::int("x")));
        assert!(vars.contains(&Variable::int("y")));
        assert!(vars.contains(&Variable::int("z")));
    }

    #[test]
    fn subst_map_is_simultaneous() {
        // {x ↦ y, y ↦ x} must swap, not chain
        let e = Expr::sub(x(), y());
        let mut map = HashMap::new();
        map.insert("x".to_string(), y());
        map.insert("y".to_string(), x());
        let swapped = e.subst_map(&map);
        assert_eq!(swapped, Expr::sub(y(), x()));
    }

    #[test]
    fn big_and_empty_is_true_conjunct() {
        match big_and([]) {
            Expr::And(es) => assert_eq!(es, vec![Expr::BoolLit(true)]),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn big_and_singleton_keeps_true_seed() {
        match big_and([x()]) {
            Expr::And(es) => {
                assert_eq!(es.len(), 2);
                assert_eq!(es[0], Expr::BoolLit(true));
                assert_eq!(es[1], x());
            }
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn display_round_structure() {
        let e = Expr::implies(
            Expr::Ge(Box::new(x()), Box::new(Expr::IntLit(0))),
            Expr::eq(
                Expr::Select(
                    Box::new(Expr::var(Variable::array("a"))),
                    Box::new(Expr::IntLit(0)),
                ),
                Expr::IntLit(7),
            ),
        );
        assert_eq!(e.to_string(), "((x >= 0) -> (a[0] = 7))");
    }

    #[test]
    fn display_update_carries_length() {
        let a = Expr::var(Variable::array("a"));
        let e = Expr::Update {
            array: Box::new(a.clone()),
            index: Box::new(Expr::IntLit(0)),
            value: Box::new(Expr::IntLit(7)),
            length: Box::new(Expr::Length(Box::new(a))),
        };
        assert_eq!(e.to_string(), "update(a, 0, 7, length(a))");
    }
}
