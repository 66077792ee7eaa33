/// SMT-LIB term (expression) representation.
///
/// Covers the quantifier-free fragment the verifier emits: booleans,
/// unbounded integers, arrays with `select`/`store`, and applications of
/// defined predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    // === Literals ===
    /// Boolean literal
    BoolLit(bool),
    /// Integer literal (unbounded)
    IntLit(i64),

    // === Variables ===
    /// Named constant/variable reference
    Const(String),

    // === Boolean operations ===
    /// Logical NOT
    Not(Box<Term>),
    /// Logical AND (n-ary)
    And(Vec<Term>),
    /// Logical OR (n-ary)
    Or(Vec<Term>),
    /// Logical implication: `(=> a b)`
    Implies(Box<Term>, Box<Term>),

    // === Core ===
    /// Equality: `(= a b)`
    Eq(Box<Term>, Box<Term>),
    /// If-then-else: `(ite cond then else)`
    Ite(Box<Term>, Box<Term>, Box<Term>),

    // === Integer arithmetic ===
    /// `(+ a b)`
    IntAdd(Box<Term>, Box<Term>),
    /// `(- a b)`
    IntSub(Box<Term>, Box<Term>),
    /// `(* a b)`
    IntMul(Box<Term>, Box<Term>),
    /// `(div a b)` — integer division
    IntDiv(Box<Term>, Box<Term>),
    /// `(mod a b)`
    IntMod(Box<Term>, Box<Term>),
    /// `(- a)` — integer negation
    IntNeg(Box<Term>),
    /// `(< a b)`
    IntLt(Box<Term>, Box<Term>),
    /// `(<= a b)`
    IntLe(Box<Term>, Box<Term>),
    /// `(> a b)`
    IntGt(Box<Term>, Box<Term>),
    /// `(>= a b)`
    IntGe(Box<Term>, Box<Term>),

    // === Array operations ===
    /// `(select array index)`
    Select(Box<Term>, Box<Term>),
    /// `(store array index value)`
    Store(Box<Term>, Box<Term>, Box<Term>),

    // === Function application ===
    /// `(f arg1 arg2 ...)` — applications of defined predicates
    App(String, Vec<Term>),
}

impl Term {
    /// Shorthand for a named constant.
    pub fn var(name: impl Into<String>) -> Self {
        Term::Const(name.into())
    }

    /// Negation of this term.
    pub fn negated(self) -> Self {
        Term::Not(Box::new(self))
    }
}
