//! SMT-LIB2 text formatting.
//!
//! Implements `Display` for [`Sort`], [`Term`], [`Command`], and [`Script`],
//! producing valid SMT-LIB2 output that can be parsed by solvers such as Z3.

use std::fmt;

use crate::command::Command;
use crate::script::Script;
use crate::sort::Sort;
use crate::term::Term;

// ---------------------------------------------------------------------------
// Sort
// ---------------------------------------------------------------------------

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::Int => write!(f, "Int"),
            Sort::Array(index, element) => write!(f, "(Array {index} {element})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

/// Write a binary SMT-LIB operator: `(op lhs rhs)`.
fn fmt_binop(op: &str, lhs: &Term, rhs: &Term, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({op} {lhs} {rhs})")
}

/// Write a unary SMT-LIB operator: `(op arg)`.
fn fmt_unop(op: &str, arg: &Term, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({op} {arg})")
}

/// Write a space-separated list of terms.
fn fmt_term_list(terms: &[Term], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, t) in terms.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{t}")?;
    }
    Ok(())
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::BoolLit(true) => write!(f, "true"),
            Term::BoolLit(false) => write!(f, "false"),
            Term::IntLit(n) => {
                if *n < 0 {
                    // SMT-LIB represents negative integers as `(- N)`
                    write!(f, "(- {})", n.unsigned_abs())
                } else {
                    write!(f, "{n}")
                }
            }
            Term::Const(name) => write!(f, "{name}"),

            Term::Not(inner) => fmt_unop("not", inner, f),
            Term::And(terms) => {
                if terms.is_empty() {
                    write!(f, "true")
                } else {
                    write!(f, "(and ")?;
                    fmt_term_list(terms, f)?;
                    write!(f, ")")
                }
            }
            Term::Or(terms) => {
                if terms.is_empty() {
                    write!(f, "false")
                } else {
                    write!(f, "(or ")?;
                    fmt_term_list(terms, f)?;
                    write!(f, ")")
                }
            }
            Term::Implies(a, b) => fmt_binop("=>", a, b, f),

            Term::Eq(a, b) => fmt_binop("=", a, b, f),
            Term::Ite(c, t, e) => write!(f, "(ite {c} {t} {e})"),

            Term::IntAdd(a, b) => fmt_binop("+", a, b, f),
            Term::IntSub(a, b) => fmt_binop("-", a, b, f),
            Term::IntMul(a, b) => fmt_binop("*", a, b, f),
            Term::IntDiv(a, b) => fmt_binop("div", a, b, f),
            Term::IntMod(a, b) => fmt_binop("mod", a, b, f),
            Term::IntNeg(a) => fmt_unop("-", a, f),
            Term::IntLt(a, b) => fmt_binop("<", a, b, f),
            Term::IntLe(a, b) => fmt_binop("<=", a, b, f),
            Term::IntGt(a, b) => fmt_binop(">", a, b, f),
            Term::IntGe(a, b) => fmt_binop(">=", a, b, f),

            Term::Select(arr, idx) => fmt_binop("select", arr, idx, f),
            Term::Store(arr, idx, val) => write!(f, "(store {arr} {idx} {val})"),

            Term::App(func, args) => {
                write!(f, "({func}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetLogic(logic) => write!(f, "(set-logic {logic})"),
            Command::SetOption(key, value) => write!(f, "(set-option :{key} {value})"),
            Command::DeclareConst(name, sort) => write!(f, "(declare-const {name} {sort})"),
            Command::DefineFun(name, params, ret, body) => {
                write!(f, "(define-fun {name} (")?;
                for (i, (pname, psort)) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "({pname} {psort})")?;
                }
                write!(f, ") {ret} {body})")
            }
            Command::Assert(term) => write!(f, "(assert {term})"),
            Command::CheckSat => write!(f, "(check-sat)"),
            Command::GetModel => write!(f, "(get-model)"),
            Command::Comment(text) => write!(f, ";; {text}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cmd in self.commands() {
            writeln!(f, "{cmd}")?;
        }
        Ok(())
    }
}
