//! # basalt-smtlib
//!
//! SMT-LIB2 abstract syntax for the basalt verifier.
//!
//! The verifier reduces every proof obligation to a validity query over
//! linear integer arithmetic, booleans, arrays, and user-defined predicates.
//! This crate models exactly that fragment: [`Sort`], [`Term`], [`Command`],
//! and [`Script`], plus `Display` implementations producing SMT-LIB2 text
//! any conforming solver (Z3, CVC5, Yices) can consume.

pub mod command;
pub mod formatter;
pub mod script;
pub mod sort;
pub mod term;

pub use command::Command;
pub use script::Script;
pub use sort::Sort;
pub use term::Term;
